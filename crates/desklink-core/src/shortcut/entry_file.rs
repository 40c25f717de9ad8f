//! Writing rendered entries under collision-free file names.
//!
//! File names follow `<name>-<epoch millis>.desktop`. When a file with that
//! exact name already exists the timestamp is taken again until the name is
//! free.

use crate::config::DesktopConfig;
use crate::error::{DesklinkError, Result};
use crate::platform::permissions;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// How the shortcut name is turned into a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    /// Each whitespace run becomes a single `-`.
    DashForWhitespace,
    /// Whitespace is kept as is.
    Verbatim,
}

/// Turn a shortcut name into a file name stem.
///
/// Path separators are always replaced, since they cannot be part of a file
/// name.
pub fn sanitize_name(name: &str, style: NameStyle) -> String {
    let name = name.trim().replace('/', "-");
    match style {
        NameStyle::DashForWhitespace => name.split_whitespace().collect::<Vec<_>>().join("-"),
        NameStyle::Verbatim => name,
    }
}

/// `<stem>-<millis>.desktop`.
pub fn entry_file_name(stem: &str, millis: i64) -> String {
    format!("{}-{}{}", stem, millis, DesktopConfig::ENTRY_EXTENSION)
}

/// Write `content` into a new, uniquely named entry file in `dir`.
///
/// The file is created exclusively, so a name taken between the check and
/// the write is retried as well. The written file is made executable, which
/// desktop shells require before they trust a launcher.
pub fn write_unique_entry(
    dir: &Path,
    name: &str,
    style: NameStyle,
    content: &str,
) -> Result<PathBuf> {
    let stem = sanitize_name(name, style);

    let (path, mut file) = loop {
        let candidate = dir.join(entry_file_name(&stem, Utc::now().timestamp_millis()));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => break (candidate, file),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("Entry name {:?} taken, retrying", candidate);
            }
            Err(e) => return Err(DesklinkError::io_action("create desktop file", candidate, e)),
        }
    };

    let written = file
        .write_all(content.as_bytes())
        .map_err(|e| DesklinkError::io_action("write desktop file", &path, e));
    drop(file);
    discard_on_error(&path, written.and_then(|()| permissions::set_executable(&path)))?;

    debug!("Wrote desktop entry to {:?}", path);
    Ok(path)
}

/// Copy an existing entry file to a new, uniquely named file in `dir`.
pub fn copy_to_unique(source: &Path, dir: &Path, name: &str, style: NameStyle) -> Result<PathBuf> {
    let content = fs::read_to_string(source)
        .map_err(|e| DesklinkError::io_action("read desktop file", source, e))?;
    write_unique_entry(dir, name, style, &content)
}

/// Remove the half-written file at `path` if `result` is an error.
fn discard_on_error<T>(path: &Path, result: Result<T>) -> Result<T> {
    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            debug!("Failed to remove partial entry {:?}: {}", path, e);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(
            sanitize_name("My  Cool App", NameStyle::DashForWhitespace),
            "My-Cool-App"
        );
        assert_eq!(sanitize_name("My Cool App", NameStyle::Verbatim), "My Cool App");
        assert_eq!(sanitize_name(" a/b ", NameStyle::Verbatim), "a-b");
    }

    #[test]
    fn test_entry_file_name() {
        assert_eq!(entry_file_name("MyApp", 1700000000123), "MyApp-1700000000123.desktop");
    }

    #[test]
    fn test_write_unique_entry() {
        let temp_dir = TempDir::new().unwrap();

        let path = write_unique_entry(
            temp_dir.path(),
            "My App",
            NameStyle::DashForWhitespace,
            "[Desktop Entry]\n",
        )
        .unwrap();

        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("My-App-"));
        assert!(file_name.ends_with(".desktop"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "[Desktop Entry]\n");
        assert!(permissions::is_executable(&path));
    }

    #[test]
    fn test_write_unique_entry_skips_taken_names() {
        let temp_dir = TempDir::new().unwrap();
        let now = Utc::now().timestamp_millis();

        // Occupy the names for the next few milliseconds.
        let taken: Vec<PathBuf> = (0..30)
            .map(|offset| {
                let path = temp_dir.path().join(entry_file_name("MyApp", now + offset));
                fs::write(&path, "taken").unwrap();
                path
            })
            .collect();

        let path =
            write_unique_entry(temp_dir.path(), "MyApp", NameStyle::Verbatim, "fresh").unwrap();

        assert!(!taken.contains(&path));
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh");
        for path in &taken {
            assert_eq!(fs::read_to_string(path).unwrap(), "taken");
        }
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = write_unique_entry(
            &temp_dir.path().join("missing"),
            "MyApp",
            NameStyle::Verbatim,
            "x",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_failed_write_removes_partial_entry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("MyApp-1.desktop");
        fs::write(&path, "").unwrap();

        let result: Result<()> = discard_on_error(
            &path,
            Err(DesklinkError::Other("disk full".to_string())),
        );

        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_successful_write_keeps_entry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("MyApp-1.desktop");
        fs::write(&path, "[Desktop Entry]\n").unwrap();

        discard_on_error(&path, Ok(())).unwrap();

        assert!(path.exists());
    }
}
