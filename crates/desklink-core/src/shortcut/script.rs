//! Deferred shell scripts.
//!
//! Commands that must run later, or as another account, are collected into
//! a [`DeferredScript`] and executed in one go after the install phase.

use crate::config::ScriptConfig;
use crate::error::{DesklinkError, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// An append-only buffer of shell command lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeferredScript {
    /// Label used in logs and temp file names.
    name: String,
    content: String,
    /// Where the script was last persisted.
    path: Option<PathBuf>,
}

impl DeferredScript {
    /// Create an empty script.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: String::new(),
            path: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append raw text.
    pub fn append(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Append text followed by a newline.
    pub fn append_line(&mut self, line: &str) {
        self.content.push_str(line);
        self.content.push('\n');
    }

    /// Append one command line. Every part is quoted as a single shell word.
    pub fn append_command<S: AsRef<str>>(&mut self, parts: &[S]) {
        let line = shell_join(parts);
        self.append_line(&line);
    }

    /// Whether the script contains no commands.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// The full script content.
    pub fn render(&self) -> &str {
        &self.content
    }

    /// Where the script was last persisted, if it still is.
    pub fn persisted_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the script to `path`.
    pub fn persist(&mut self, path: &Path) -> Result<()> {
        fs::write(path, &self.content)
            .map_err(|e| DesklinkError::io_action("write deferred script", path, e))?;
        self.path = Some(path.to_path_buf());
        debug!("Persisted {} script to {:?}", self.name, path);
        Ok(())
    }

    /// Write the script to a fresh file in `temp_dir`.
    ///
    /// The name combines the script label and the current time with a random
    /// suffix, so scripts persisted within the same millisecond never clash.
    pub fn persist_temp(&mut self, temp_dir: &Path) -> Result<PathBuf> {
        let prefix = format!(
            "{}-{}-{}-",
            ScriptConfig::TEMP_PREFIX,
            self.name,
            Utc::now().timestamp_millis()
        );
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(ScriptConfig::SCRIPT_SUFFIX)
            .tempfile_in(temp_dir)
            .map_err(|e| DesklinkError::io_action("create script file", temp_dir, e))?;
        let path = file
            .into_temp_path()
            .keep()
            .map_err(|e| DesklinkError::io_action("keep script file", temp_dir, e.error))?;

        self.persist(&path)?;
        Ok(path)
    }

    /// Run the persisted script with `shell`.
    ///
    /// # Errors
    /// Fails if the script was never persisted, the shell cannot be started,
    /// or the script exits unsuccessfully.
    pub fn execute(&self, shell: &str) -> Result<()> {
        let path = self.path.as_ref().ok_or_else(|| DesklinkError::ScriptFailed {
            name: self.name.clone(),
            message: "script has not been persisted".to_string(),
        })?;

        info!("Executing {} script {:?}", self.name, path);
        let output = Command::new(shell)
            .arg(path)
            .output()
            .map_err(|e| DesklinkError::ScriptFailed {
                name: self.name.clone(),
                message: format!("failed to start {}: {}", shell, e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            debug!("{} stdout: {}", self.name, stdout.trim());
        }
        if !stderr.trim().is_empty() {
            debug!("{} stderr: {}", self.name, stderr.trim());
        }

        if !output.status.success() {
            return Err(DesklinkError::ScriptFailed {
                name: self.name.clone(),
                message: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        Ok(())
    }

    /// Remove the persisted script file.
    pub fn delete(&mut self) -> Result<()> {
        if let Some(path) = self.path.take() {
            if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| DesklinkError::io_action("remove deferred script", &path, e))?;
            }
        }
        Ok(())
    }

    /// Persist to a temp file, execute, and delete the file again.
    ///
    /// The file is removed even when execution fails.
    pub fn run(&mut self, shell: &str, temp_dir: &Path) -> Result<()> {
        self.persist_temp(temp_dir)?;
        let result = self.execute(shell);

        if let Err(e) = self.delete() {
            warn!("Failed to remove {} script: {}", self.name, e);
        }

        result
    }
}

/// Quote `arg` as one shell word.
///
/// Words made only of characters the shell never interprets are returned
/// unchanged. Anything else is wrapped in single quotes, with embedded `'`
/// written as `'\''`.
pub fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', "'\\''"))
}

/// Quote every part and join them into one command line.
pub fn shell_join<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| shell_quote(p.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_render() {
        let mut script = DeferredScript::new("test");
        assert!(script.is_empty());

        script.append("su bob -c ");
        script.append_line("\"true\"");
        script.append_command(&["chown", "bob", "/home/bob/Desktop/a.desktop"]);

        assert!(!script.is_empty());
        assert_eq!(
            script.render(),
            "su bob -c \"true\"\nchown bob /home/bob/Desktop/a.desktop\n"
        );
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/usr/bin/xdg-desktop-icon"), "/usr/bin/xdg-desktop-icon");
        assert_eq!(shell_quote("--novendor"), "--novendor");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("My App"), "'My App'");
        assert_eq!(shell_quote("Tom's"), "'Tom'\\''s'");
        assert_eq!(shell_quote("A\"$B"), "'A\"$B'");
        assert_eq!(
            shell_join(&["cp", "/tmp/a b", "x;y"]),
            "cp '/tmp/a b' 'x;y'"
        );
    }

    #[test]
    fn test_metacharacters_survive_execution() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("Tom's App");
        fs::write(&source, "entry").unwrap();

        let mut script = DeferredScript::new("quoting");
        let names = ["A\"$B", "x;touch injected", "$(touch injected)", "back`tick`"];
        for name in names {
            let dest = temp_dir.path().join(name).display().to_string();
            let source_arg = source.display().to_string();
            script.append_command(&["cp", source_arg.as_str(), dest.as_str()]);
        }
        // Nested the way account commands are: `sh -c '<quoted command>'`.
        let nested_dest = temp_dir.path().join("Tom's nested").display().to_string();
        let source_arg = source.display().to_string();
        let payload = shell_join(&["cp", source_arg.as_str(), nested_dest.as_str()]);
        script.append_command(&["sh", "-c", payload.as_str()]);

        script.run("sh", temp_dir.path()).unwrap();

        for name in names {
            assert_eq!(fs::read_to_string(temp_dir.path().join(name)).unwrap(), "entry");
        }
        assert!(temp_dir.path().join("Tom's nested").exists());
        assert!(!temp_dir.path().join("injected").exists());
    }

    #[test]
    fn test_persist_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let mut script = DeferredScript::new("test");
        script.append_line("echo hello");

        let path = script.persist_temp(temp_dir.path()).unwrap();
        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "echo hello\n");
        assert_eq!(script.persisted_path(), Some(path.as_path()));

        script.delete().unwrap();
        assert!(!path.exists());
        assert!(script.persisted_path().is_none());
    }

    #[test]
    fn test_temp_names_are_unique() {
        let temp_dir = TempDir::new().unwrap();
        let mut first = DeferredScript::new("same");
        let mut second = DeferredScript::new("same");

        let a = first.persist_temp(temp_dir.path()).unwrap();
        let b = second.persist_temp(temp_dir.path()).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_run_executes_and_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join("marker");

        let mut script = DeferredScript::new("touch");
        let marker_arg = marker.display().to_string();
        script.append_command(&["touch", marker_arg.as_str()]);
        script.run("sh", temp_dir.path()).unwrap();

        assert!(marker.exists());
        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map(|x| x == "sh").unwrap_or(false))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_run_reports_failure() {
        let temp_dir = TempDir::new().unwrap();
        let mut script = DeferredScript::new("failing");
        script.append_line("exit 3");

        let err = script.run("sh", temp_dir.path()).unwrap_err();
        assert!(matches!(err, DesklinkError::ScriptFailed { ref name, .. } if name == "failing"));
        assert!(script.persisted_path().is_none());
    }

    #[test]
    fn test_execute_without_persist_fails() {
        let script = DeferredScript::new("unpersisted");
        assert!(script.execute("sh").is_err());
    }
}
