//! Uninstall bookkeeping.
//!
//! Every file the shortcut builder writes and every removal script it
//! generates is reported to an [`UninstallRecorder`] as soon as it exists.
//! [`UninstallRecord`] is the bundled recorder: it keeps the entries in
//! memory, persists them as JSON, and replays them on uninstall.

use crate::error::{DesklinkError, Result};
use crate::shortcut::DeferredScript;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Receives uninstall information as it is produced.
pub trait UninstallRecorder {
    /// Record a written file.
    fn add_file(&mut self, path: &Path, removable: bool);

    /// Record a shell script to run on uninstall.
    fn add_uninstall_script(&mut self, content: &str);
}

impl<T: UninstallRecorder + ?Sized> UninstallRecorder for &mut T {
    fn add_file(&mut self, path: &Path, removable: bool) {
        (**self).add_file(path, removable);
    }

    fn add_uninstall_script(&mut self, content: &str) {
        (**self).add_uninstall_script(content);
    }
}

/// A file written during installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedFile {
    pub path: PathBuf,
    pub removable: bool,
}

/// In-memory uninstall record, serializable to JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UninstallRecord {
    /// Files in the order they were written.
    pub files: Vec<RecordedFile>,
    /// Uninstall scripts in the order they were registered.
    pub scripts: Vec<String>,
}

/// What an uninstall run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UninstallReport {
    pub removed: Vec<PathBuf>,
    /// Removable files that were already gone.
    pub missing: Vec<PathBuf>,
    pub scripts_run: usize,
    pub failures: Vec<String>,
}

impl UninstallRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files that should be deleted on uninstall.
    pub fn removable_files(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .filter(|f| f.removable)
            .map(|f| f.path.as_path())
    }

    /// Load a record from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| DesklinkError::io_action("read uninstall record", path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the record as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| DesklinkError::io_action("create directory", parent, e))?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .map_err(|e| DesklinkError::io_action("write uninstall record", path, e))?;
        debug!("Saved uninstall record to {:?}", path);
        Ok(())
    }

    /// Reverse the installation.
    ///
    /// Scripts run first, in registration order, since they may still need
    /// the files they refer to. Removable files are then deleted newest
    /// first. Failures are collected and the run continues.
    pub fn uninstall(&self, shell: &str, temp_dir: &Path) -> UninstallReport {
        let mut report = UninstallReport::default();

        for (index, content) in self.scripts.iter().enumerate() {
            let mut script = DeferredScript::new(format!("uninstall-{}", index));
            script.append(content);
            match script.run(shell, temp_dir) {
                Ok(()) => report.scripts_run += 1,
                Err(e) => {
                    warn!("Uninstall script {} failed: {}", index, e);
                    report.failures.push(e.to_string());
                }
            }
        }

        for path in self.removable_files().collect::<Vec<_>>().into_iter().rev() {
            if !path.exists() {
                report.missing.push(path.to_path_buf());
                continue;
            }
            match fs::remove_file(path) {
                Ok(()) => report.removed.push(path.to_path_buf()),
                Err(e) => {
                    warn!("Failed to remove {:?}: {}", path, e);
                    report
                        .failures
                        .push(DesklinkError::io_with_path(e, path).to_string());
                }
            }
        }

        info!(
            "Uninstall removed {} files, ran {} scripts, {} failures",
            report.removed.len(),
            report.scripts_run,
            report.failures.len()
        );
        report
    }
}

impl UninstallRecorder for UninstallRecord {
    fn add_file(&mut self, path: &Path, removable: bool) {
        self.files.push(RecordedFile {
            path: path.to_path_buf(),
            removable,
        });
    }

    fn add_uninstall_script(&mut self, content: &str) {
        self.scripts.push(content.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_roundtrip_through_json() {
        let temp_dir = TempDir::new().unwrap();
        let mut record = UninstallRecord::new();
        record.add_file(Path::new("/tmp/a.desktop"), true);
        record.add_file(Path::new("/tmp/keep.png"), false);
        record.add_uninstall_script("echo bye\n");

        let path = temp_dir.path().join("nested/record.json");
        record.save(&path).unwrap();

        assert_eq!(UninstallRecord::load(&path).unwrap(), record);
        assert_eq!(record.removable_files().count(), 1);
    }

    #[test]
    fn test_uninstall_runs_scripts_then_removes_files() {
        let temp_dir = TempDir::new().unwrap();
        let entry = temp_dir.path().join("MyApp-1.desktop");
        let kept = temp_dir.path().join("kept.png");
        let marker = temp_dir.path().join("script-saw-entry");
        fs::write(&entry, "[Desktop Entry]\n").unwrap();
        fs::write(&kept, "png").unwrap();

        let mut record = UninstallRecord::new();
        record.add_file(&entry, true);
        record.add_file(&kept, false);
        record.add_file(&temp_dir.path().join("gone.desktop"), true);
        record.add_uninstall_script(&format!(
            "test -f '{}' && touch '{}'\n",
            entry.display(),
            marker.display()
        ));

        let report = record.uninstall("sh", temp_dir.path());

        assert_eq!(report.scripts_run, 1);
        assert!(marker.exists());
        assert_eq!(report.removed, vec![entry.clone()]);
        assert_eq!(report.missing, vec![temp_dir.path().join("gone.desktop")]);
        assert!(report.failures.is_empty());
        assert!(!entry.exists());
        assert!(kept.exists());
    }

    #[test]
    fn test_failed_script_does_not_stop_file_removal() {
        let temp_dir = TempDir::new().unwrap();
        let entry = temp_dir.path().join("MyApp-2.desktop");
        fs::write(&entry, "x").unwrap();

        let mut record = UninstallRecord::new();
        record.add_uninstall_script("exit 1\n");
        record.add_file(&entry, true);

        let report = record.uninstall("sh", temp_dir.path());

        assert_eq!(report.scripts_run, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(!entry.exists());
    }
}
