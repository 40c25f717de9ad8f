//! Named text resources.
//!
//! The desktop-icon wrapper script is loaded by logical path, so installers
//! can ship their own variant next to their other resources.

use crate::config::ScriptConfig;
use crate::error::{DesklinkError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Supplies text resources by logical path.
pub trait ResourceProvider {
    /// Load the resource at `path`.
    ///
    /// # Errors
    /// Returns [`DesklinkError::ResourceNotFound`] when no such resource
    /// exists.
    fn get_string(&self, path: &str) -> Result<String>;
}

const XDG_DESKTOP_ICON_WRAPPER: &str = include_str!("../resources/unix/xdg-desktop-icon-wrapper.sh");

/// Resources compiled into the library.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedResources;

impl ResourceProvider for EmbeddedResources {
    fn get_string(&self, path: &str) -> Result<String> {
        match path {
            ScriptConfig::WRAPPER_RESOURCE_PATH => Ok(XDG_DESKTOP_ICON_WRAPPER.to_string()),
            _ => Err(DesklinkError::ResourceNotFound {
                path: path.to_string(),
            }),
        }
    }
}

/// Resources read from files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ResourceProvider for DirectoryResources {
    fn get_string(&self, path: &str) -> Result<String> {
        let file = self.root.join(path.trim_start_matches('/'));
        fs::read_to_string(&file).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DesklinkError::ResourceNotFound {
                path: path.to_string(),
            },
            _ => DesklinkError::io_action("read resource", &file, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_wrapper_template() {
        let content = EmbeddedResources
            .get_string(ScriptConfig::WRAPPER_RESOURCE_PATH)
            .unwrap();

        assert!(content.starts_with("#!/bin/sh"));
        assert!(content.contains("@XDG_DESKTOP_ICON@"));
        assert!(content.contains("@LANG@"));
    }

    #[test]
    fn test_embedded_unknown_resource() {
        let err = EmbeddedResources.get_string("unix/missing.sh").unwrap_err();
        assert!(matches!(err, DesklinkError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_directory_resources() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("unix")).unwrap();
        fs::write(temp_dir.path().join("unix/custom.sh"), "echo custom").unwrap();

        let resources = DirectoryResources::new(temp_dir.path());

        assert_eq!(resources.get_string("/unix/custom.sh").unwrap(), "echo custom");
        assert!(matches!(
            resources.get_string("unix/missing.sh"),
            Err(DesklinkError::ResourceNotFound { .. })
        ));
    }
}
