//! JSON install manifest.
//!
//! ```json
//! {
//!   "install_root": "/opt/myapp",
//!   "all_users": true,
//!   "shortcuts": [
//!     { "name": "MyApp", "target": "/opt/myapp/bin/myapp" },
//!     { "name": "MyApp", "target": "/opt/myapp/bin/myapp", "link_kind": "menu_entry" }
//!   ]
//! }
//! ```

use anyhow::{bail, Context, Result};
use desklink_core::{HostEnvironment, ShortcutConfig, UserScope};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Installation directory of the product.
    pub install_root: PathBuf,
    /// Where desktop-icon entries are written, relative to the install root
    /// unless absolute.
    #[serde(default)]
    pub shortcut_location: Option<PathBuf>,
    /// Overrides the language taken from the locale.
    #[serde(default)]
    pub language: Option<String>,
    /// Create every shortcut for all users.
    #[serde(default)]
    pub all_users: bool,
    /// Directory holding a custom `unix/xdg-desktop-icon-wrapper.sh`.
    #[serde(default)]
    pub resource_dir: Option<PathBuf>,
    #[serde(default)]
    pub shortcuts: Vec<ShortcutConfig>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let manifest: Manifest = serde_json::from_str(&content)
            .with_context(|| format!("Invalid manifest {}", path.display()))?;

        if manifest.shortcuts.is_empty() {
            bail!("Manifest {} lists no shortcuts", path.display());
        }
        Ok(manifest)
    }

    /// Shortcuts with the manifest-wide scope applied.
    pub fn shortcuts(&self) -> Vec<ShortcutConfig> {
        self.shortcuts
            .iter()
            .cloned()
            .map(|mut shortcut| {
                if self.all_users {
                    shortcut.user_scope = UserScope::AllUsers;
                }
                shortcut
            })
            .collect()
    }

    /// Apply the manifest overrides to a detected environment.
    pub fn configure(&self, mut env: HostEnvironment) -> HostEnvironment {
        if let Some(location) = &self.shortcut_location {
            env = env.with_shortcut_location(location);
        }
        if let Some(language) = &self.language {
            env = env.with_language(language);
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desklink_core::LinkKind;
    use tempfile::TempDir;

    fn write(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("manifest.json");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(
            &temp_dir,
            r#"{
                "install_root": "/opt/myapp",
                "all_users": true,
                "language": "de",
                "shortcuts": [
                    {"name": "MyApp", "target": "/opt/myapp/bin/run"},
                    {"name": "MyApp", "target": "/opt/myapp/bin/run", "link_kind": "menu_entry"}
                ]
            }"#,
        );

        let manifest = Manifest::load(&path).unwrap();
        let shortcuts = manifest.shortcuts();

        assert_eq!(manifest.install_root, PathBuf::from("/opt/myapp"));
        assert_eq!(shortcuts.len(), 2);
        assert!(shortcuts.iter().all(|s| s.user_scope == UserScope::AllUsers));
        assert_eq!(shortcuts[1].link_kind, LinkKind::MenuEntry);

        let env = manifest.configure(HostEnvironment::with_home("/home/alice", "/opt/myapp"));
        assert_eq!(env.language(), "de");
    }

    #[test]
    fn test_empty_manifest_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(&temp_dir, r#"{"install_root": "/opt/myapp"}"#);

        assert!(Manifest::load(&path).is_err());
    }

    #[test]
    fn test_missing_manifest() {
        let err = Manifest::load(Path::new("/nonexistent/manifest.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read manifest"));
    }
}
