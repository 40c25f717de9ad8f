//! Host environment snapshot.
//!
//! Everything the shortcut builder needs to know about the machine it runs
//! on is resolved once by [`HostEnvironment::detect`]. Front-ends and tests
//! override individual locations with the `with_*` methods.

use crate::config::{DesktopConfig, SystemPathsConfig};
use crate::error::{DesklinkError, Result};
use crate::platform::permissions;
use crate::shortcut::UserScope;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolved locations and capabilities of the invoking process.
#[derive(Debug, Clone)]
pub struct HostEnvironment {
    /// Invoker's home directory.
    home_dir: PathBuf,
    /// Invoker's desktop directory.
    desktop_dir: PathBuf,
    /// Root directory of the installation being performed.
    install_root: PathBuf,
    /// Optional override for where desktop-icon entries are written.
    shortcut_location: Option<PathBuf>,
    /// Display-locale language code used for localized keys.
    language: String,
    /// Whether the invoker may switch to other accounts.
    can_escalate: bool,
    system_applications_dir: PathBuf,
    system_icons_dir: PathBuf,
    temp_dir: PathBuf,
    passwd_file: PathBuf,
    shells_file: PathBuf,
}

impl HostEnvironment {
    /// Detect the environment of the current process.
    ///
    /// # Arguments
    ///
    /// * `install_root` - Installation directory; desktop-icon entries land
    ///   here unless a shortcut location override is configured.
    pub fn detect(install_root: impl AsRef<Path>) -> Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| DesklinkError::Config {
            message: "Could not determine home directory".to_string(),
        })?;
        let desktop_dir = dirs::desktop_dir()
            .unwrap_or_else(|| home_dir.join(DesktopConfig::DESKTOP_DIR_NAME));
        let language = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|value| language_from_locale(&value))
            .unwrap_or_else(|| DesktopConfig::DEFAULT_LANGUAGE.to_string());
        let shortcut_location = std::env::var_os(DesktopConfig::SHORTCUT_LOCATION_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let env = Self {
            home_dir,
            desktop_dir,
            install_root: install_root.as_ref().to_path_buf(),
            shortcut_location,
            language,
            can_escalate: nix::unistd::geteuid().is_root(),
            system_applications_dir: PathBuf::from(SystemPathsConfig::SYSTEM_APPLICATIONS_DIR),
            system_icons_dir: PathBuf::from(SystemPathsConfig::SYSTEM_ICONS_DIR),
            temp_dir: std::env::temp_dir(),
            passwd_file: PathBuf::from(SystemPathsConfig::PASSWD_FILE),
            shells_file: PathBuf::from(SystemPathsConfig::SHELLS_FILE),
        };
        debug!("Detected host environment: {:?}", env);
        Ok(env)
    }

    /// Build an environment rooted at an explicit home directory.
    ///
    /// Escalation starts disabled. System locations and the account files
    /// still point at the real `/usr/share` and `/etc` paths, so callers that
    /// enable [`with_escalation`](Self::with_escalation) outside a real
    /// install must also set [`with_system_dirs`](Self::with_system_dirs) and
    /// [`with_account_sources`](Self::with_account_sources).
    pub fn with_home(home_dir: impl AsRef<Path>, install_root: impl AsRef<Path>) -> Self {
        let home_dir = home_dir.as_ref().to_path_buf();
        Self {
            desktop_dir: home_dir.join(DesktopConfig::DESKTOP_DIR_NAME),
            home_dir,
            install_root: install_root.as_ref().to_path_buf(),
            shortcut_location: None,
            language: DesktopConfig::DEFAULT_LANGUAGE.to_string(),
            can_escalate: false,
            system_applications_dir: PathBuf::from(SystemPathsConfig::SYSTEM_APPLICATIONS_DIR),
            system_icons_dir: PathBuf::from(SystemPathsConfig::SYSTEM_ICONS_DIR),
            temp_dir: std::env::temp_dir(),
            passwd_file: PathBuf::from(SystemPathsConfig::PASSWD_FILE),
            shells_file: PathBuf::from(SystemPathsConfig::SHELLS_FILE),
        }
    }

    pub fn with_desktop_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.desktop_dir = dir.into();
        self
    }

    pub fn with_shortcut_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.shortcut_location = Some(location.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_escalation(mut self, can_escalate: bool) -> Self {
        self.can_escalate = can_escalate;
        self
    }

    pub fn with_system_dirs(
        mut self,
        applications: impl Into<PathBuf>,
        icons: impl Into<PathBuf>,
    ) -> Self {
        self.system_applications_dir = applications.into();
        self.system_icons_dir = icons.into();
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn with_account_sources(
        mut self,
        passwd: impl Into<PathBuf>,
        shells: impl Into<PathBuf>,
    ) -> Self {
        self.passwd_file = passwd.into();
        self.shells_file = shells.into();
        self
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn desktop_dir(&self) -> &Path {
        &self.desktop_dir
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn can_escalate(&self) -> bool {
        self.can_escalate
    }

    pub fn system_applications_dir(&self) -> &Path {
        &self.system_applications_dir
    }

    pub fn system_icons_dir(&self) -> &Path {
        &self.system_icons_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn passwd_file(&self) -> &Path {
        &self.passwd_file
    }

    pub fn shells_file(&self) -> &Path {
        &self.shells_file
    }

    /// `~/.local/share/applications` of the invoker.
    pub fn user_applications_dir(&self) -> PathBuf {
        self.home_dir.join(SystemPathsConfig::USER_APPLICATIONS_DIR)
    }

    /// `~/.local/share/pixmaps` of the invoker.
    pub fn user_icons_dir(&self) -> PathBuf {
        self.home_dir.join(SystemPathsConfig::USER_ICONS_DIR)
    }

    /// Folder holding menu entries for the given scope.
    pub fn programs_folder(&self, scope: UserScope) -> PathBuf {
        match scope {
            UserScope::AllUsers => self.system_applications_dir.clone(),
            UserScope::CurrentUser => self.user_applications_dir(),
        }
    }

    /// Resolve the configured shortcut location override.
    ///
    /// Returns `None` when no override is set. Absolute overrides must exist
    /// (or be creatable) and be writable. Relative overrides are resolved
    /// against the install root and created on demand.
    pub fn shortcut_location_override(&self) -> Option<Result<PathBuf>> {
        let location = self.shortcut_location.as_ref()?;

        let resolved = if location.is_absolute() {
            location.clone()
        } else {
            self.install_root.join(location)
        };

        if !resolved.exists() {
            if let Err(e) = fs::create_dir_all(&resolved) {
                return Some(Err(DesklinkError::io_action(
                    "create shortcut location",
                    &resolved,
                    e,
                )));
            }
        }

        if !resolved.is_dir() {
            return Some(Err(DesklinkError::NotADirectory(resolved)));
        }

        if location.is_absolute() && !permissions::is_writable_dir(&resolved) {
            return Some(Err(DesklinkError::Io {
                message: "shortcut location is not writable".to_string(),
                path: Some(resolved),
                source: None,
            }));
        }

        Some(Ok(resolved))
    }
}

/// Extract the language code from a POSIX locale string.
///
/// `de_DE.UTF-8` yields `de`; `C` and `POSIX` yield nothing.
pub fn language_from_locale(locale: &str) -> Option<String> {
    let lang = locale
        .split(['_', '.', '@'])
        .next()
        .unwrap_or_default()
        .trim();

    if lang.is_empty() || lang == "C" || lang == "POSIX" {
        return None;
    }

    Some(lang.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_language_from_locale() {
        assert_eq!(language_from_locale("de_DE.UTF-8").as_deref(), Some("de"));
        assert_eq!(language_from_locale("fr").as_deref(), Some("fr"));
        assert_eq!(language_from_locale("sr@latin").as_deref(), Some("sr"));
        assert_eq!(language_from_locale("C"), None);
        assert_eq!(language_from_locale("POSIX"), None);
        assert_eq!(language_from_locale(""), None);
    }

    #[test]
    fn test_user_dirs_under_home() {
        let env = HostEnvironment::with_home("/home/alice", "/opt/app");

        assert_eq!(
            env.user_applications_dir(),
            PathBuf::from("/home/alice/.local/share/applications")
        );
        assert_eq!(
            env.user_icons_dir(),
            PathBuf::from("/home/alice/.local/share/pixmaps")
        );
        assert_eq!(env.desktop_dir(), Path::new("/home/alice/Desktop"));
    }

    #[test]
    fn test_programs_folder_by_scope() {
        let env = HostEnvironment::with_home("/home/alice", "/opt/app")
            .with_system_dirs("/srv/apps", "/srv/icons");

        assert_eq!(env.programs_folder(UserScope::AllUsers), PathBuf::from("/srv/apps"));
        assert_eq!(
            env.programs_folder(UserScope::CurrentUser),
            env.user_applications_dir()
        );
    }

    #[test]
    fn test_with_home_never_escalates_by_default() {
        let env = HostEnvironment::with_home("/home/alice", "/opt/app");

        assert!(!env.can_escalate());
        assert_eq!(
            env.system_applications_dir(),
            Path::new(SystemPathsConfig::SYSTEM_APPLICATIONS_DIR)
        );

        let sandboxed = env
            .with_escalation(true)
            .with_system_dirs("/srv/apps", "/srv/icons")
            .with_account_sources("/srv/passwd", "/srv/shells");
        assert!(sandboxed.can_escalate());
        assert_eq!(sandboxed.system_icons_dir(), Path::new("/srv/icons"));
        assert_eq!(sandboxed.passwd_file(), Path::new("/srv/passwd"));
    }

    #[test]
    fn test_no_override_by_default() {
        let env = HostEnvironment::with_home("/home/alice", "/opt/app");
        assert!(env.shortcut_location_override().is_none());
    }

    #[test]
    fn test_relative_override_created_under_install_root() {
        let temp_dir = TempDir::new().unwrap();
        let env = HostEnvironment::with_home(temp_dir.path(), temp_dir.path())
            .with_shortcut_location("shortcuts");

        let resolved = env.shortcut_location_override().unwrap().unwrap();

        assert_eq!(resolved, temp_dir.path().join("shortcuts"));
        assert!(resolved.is_dir());
    }

    #[test]
    fn test_absolute_override_pointing_at_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        fs::write(&file, "x").unwrap();

        let env = HostEnvironment::with_home(temp_dir.path(), temp_dir.path())
            .with_shortcut_location(&file);

        assert!(env.shortcut_location_override().unwrap().is_err());
    }
}
