//! Centralized configuration for Desklink.
//!
//! This module provides the fixed names, paths and file modes used when
//! writing desktop entries and deferred scripts.

/// Desktop entry naming and template configuration.
pub struct DesktopConfig;

impl DesktopConfig {
    pub const ENTRY_EXTENSION: &'static str = ".desktop";
    pub const DESKTOP_DIR_NAME: &'static str = "Desktop";
    pub const DEFAULT_PROGRAM_GROUP: &'static str = "(Default)";
    pub const DEFAULT_ENTRY_TYPE: &'static str = "Application";
    pub const DEFAULT_ENCODING: &'static str = "UTF-8";
    pub const DEFAULT_LANGUAGE: &'static str = "en";
    /// Environment variable naming an override for desktop-icon entry files.
    pub const SHORTCUT_LOCATION_VAR: &'static str = "DESKLINK_SHORTCUT_PATH";
    pub const GENERATOR_NAME: &'static str = "desklink";
}

/// Shared and per-user locations on a freedesktop system.
pub struct SystemPathsConfig;

impl SystemPathsConfig {
    pub const SYSTEM_APPLICATIONS_DIR: &'static str = "/usr/share/applications";
    pub const SYSTEM_ICONS_DIR: &'static str = "/usr/share/pixmaps";
    pub const PASSWD_FILE: &'static str = "/etc/passwd";
    pub const SHELLS_FILE: &'static str = "/etc/shells";
    /// Relative to the invoker's home.
    pub const USER_APPLICATIONS_DIR: &'static str = ".local/share/applications";
    /// Relative to the invoker's home.
    pub const USER_ICONS_DIR: &'static str = ".local/share/pixmaps";
}

/// Deferred script and helper wrapper configuration.
pub struct ScriptConfig;

impl ScriptConfig {
    pub const SCRIPT_SUFFIX: &'static str = ".sh";
    pub const TEMP_PREFIX: &'static str = "desklink";
    pub const WRAPPER_RESOURCE_PATH: &'static str = "unix/xdg-desktop-icon-wrapper.sh";
    pub const WRAPPER_FILE_NAME: &'static str = "LocaleEnabledXdgDesktopIconScript.sh";
    pub const XDG_DESKTOP_ICON: &'static str = "xdg-desktop-icon";
    pub const EXECUTABLE_MODE: u32 = 0o755;
    /// Mode of the intermediate copy handed to other accounts.
    pub const SHARED_TEMP_MODE: u32 = 0o644;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_extension_is_desktop() {
        assert!(DesktopConfig::ENTRY_EXTENSION.starts_with('.'));
        assert!(DesktopConfig::ENTRY_EXTENSION.ends_with("desktop"));
    }

    #[test]
    fn test_user_dirs_are_relative() {
        assert!(!SystemPathsConfig::USER_APPLICATIONS_DIR.starts_with('/'));
        assert!(!SystemPathsConfig::USER_ICONS_DIR.starts_with('/'));
    }
}
