//! External command resolution.
//!
//! Commands written into deferred scripts are looked up once per session
//! through a [`CommandLocator`]. A command that cannot be found is written by
//! bare name and left to the shell's own `PATH` search, except for the
//! optional `xdg-desktop-icon` helper whose absence selects the direct copy
//! strategy.

use crate::config::ScriptConfig;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Resolves a command name to an executable path.
pub trait CommandLocator {
    /// Return the absolute path of `name`, or `None` if it is not installed.
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// Looks commands up in the process `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathLocator;

impl CommandLocator for PathLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

/// A fixed name-to-path table.
///
/// Useful when the front-end already knows where its tools live.
#[derive(Debug, Default, Clone)]
pub struct FixedLocator {
    commands: HashMap<String, PathBuf>,
}

impl FixedLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command path.
    pub fn with(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.commands.insert(name.into(), path.into());
        self
    }
}

impl CommandLocator for FixedLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        self.commands.get(name).cloned()
    }
}

/// Commands used by the shortcut builder, resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSet {
    pub su: String,
    pub chown: String,
    pub cp: String,
    pub rm: String,
    pub shell: String,
    /// `xdg-desktop-icon`, if installed.
    pub xdg_desktop_icon: Option<PathBuf>,
}

impl CommandSet {
    /// Resolve every command through `locator`.
    pub fn resolve(locator: &dyn CommandLocator) -> Self {
        let lookup = |name: &str| {
            locator
                .locate(name)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| name.to_string())
        };

        let commands = Self {
            su: lookup("su"),
            chown: lookup("chown"),
            cp: lookup("cp"),
            rm: lookup("rm"),
            shell: lookup("sh"),
            xdg_desktop_icon: locator.locate(ScriptConfig::XDG_DESKTOP_ICON),
        };
        debug!("Resolved commands: {:?}", commands);
        commands
    }

    /// Whether the desktop-icon helper is available.
    pub fn has_desktop_icon_helper(&self) -> bool {
        self.xdg_desktop_icon.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_commands_fall_back_to_bare_names() {
        let commands = CommandSet::resolve(&FixedLocator::new());

        assert_eq!(commands.su, "su");
        assert_eq!(commands.chown, "chown");
        assert_eq!(commands.cp, "cp");
        assert_eq!(commands.rm, "rm");
        assert_eq!(commands.shell, "sh");
        assert!(!commands.has_desktop_icon_helper());
    }

    #[test]
    fn test_fixed_locator_paths_are_used() {
        let locator = FixedLocator::new()
            .with("su", "/bin/su")
            .with("xdg-desktop-icon", "/usr/bin/xdg-desktop-icon");

        let commands = CommandSet::resolve(&locator);

        assert_eq!(commands.su, "/bin/su");
        assert_eq!(
            commands.xdg_desktop_icon,
            Some(PathBuf::from("/usr/bin/xdg-desktop-icon"))
        );
    }

    #[test]
    fn test_path_locator_finds_shell() {
        // Every Unix test host has a POSIX shell on PATH.
        assert!(PathLocator.locate("sh").is_some());
        assert!(PathLocator
            .locate("definitely-not-a-real-command-desklink")
            .is_none());
    }
}
