//! Local account enumeration.
//!
//! Reads the passwd and shells databases to find the accounts a shortcut can
//! be propagated to.

use crate::config::DesktopConfig;
use crate::error::{DesklinkError, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A local account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    /// Login name.
    pub name: String,
    /// Numeric user id.
    pub uid: u32,
    /// Home directory.
    pub home: PathBuf,
    /// Login shell.
    pub shell: String,
    /// Whether the shell is listed as a valid login shell.
    pub valid_shell: bool,
    /// Whether `<home>/Desktop` exists.
    pub has_desktop: bool,
}

impl UserAccount {
    /// The account's desktop directory.
    pub fn desktop_dir(&self) -> PathBuf {
        self.home.join(DesktopConfig::DESKTOP_DIR_NAME)
    }

    /// Whether a shortcut can be propagated to this account.
    pub fn is_distribution_target(&self) -> bool {
        self.valid_shell && self.home.is_dir() && self.has_desktop
    }
}

/// Enumerates accounts from a passwd-format file.
#[derive(Debug, Clone)]
pub struct UserEnumerator {
    passwd_file: PathBuf,
    shells_file: PathBuf,
}

impl UserEnumerator {
    /// Create an enumerator over explicit passwd and shells files.
    pub fn new(passwd_file: impl AsRef<Path>, shells_file: impl AsRef<Path>) -> Self {
        Self {
            passwd_file: passwd_file.as_ref().to_path_buf(),
            shells_file: shells_file.as_ref().to_path_buf(),
        }
    }

    /// Every account in the passwd file, without filtering.
    pub fn list_accounts(&self) -> Result<Vec<UserAccount>> {
        let passwd = fs::read_to_string(&self.passwd_file)
            .map_err(|e| DesklinkError::io_action("read passwd file", &self.passwd_file, e))?;
        let shells = self.valid_shells()?;

        Ok(passwd
            .lines()
            .filter_map(parse_passwd_line)
            .map(|entry| {
                let valid_shell = shells.contains(&entry.shell);
                let has_desktop = entry.home.join(DesktopConfig::DESKTOP_DIR_NAME).is_dir();
                UserAccount {
                    name: entry.name,
                    uid: entry.uid,
                    home: entry.home,
                    shell: entry.shell,
                    valid_shell,
                    has_desktop,
                }
            })
            .collect())
    }

    /// Accounts with a valid shell, an existing home and a desktop directory.
    ///
    /// Each call re-reads the account sources.
    pub fn list_distribution_targets(&self) -> Result<Vec<UserAccount>> {
        let targets: Vec<UserAccount> = self
            .list_accounts()?
            .into_iter()
            .filter(|account| {
                let eligible = account.is_distribution_target();
                if !eligible {
                    debug!("Skipping account {} for shortcut propagation", account.name);
                }
                eligible
            })
            .collect();

        debug!("Found {} shortcut distribution targets", targets.len());
        Ok(targets)
    }

    fn valid_shells(&self) -> Result<HashSet<String>> {
        let content = fs::read_to_string(&self.shells_file)
            .map_err(|e| DesklinkError::io_action("read shells file", &self.shells_file, e))?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect())
    }
}

struct PasswdEntry {
    name: String,
    uid: u32,
    home: PathBuf,
    shell: String,
}

/// Parse `name:passwd:uid:gid:gecos:home:shell`.
fn parse_passwd_line(line: &str) -> Option<PasswdEntry> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let fields: Vec<&str> = line.split(':').collect();
    if fields.len() < 7 || fields[0].is_empty() {
        return None;
    }

    Some(PasswdEntry {
        name: fields[0].to_string(),
        uid: fields[2].parse().ok()?,
        home: PathBuf::from(fields[5]),
        shell: fields[6].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_sources(dir: &Path, passwd: &str, shells: &str) -> UserEnumerator {
        let passwd_file = dir.join("passwd");
        let shells_file = dir.join("shells");
        fs::write(&passwd_file, passwd).unwrap();
        fs::write(&shells_file, shells).unwrap();
        UserEnumerator::new(passwd_file, shells_file)
    }

    #[test]
    fn test_parse_passwd_line() {
        let entry = parse_passwd_line("alice:x:1000:1000:Alice,,,:/home/alice:/bin/bash").unwrap();
        assert_eq!(entry.name, "alice");
        assert_eq!(entry.uid, 1000);
        assert_eq!(entry.home, PathBuf::from("/home/alice"));
        assert_eq!(entry.shell, "/bin/bash");

        assert!(parse_passwd_line("# comment").is_none());
        assert!(parse_passwd_line("broken:x:1000").is_none());
        assert!(parse_passwd_line("bad:x:notanumber:1:::/bin/sh").is_none());
    }

    #[test]
    fn test_targets_require_desktop_dir() {
        let temp_dir = TempDir::new().unwrap();
        let alice = temp_dir.path().join("alice");
        let bob = temp_dir.path().join("bob");
        fs::create_dir_all(alice.join("Desktop")).unwrap();
        fs::create_dir_all(&bob).unwrap();

        let passwd = format!(
            "alice:x:1000:1000::{}:/bin/bash\nbob:x:1001:1001::{}:/bin/bash\n",
            alice.display(),
            bob.display()
        );
        let enumerator = write_sources(temp_dir.path(), &passwd, "/bin/sh\n/bin/bash\n");

        let targets = enumerator.list_distribution_targets().unwrap();

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, "alice");
        assert!(targets.iter().all(|a| a.desktop_dir().is_dir()));
    }

    #[test]
    fn test_targets_require_valid_shell_and_home() {
        let temp_dir = TempDir::new().unwrap();
        let daemon = temp_dir.path().join("daemon");
        fs::create_dir_all(daemon.join("Desktop")).unwrap();
        let ghost = temp_dir.path().join("ghost");

        let passwd = format!(
            "daemon:x:2:2::{}:/usr/sbin/nologin\nghost:x:1002:1002::{}:/bin/bash\n",
            daemon.display(),
            ghost.display()
        );
        let enumerator = write_sources(temp_dir.path(), &passwd, "# valid shells\n/bin/bash\n");

        let accounts = enumerator.list_accounts().unwrap();
        assert_eq!(accounts.len(), 2);
        assert!(!accounts[0].valid_shell);
        assert!(!accounts[1].has_desktop);

        assert!(enumerator.list_distribution_targets().unwrap().is_empty());
    }

    #[test]
    fn test_missing_passwd_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let enumerator = UserEnumerator::new(
            temp_dir.path().join("passwd"),
            temp_dir.path().join("shells"),
        );
        assert!(enumerator.list_distribution_targets().is_err());
    }
}
