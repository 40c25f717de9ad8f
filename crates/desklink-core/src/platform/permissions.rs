//! File permission handling.
//!
//! Wrappers around the Unix mode bits used for generated scripts, entries
//! handed to other accounts, and destination writability checks.

use crate::config::ScriptConfig;
use crate::error::{DesklinkError, Result};
use std::path::Path;
use tracing::debug;

/// Make a file executable (mode 0o755).
///
/// # Errors
/// Returns an error if the file doesn't exist or permissions can't be changed.
pub fn set_executable(path: &Path) -> Result<()> {
    set_mode(path, ScriptConfig::EXECUTABLE_MODE)?;
    debug!("Set executable permissions on: {}", path.display());
    Ok(())
}

/// Set the permission bits of a file.
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata =
        std::fs::metadata(path).map_err(|e| DesklinkError::io_action("get file metadata", path, e))?;
    let mut permissions = metadata.permissions();
    permissions.set_mode(mode);
    std::fs::set_permissions(path, permissions)
        .map_err(|e| DesklinkError::io_action("set permissions", path, e))?;
    Ok(())
}

/// Check if a file has any execute bit set.
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Check whether the current process may create files in `dir`.
pub fn is_writable_dir(dir: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};

    dir.is_dir() && access(dir, AccessFlags::W_OK | AccessFlags::X_OK).is_ok()
}
