//! Desklink Core - desktop shortcut builder for Unix installers.
//!
//! Renders freedesktop.org `.desktop` entries from a shortcut description and
//! places them on the invoker's desktop, in the application menu, or, with
//! escalated rights, in every local account.
//!
//! # Example
//!
//! ```rust,no_run
//! use desklink_core::{ShortcutConfig, ShortcutSession, UninstallRecord};
//!
//! fn main() -> desklink_core::Result<()> {
//!     let mut session = ShortcutSession::detect("/opt/myapp", UninstallRecord::new())?;
//!
//!     let config = ShortcutConfig::builder()
//!         .name("MyApp")
//!         .target("/opt/myapp/bin/myapp")
//!         .build()?;
//!     let outcome = session.save(&config)?;
//!     println!("Created {:?}", outcome.entry_path);
//!
//!     session.post_action();
//!     session
//!         .into_recorder()
//!         .save(std::path::Path::new("/opt/myapp/uninstall.json"))?;
//!     Ok(())
//! }
//! ```

#[cfg(not(unix))]
compile_error!("desklink-core only supports Unix desktops");

pub mod config;
pub mod error;
pub mod platform;
pub mod resources;
pub mod shortcut;
pub mod uninstall;

// Re-export commonly used types
pub use config::{DesktopConfig, ScriptConfig, SystemPathsConfig};
pub use error::{DesklinkError, Result};
pub use platform::{CommandLocator, CommandSet, FixedLocator, HostEnvironment, PathLocator};
pub use resources::{DirectoryResources, EmbeddedResources, ResourceProvider};
pub use shortcut::{
    DeferredScript, DesktopTemplate, LinkKind, PostActionReport, SaveOutcome, SaveStrategy,
    ShortcutConfig, ShortcutSession, ShortcutWarning, UserScope,
};
pub use uninstall::{UninstallRecord, UninstallRecorder, UninstallReport};
