//! Desktop entry and menu shortcut creation.
//!
//! # Architecture
//!
//! - `definition` - Shortcut configuration and validation
//! - `properties` - Template placeholders and their values
//! - `template` - The `.desktop` template and its renderer
//! - `entry_file` - Collision-free entry file creation
//! - `script` - Deferred shell scripts run after the install phase
//! - `helper_script` - Wrapper around `xdg-desktop-icon`
//! - `session` - Strategy selection and post-install actions

pub mod definition;
pub mod entry_file;
pub mod helper_script;
pub mod properties;
pub mod script;
pub mod session;
pub mod template;

pub use definition::{LinkKind, ShortcutConfig, ShortcutConfigBuilder, UserScope};
pub use entry_file::{sanitize_name, NameStyle};
pub use helper_script::HelperScriptGenerator;
pub use properties::{Placeholder, PropertyMap};
pub use script::{shell_join, shell_quote, DeferredScript};
pub use session::{PostActionReport, SaveOutcome, SaveStrategy, ShortcutSession, ShortcutWarning};
pub use template::DesktopTemplate;
