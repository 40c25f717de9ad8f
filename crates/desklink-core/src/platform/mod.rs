//! Platform layer for Unix desktop integration.
//!
//! This module centralizes everything that talks to the host system rather
//! than to the shortcut being built.
//!
//! # Architecture
//!
//! - `environment` - Invoker paths, locale and escalation rights
//! - `commands` - Resolution of external commands (`su`, `cp`, helpers)
//! - `permissions` - File mode handling (executable bits, world-readable)
//! - `users` - Local account enumeration

pub mod commands;
pub mod environment;
pub mod permissions;
pub mod users;

pub use commands::{CommandLocator, CommandSet, FixedLocator, PathLocator};
pub use environment::{language_from_locale, HostEnvironment};
pub use permissions::{is_executable, set_executable, set_mode};
pub use users::{UserAccount, UserEnumerator};
