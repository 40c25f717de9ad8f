//! Shortcut configuration as collected by an installer front-end.

use super::properties::{Placeholder, PropertyMap};
use crate::config::DesktopConfig;
use crate::error::{DesklinkError, Result};
use serde::{Deserialize, Serialize};

/// Where the shortcut appears.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// An icon on the desktop.
    #[default]
    DesktopIcon,
    /// An entry in the application menu.
    MenuEntry,
}

/// Which accounts receive the shortcut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserScope {
    #[default]
    CurrentUser,
    AllUsers,
}

/// A shortcut to create.
///
/// Every text field defaults to the empty string except `entry_type`
/// (`Application`) and `encoding` (`UTF-8`). `name` and `target` are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutConfig {
    /// Display name, also the base of the written file name.
    pub name: String,
    /// Executable to launch.
    pub target: String,
    pub arguments: String,
    pub working_directory: String,
    /// Icon file path or theme icon name.
    pub icon: String,
    pub description: String,
    pub generic_name: String,
    pub mime_type: String,
    pub categories: String,
    /// Menu group; a non-empty group always produces a menu entry.
    pub program_group: String,
    pub link_kind: LinkKind,
    pub user_scope: UserScope,
    /// `true`, `false`, or empty.
    pub terminal: String,
    pub terminal_options: String,
    pub entry_type: String,
    pub url: String,
    pub encoding: String,
    pub service_types: String,
    pub swallow_exec: String,
    pub swallow_title: String,
    pub kde_substitute_uid: String,
    pub kde_username: String,
    /// Translations for the display language; empty falls back to the
    /// untranslated value.
    pub localized_name: String,
    pub localized_comment: String,
    pub localized_generic_name: String,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            target: String::new(),
            arguments: String::new(),
            working_directory: String::new(),
            icon: String::new(),
            description: String::new(),
            generic_name: String::new(),
            mime_type: String::new(),
            categories: String::new(),
            program_group: String::new(),
            link_kind: LinkKind::default(),
            user_scope: UserScope::default(),
            terminal: String::new(),
            terminal_options: String::new(),
            entry_type: DesktopConfig::DEFAULT_ENTRY_TYPE.to_string(),
            url: String::new(),
            encoding: DesktopConfig::DEFAULT_ENCODING.to_string(),
            service_types: String::new(),
            swallow_exec: String::new(),
            swallow_title: String::new(),
            kde_substitute_uid: String::new(),
            kde_username: String::new(),
            localized_name: String::new(),
            localized_comment: String::new(),
            localized_generic_name: String::new(),
        }
    }
}

impl ShortcutConfig {
    /// Create a new shortcut builder.
    pub fn builder() -> ShortcutConfigBuilder {
        ShortcutConfigBuilder::new()
    }

    /// Check that the required fields are present.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DesklinkError::Validation {
                field: "name".to_string(),
                message: "shortcut name must not be empty".to_string(),
            });
        }
        if self.target.trim().is_empty() {
            return Err(DesklinkError::Validation {
                field: "target".to_string(),
                message: format!("shortcut '{}' has no target", self.name),
            });
        }
        Ok(())
    }

    /// Whether this shortcut goes on the desktop rather than into the menu.
    pub fn is_desktop_icon(&self) -> bool {
        self.link_kind == LinkKind::DesktopIcon && self.program_group.is_empty()
    }

    /// Template values for this shortcut.
    pub fn to_properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();

        props.set(Placeholder::Name, &self.name);
        props.set(
            Placeholder::LocalizedName,
            or_fallback(&self.localized_name, &self.name),
        );
        props.set(Placeholder::Comment, &self.description);
        props.set(
            Placeholder::LocalizedComment,
            or_fallback(&self.localized_comment, &self.description),
        );
        props.set(Placeholder::GenericName, &self.generic_name);
        props.set(
            Placeholder::LocalizedGenericName,
            or_fallback(&self.localized_generic_name, &self.generic_name),
        );

        props.set(Placeholder::Exec, &self.target);
        props.set(Placeholder::ExecQuote, quote_for(&self.target));
        props.set(Placeholder::Arguments, &self.arguments);
        props.set(Placeholder::Path, &self.working_directory);
        props.set(Placeholder::PathQuote, quote_for(&self.working_directory));

        props.set(Placeholder::Icon, &self.icon);
        props.set(Placeholder::MimeType, &self.mime_type);
        props.set(Placeholder::Categories, &self.categories);
        props.set(Placeholder::Terminal, &self.terminal);
        props.set(Placeholder::TerminalOptions, &self.terminal_options);
        props.set(Placeholder::EntryType, &self.entry_type);
        props.set(Placeholder::Url, &self.url);
        props.set(Placeholder::Encoding, &self.encoding);
        props.set(Placeholder::ServiceTypes, &self.service_types);
        props.set(Placeholder::SwallowExec, &self.swallow_exec);
        props.set(Placeholder::SwallowTitle, &self.swallow_title);
        props.set(Placeholder::KdeSubstituteUid, &self.kde_substitute_uid);
        props.set(Placeholder::KdeUsername, &self.kde_username);

        props
    }
}

fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Paths made of more than one whitespace-separated word are quoted.
fn quote_for(path: &str) -> &'static str {
    if path.split_whitespace().count() > 1 {
        "\""
    } else {
        ""
    }
}

/// Builder for shortcut configurations.
pub struct ShortcutConfigBuilder {
    config: ShortcutConfig,
}

impl ShortcutConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: ShortcutConfig::default(),
        }
    }

    /// Set the shortcut name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the executable to launch.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.config.target = target.into();
        self
    }

    pub fn arguments(mut self, arguments: impl Into<String>) -> Self {
        self.config.arguments = arguments.into();
        self
    }

    pub fn working_directory(mut self, dir: impl Into<String>) -> Self {
        self.config.working_directory = dir.into();
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.config.icon = icon.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.config.description = description.into();
        self
    }

    pub fn generic_name(mut self, generic_name: impl Into<String>) -> Self {
        self.config.generic_name = generic_name.into();
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.config.mime_type = mime_type.into();
        self
    }

    pub fn categories(mut self, categories: impl Into<String>) -> Self {
        self.config.categories = categories.into();
        self
    }

    /// Set the menu group. A non-empty group makes this a menu entry.
    pub fn program_group(mut self, group: impl Into<String>) -> Self {
        self.config.program_group = group.into();
        self
    }

    pub fn link_kind(mut self, kind: LinkKind) -> Self {
        self.config.link_kind = kind;
        self
    }

    pub fn user_scope(mut self, scope: UserScope) -> Self {
        self.config.user_scope = scope;
        self
    }

    pub fn terminal(mut self, terminal: bool) -> Self {
        self.config.terminal = terminal.to_string();
        self
    }

    pub fn terminal_options(mut self, options: impl Into<String>) -> Self {
        self.config.terminal_options = options.into();
        self
    }

    /// Set the entry type (`Application`, `Link` or `Directory`).
    pub fn entry_type(mut self, entry_type: impl Into<String>) -> Self {
        self.config.entry_type = entry_type.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.config.encoding = encoding.into();
        self
    }

    /// KDE service types, `;`-separated.
    pub fn service_types(mut self, service_types: impl Into<String>) -> Self {
        self.config.service_types = service_types.into();
        self
    }

    pub fn swallow_exec(mut self, command: impl Into<String>) -> Self {
        self.config.swallow_exec = command.into();
        self
    }

    pub fn swallow_title(mut self, title: impl Into<String>) -> Self {
        self.config.swallow_title = title.into();
        self
    }

    pub fn kde_substitute_uid(mut self, value: impl Into<String>) -> Self {
        self.config.kde_substitute_uid = value.into();
        self
    }

    pub fn kde_username(mut self, username: impl Into<String>) -> Self {
        self.config.kde_username = username.into();
        self
    }

    pub fn localized_name(mut self, name: impl Into<String>) -> Self {
        self.config.localized_name = name.into();
        self
    }

    pub fn localized_comment(mut self, comment: impl Into<String>) -> Self {
        self.config.localized_comment = comment.into();
        self
    }

    pub fn localized_generic_name(mut self, generic_name: impl Into<String>) -> Self {
        self.config.localized_generic_name = generic_name.into();
        self
    }

    /// Build and validate the shortcut configuration.
    pub fn build(self) -> Result<ShortcutConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ShortcutConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_name_and_target() {
        let missing_target = ShortcutConfig::builder().name("MyApp").build();
        assert!(matches!(
            missing_target,
            Err(DesklinkError::Validation { ref field, .. }) if field == "target"
        ));

        let missing_name = ShortcutConfig::builder().target("/bin/true").build();
        assert!(matches!(
            missing_name,
            Err(DesklinkError::Validation { ref field, .. }) if field == "name"
        ));
    }

    #[test]
    fn test_defaults() {
        let config = ShortcutConfig::builder()
            .name("MyApp")
            .target("/opt/myapp/bin/run")
            .build()
            .unwrap();

        assert_eq!(config.entry_type, "Application");
        assert_eq!(config.encoding, "UTF-8");
        assert_eq!(config.link_kind, LinkKind::DesktopIcon);
        assert_eq!(config.user_scope, UserScope::CurrentUser);
        assert!(config.is_desktop_icon());
    }

    #[test]
    fn test_program_group_forces_menu_entry() {
        let config = ShortcutConfig::builder()
            .name("MyApp")
            .target("/opt/myapp/bin/run")
            .program_group("Tools")
            .build()
            .unwrap();

        assert!(!config.is_desktop_icon());
    }

    #[test]
    fn test_quotes_paths_with_whitespace() {
        let config = ShortcutConfig::builder()
            .name("MyApp")
            .target("/opt/my app/run")
            .working_directory("/opt/myapp")
            .build()
            .unwrap();

        let props = config.to_properties();
        assert_eq!(props.get(Placeholder::ExecQuote), "\"");
        assert_eq!(props.get(Placeholder::PathQuote), "");
    }

    #[test]
    fn test_localized_values_fall_back() {
        let config = ShortcutConfig::builder()
            .name("MyApp")
            .target("/bin/true")
            .description("Does things")
            .localized_name("MeineApp")
            .build()
            .unwrap();

        let props = config.to_properties();
        assert_eq!(props.get(Placeholder::LocalizedName), "MeineApp");
        assert_eq!(props.get(Placeholder::LocalizedComment), "Does things");
    }

    #[test]
    fn test_kde_and_swallow_keys() {
        let config = ShortcutConfig::builder()
            .name("MyApp")
            .target("/bin/true")
            .generic_name("Viewer")
            .localized_generic_name("Betrachter")
            .service_types("KParts/ReadOnlyPart;")
            .swallow_exec("/bin/true --embed")
            .swallow_title("MyApp Embedded")
            .build()
            .unwrap();

        let props = config.to_properties();
        assert_eq!(props.get(Placeholder::LocalizedGenericName), "Betrachter");
        assert_eq!(props.get(Placeholder::ServiceTypes), "KParts/ReadOnlyPart;");
        assert_eq!(props.get(Placeholder::SwallowExec), "/bin/true --embed");
        assert_eq!(props.get(Placeholder::SwallowTitle), "MyApp Embedded");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ShortcutConfig = serde_json::from_str(
            r#"{"name": "MyApp", "target": "/bin/true", "link_kind": "menu_entry", "user_scope": "all_users"}"#,
        )
        .unwrap();

        assert_eq!(config.link_kind, LinkKind::MenuEntry);
        assert_eq!(config.user_scope, UserScope::AllUsers);
        assert_eq!(config.entry_type, "Application");
        assert!(config.icon.is_empty());
    }
}
