//! Placeholder keys and the property store filled into the entry template.

use crate::error::{DesklinkError, Result};
use std::collections::BTreeMap;
use std::fmt;

/// A placeholder token of the desktop entry template.
///
/// The set is closed: every variant appears in [`Placeholder::ALL`] and
/// every [`PropertyMap`] carries a value for each of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    Categories,
    Comment,
    LocalizedComment,
    Encoding,
    ExecQuote,
    Exec,
    Arguments,
    GenericName,
    LocalizedGenericName,
    Icon,
    MimeType,
    Name,
    LocalizedName,
    PathQuote,
    Path,
    ServiceTypes,
    SwallowExec,
    SwallowTitle,
    Terminal,
    TerminalOptions,
    EntryType,
    Url,
    KdeSubstituteUid,
    KdeUsername,
}

impl Placeholder {
    pub const ALL: [Placeholder; 24] = [
        Placeholder::Categories,
        Placeholder::Comment,
        Placeholder::LocalizedComment,
        Placeholder::Encoding,
        Placeholder::ExecQuote,
        Placeholder::Exec,
        Placeholder::Arguments,
        Placeholder::GenericName,
        Placeholder::LocalizedGenericName,
        Placeholder::Icon,
        Placeholder::MimeType,
        Placeholder::Name,
        Placeholder::LocalizedName,
        Placeholder::PathQuote,
        Placeholder::Path,
        Placeholder::ServiceTypes,
        Placeholder::SwallowExec,
        Placeholder::SwallowTitle,
        Placeholder::Terminal,
        Placeholder::TerminalOptions,
        Placeholder::EntryType,
        Placeholder::Url,
        Placeholder::KdeSubstituteUid,
        Placeholder::KdeUsername,
    ];

    /// The literal token as it appears in the template.
    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::Categories => "$Categories",
            Placeholder::Comment => "$Comment",
            Placeholder::LocalizedComment => "$$LANG_Comment",
            Placeholder::Encoding => "$Encoding",
            Placeholder::ExecQuote => "$E_QUOT",
            Placeholder::Exec => "$Exec",
            Placeholder::Arguments => "$Arguments",
            Placeholder::GenericName => "$GenericName",
            Placeholder::LocalizedGenericName => "$$LANG_GenericName",
            Placeholder::Icon => "$Icon",
            Placeholder::MimeType => "$MimeType",
            Placeholder::Name => "$Name",
            Placeholder::LocalizedName => "$$LANG_Name",
            Placeholder::PathQuote => "$P_QUOT",
            Placeholder::Path => "$Path",
            Placeholder::ServiceTypes => "$ServiceTypes",
            Placeholder::SwallowExec => "$SwallowExec",
            Placeholder::SwallowTitle => "$SwallowTitle",
            Placeholder::Terminal => "$Terminal",
            Placeholder::TerminalOptions => "$Options_For_Terminal",
            Placeholder::EntryType => "$Type",
            Placeholder::Url => "$URL",
            Placeholder::KdeSubstituteUid => "$X_KDE_SubstituteUID",
            Placeholder::KdeUsername => "$X_KDE_Username",
        }
    }

    /// Look up a placeholder by its token text.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.token() == token)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Values for every template placeholder.
///
/// Unset placeholders read as the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMap {
    values: BTreeMap<Placeholder, String>,
}

impl PropertyMap {
    /// Create a map with every placeholder set to `""`.
    pub fn new() -> Self {
        Self {
            values: Placeholder::ALL
                .iter()
                .map(|p| (*p, String::new()))
                .collect(),
        }
    }

    /// Set a placeholder value. Later calls overwrite earlier ones.
    pub fn set(&mut self, key: Placeholder, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    /// Set a placeholder by its token text, e.g. `"$Icon"`.
    ///
    /// # Errors
    /// Returns [`DesklinkError::UnknownPlaceholder`] for any token outside
    /// the fixed set.
    pub fn set_by_token(&mut self, token: &str, value: impl Into<String>) -> Result<()> {
        let key = Placeholder::from_token(token)
            .ok_or_else(|| DesklinkError::UnknownPlaceholder(token.to_string()))?;
        self.set(key, value);
        Ok(())
    }

    pub fn get(&self, key: Placeholder) -> &str {
        self.values.get(&key).map(String::as_str).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Placeholder, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl Default for PropertyMap {
    fn default() -> Self {
        Self::new()
    }
}
