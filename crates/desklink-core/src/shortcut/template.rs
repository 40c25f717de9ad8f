//! Desktop entry template.
//!
//! Implements the KDE/GNOME desktop entry layout as a fixed template whose
//! values are substituted from a [`PropertyMap`].

use super::properties::{Placeholder, PropertyMap};
use crate::config::DesktopConfig;
use std::cmp::Reverse;
use std::fmt::Write as FmtWrite;

/// The desktop entry template for one display language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopTemplate {
    language: String,
    text: String,
}

impl DesktopTemplate {
    /// Build the template with localized keys for `language` (e.g. `de`).
    pub fn new(language: impl Into<String>) -> Self {
        let language = language.into();
        let mut text = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(text, "[Desktop Entry]");
        let _ = writeln!(text, "Categories={}", Placeholder::Categories);
        let _ = writeln!(text, "Comment={}", Placeholder::Comment);
        let _ = writeln!(text, "Comment[{}]={}", language, Placeholder::LocalizedComment);
        let _ = writeln!(text, "Encoding={}", Placeholder::Encoding);
        let _ = writeln!(
            text,
            "Exec={q}{}{q} {}",
            Placeholder::Exec,
            Placeholder::Arguments,
            q = Placeholder::ExecQuote
        );
        let _ = writeln!(text, "GenericName={}", Placeholder::GenericName);
        let _ = writeln!(
            text,
            "GenericName[{}]={}",
            language,
            Placeholder::LocalizedGenericName
        );
        let _ = writeln!(text, "Icon={}", Placeholder::Icon);
        let _ = writeln!(text, "MimeType={}", Placeholder::MimeType);
        let _ = writeln!(text, "Name={}", Placeholder::Name);
        let _ = writeln!(text, "Name[{}]={}", language, Placeholder::LocalizedName);
        let _ = writeln!(
            text,
            "Path={q}{}{q}",
            Placeholder::Path,
            q = Placeholder::PathQuote
        );
        let _ = writeln!(text, "ServiceTypes={}", Placeholder::ServiceTypes);
        let _ = writeln!(text, "SwallowExec={}", Placeholder::SwallowExec);
        let _ = writeln!(text, "SwallowTitle={}", Placeholder::SwallowTitle);
        let _ = writeln!(text, "Terminal={}", Placeholder::Terminal);
        let _ = writeln!(text, "TerminalOptions={}", Placeholder::TerminalOptions);
        let _ = writeln!(text, "Type={}", Placeholder::EntryType);
        let _ = writeln!(text, "URL={}", Placeholder::Url);
        let _ = writeln!(text, "X-KDE-SubstituteUID={}", Placeholder::KdeSubstituteUid);
        let _ = writeln!(text, "X-KDE-Username={}", Placeholder::KdeUsername);
        let _ = writeln!(text);
        let _ = writeln!(
            text,
            "# created by {} {}",
            DesktopConfig::GENERATOR_NAME,
            env!("CARGO_PKG_VERSION")
        );

        Self { language, text }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// The raw template text, placeholders included.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Substitute `properties` into the template.
    pub fn render(&self, properties: &PropertyMap) -> String {
        render(&self.text, properties)
    }
}

/// Replace every placeholder token in `template` with its value.
///
/// The template is scanned once from left to right. At each `$` the longest
/// matching token wins, and substituted values are never scanned again, so
/// a value that happens to contain token text is copied verbatim.
pub fn render(template: &str, properties: &PropertyMap) -> String {
    let mut tokens = Placeholder::ALL;
    tokens.sort_by_key(|p| Reverse(p.token().len()));

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match tokens.iter().find(|p| tail.starts_with(p.token())) {
            Some(placeholder) => {
                out.push_str(properties.get(*placeholder));
                rest = &tail[placeholder.token().len()..];
            }
            None => {
                out.push('$');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
