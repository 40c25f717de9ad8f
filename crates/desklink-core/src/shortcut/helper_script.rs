//! Locale-aware wrapper around the `xdg-desktop-icon` helper.

use crate::config::ScriptConfig;
use crate::error::{DesklinkError, Result};
use crate::platform::permissions;
use crate::resources::ResourceProvider;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Generator for the desktop-icon wrapper script.
pub struct HelperScriptGenerator<'a> {
    resources: &'a dyn ResourceProvider,
    /// Resolved `xdg-desktop-icon` executable.
    helper: PathBuf,
    /// Display language passed on to the helper.
    language: String,
}

impl<'a> HelperScriptGenerator<'a> {
    /// Create a generator.
    ///
    /// # Arguments
    ///
    /// * `resources` - Source of the wrapper template
    /// * `helper` - Path of the `xdg-desktop-icon` command
    /// * `language` - Display-locale language code
    pub fn new(
        resources: &'a dyn ResourceProvider,
        helper: impl AsRef<Path>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            resources,
            helper: helper.as_ref().to_path_buf(),
            language: language.into(),
        }
    }

    /// Render the wrapper content from the resource template.
    pub fn content(&self) -> Result<String> {
        let template = self.resources.get_string(ScriptConfig::WRAPPER_RESOURCE_PATH)?;
        Ok(template
            .replace("@XDG_DESKTOP_ICON@", &self.helper.display().to_string())
            .replace("@LANG@", &self.language))
    }

    /// Write the wrapper into `dir` and make it executable.
    ///
    /// # Returns
    ///
    /// Path to the generated script.
    pub fn generate(&self, dir: &Path) -> Result<PathBuf> {
        let content = self.content()?;
        let script_path = dir.join(ScriptConfig::WRAPPER_FILE_NAME);

        fs::write(&script_path, content)
            .map_err(|e| DesklinkError::io_action("write helper script", &script_path, e))?;
        permissions::set_executable(&script_path)?;

        debug!("Generated desktop icon helper script at {:?}", script_path);
        Ok(script_path)
    }
}
