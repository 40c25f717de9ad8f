//! Shortcut session: strategy selection and deferred post-install actions.
//!
//! One [`ShortcutSession`] lives for one installation run. It owns the
//! scripts that accumulate commands across every [`ShortcutSession::save`]
//! call, so a single escalated script covers every account and shortcut.

use super::definition::{ShortcutConfig, UserScope};
use super::entry_file::{self, NameStyle};
use super::helper_script::HelperScriptGenerator;
use super::script::{shell_join, DeferredScript};
use super::template::DesktopTemplate;
use crate::config::{DesktopConfig, ScriptConfig};
use crate::error::{DesklinkError, Result};
use crate::platform::{
    permissions, CommandLocator, CommandSet, HostEnvironment, PathLocator, UserAccount,
    UserEnumerator,
};
use crate::resources::{EmbeddedResources, ResourceProvider};
use crate::uninstall::UninstallRecorder;
use chrono::Utc;
use serde::Serialize;
use std::cell::OnceCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How a shortcut was installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStrategy {
    /// Desktop icon registered through `xdg-desktop-icon`.
    DesktopIconViaHelper,
    /// Desktop icon copied straight into desktop directories.
    DesktopIconDirectCopy,
    /// Menu entry in the invoker's local applications directory.
    UserMenuEntry,
    /// Menu entry in the shared applications directory.
    SystemMenuEntry,
}

/// A recoverable problem encountered while saving a shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortcutWarning {
    /// Name of the shortcut being saved.
    pub shortcut: String,
    pub message: String,
    pub path: Option<PathBuf>,
}

/// Result of saving one shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub shortcut: String,
    pub strategy: SaveStrategy,
    /// The primary rendered entry file.
    pub entry_path: PathBuf,
    /// Every file registered with the uninstall recorder, in order.
    pub registered_files: Vec<PathBuf>,
    /// Accounts that received deferred propagation commands.
    pub propagated_to: Vec<String>,
    pub warnings: Vec<ShortcutWarning>,
}

/// Result of the post-install step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostActionReport {
    /// Names of the scripts that ran successfully.
    pub executed: Vec<String>,
    pub failures: Vec<String>,
    pub uninstall_scripts_registered: usize,
}

/// Progress of a single `save` call.
struct SaveLog {
    shortcut: String,
    registered_files: Vec<PathBuf>,
    propagated_to: Vec<String>,
    warnings: Vec<ShortcutWarning>,
}

impl SaveLog {
    fn new(shortcut: &str) -> Self {
        Self {
            shortcut: shortcut.to_string(),
            registered_files: Vec::new(),
            propagated_to: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: impl Into<String>, path: Option<&Path>) {
        let message = message.into();
        warn!("Shortcut {}: {}", self.shortcut, message);
        self.warnings.push(ShortcutWarning {
            shortcut: self.shortcut.clone(),
            message,
            path: path.map(Path::to_path_buf),
        });
    }

    fn finish(self, strategy: SaveStrategy, entry_path: PathBuf) -> SaveOutcome {
        SaveOutcome {
            shortcut: self.shortcut,
            strategy,
            entry_path,
            registered_files: self.registered_files,
            propagated_to: self.propagated_to,
            warnings: self.warnings,
        }
    }
}

/// Builds desktop entries for one installation run.
pub struct ShortcutSession<R: UninstallRecorder> {
    env: HostEnvironment,
    commands: CommandSet,
    resources: Box<dyn ResourceProvider>,
    recorder: R,
    template: DesktopTemplate,
    accounts: UserEnumerator,
    /// Distribution targets, read at most once per session.
    targets: OnceCell<std::result::Result<Vec<UserAccount>, String>>,
    /// Escalated commands run by the post-install step.
    root_install: DeferredScript,
    /// Escalated commands handed to the uninstaller.
    root_uninstall: DeferredScript,
    /// Helper invocations run by the post-install step.
    xdg_install: DeferredScript,
    /// Helper wrapper scripts already generated in this session.
    helper_scripts: HashSet<PathBuf>,
    warnings: Vec<ShortcutWarning>,
    post_action_done: bool,
}

impl<R: UninstallRecorder> ShortcutSession<R> {
    /// Create a session.
    ///
    /// # Arguments
    ///
    /// * `env` - Host environment snapshot
    /// * `locator` - Resolves the external commands once, up front
    /// * `recorder` - Receives every written file and uninstall script
    pub fn new(env: HostEnvironment, locator: &dyn CommandLocator, recorder: R) -> Self {
        let accounts = UserEnumerator::new(env.passwd_file(), env.shells_file());
        Self {
            commands: CommandSet::resolve(locator),
            template: DesktopTemplate::new(env.language()),
            resources: Box::new(EmbeddedResources),
            recorder,
            accounts,
            targets: OnceCell::new(),
            root_install: DeferredScript::new("root-install"),
            root_uninstall: DeferredScript::new("root-uninstall"),
            xdg_install: DeferredScript::new("xdg-install"),
            helper_scripts: HashSet::new(),
            warnings: Vec::new(),
            post_action_done: false,
            env,
        }
    }

    /// Create a session for the current process, looking commands up in
    /// `PATH`.
    pub fn detect(install_root: impl AsRef<Path>, recorder: R) -> Result<Self> {
        let env = HostEnvironment::detect(install_root)?;
        Ok(Self::new(env, &PathLocator, recorder))
    }

    /// Load the helper wrapper template from `resources`.
    pub fn with_resources(mut self, resources: impl ResourceProvider + 'static) -> Self {
        self.resources = Box::new(resources);
        self
    }

    /// Replace the resolved commands.
    pub fn with_commands(mut self, commands: CommandSet) -> Self {
        self.commands = commands;
        self
    }

    pub fn environment(&self) -> &HostEnvironment {
        &self.env
    }

    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    /// Consume the session, returning the recorder.
    pub fn into_recorder(self) -> R {
        self.recorder
    }

    /// Warnings of every `save` so far.
    pub fn warnings(&self) -> &[ShortcutWarning] {
        &self.warnings
    }

    pub fn root_install_script(&self) -> &DeferredScript {
        &self.root_install
    }

    pub fn root_uninstall_script(&self) -> &DeferredScript {
        &self.root_uninstall
    }

    pub fn xdg_install_script(&self) -> &DeferredScript {
        &self.xdg_install
    }

    /// Render the entry for `config` without writing anything.
    pub fn render(&self, config: &ShortcutConfig) -> String {
        self.template.render(&config.to_properties())
    }

    /// Folder holding menu entries for `scope`.
    pub fn programs_folder(&self, scope: UserScope) -> PathBuf {
        self.env.programs_folder(scope)
    }

    /// `(Default)` followed by every existing group directory for `scope`.
    pub fn program_groups(&self, scope: UserScope) -> Vec<String> {
        let mut groups = vec![DesktopConfig::DEFAULT_PROGRAM_GROUP.to_string()];

        if let Ok(entries) = fs::read_dir(self.env.programs_folder(scope)) {
            let mut names: Vec<String> = entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_dir())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            groups.extend(names);
        }

        groups
    }

    /// Accounts eligible for propagation, read once per session.
    pub fn distribution_targets(&self) -> Result<&[UserAccount]> {
        let cached = self.targets.get_or_init(|| {
            self.accounts
                .list_distribution_targets()
                .map_err(|e| e.to_string())
        });

        match cached {
            Ok(targets) => Ok(targets),
            Err(message) => Err(DesklinkError::Other(message.clone())),
        }
    }

    /// Create the shortcut described by `config`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the primary entry file cannot
    /// be written. Everything else is reported as a warning in the outcome.
    pub fn save(&mut self, config: &ShortcutConfig) -> Result<SaveOutcome> {
        config.validate()?;

        let content = self.render(config);
        let mut log = SaveLog::new(&config.name);
        let all_users = self.all_users(config, &mut log);

        let outcome = if config.is_desktop_icon() {
            self.save_desktop_icon(config, &content, all_users, log)?
        } else {
            self.save_menu_entry(config, &content, all_users, log)?
        };

        info!(
            "Created shortcut {} ({:?}) at {:?}",
            outcome.shortcut, outcome.strategy, outcome.entry_path
        );
        self.warnings.extend(outcome.warnings.iter().cloned());
        Ok(outcome)
    }

    /// Run the deferred scripts and hand the uninstall script over.
    ///
    /// Call once, after every shortcut of the run has been saved. Failures
    /// are logged and reported; nothing is rolled back.
    pub fn post_action(&mut self) -> PostActionReport {
        let mut report = PostActionReport::default();

        if self.post_action_done {
            warn!("Post-install shortcut actions already ran for this session");
            return report;
        }
        self.post_action_done = true;

        info!("Launching post-install shortcut actions");
        let shell = self.commands.shell.clone();
        let temp_dir = self.env.temp_dir().to_path_buf();

        for script in [&mut self.root_install, &mut self.xdg_install] {
            if script.is_empty() {
                debug!("Nothing to run for {} script", script.name());
                continue;
            }
            match script.run(&shell, &temp_dir) {
                Ok(()) => report.executed.push(script.name().to_string()),
                Err(e) => {
                    warn!("Post-install script {} failed: {}", script.name(), e);
                    report.failures.push(e.to_string());
                }
            }
        }

        if !self.root_uninstall.is_empty() {
            debug!("Registering uninstall script:\n{}", self.root_uninstall.render());
            self.recorder
                .add_uninstall_script(self.root_uninstall.render());
            report.uninstall_scripts_registered += 1;
        }

        report
    }

    fn all_users(&self, config: &ShortcutConfig, log: &mut SaveLog) -> bool {
        match config.user_scope {
            UserScope::CurrentUser => false,
            UserScope::AllUsers if self.env.can_escalate() => true,
            UserScope::AllUsers => {
                log.warn(
                    "all-users shortcut requested without escalation rights, creating it for the current user only",
                    None,
                );
                false
            }
        }
    }

    fn register_file(&mut self, log: &mut SaveLog, path: &Path) {
        self.recorder.add_file(path, true);
        log.registered_files.push(path.to_path_buf());
    }

    fn save_desktop_icon(
        &mut self,
        config: &ShortcutConfig,
        content: &str,
        all_users: bool,
        mut log: SaveLog,
    ) -> Result<SaveOutcome> {
        let location = match self.env.shortcut_location_override() {
            None => self.env.install_root().to_path_buf(),
            Some(Ok(dir)) => dir,
            Some(Err(e)) => {
                log.warn(
                    format!("shortcut location unusable, using install root: {}", e),
                    e.path(),
                );
                self.env.install_root().to_path_buf()
            }
        };

        let entry = entry_file::write_unique_entry(
            &location,
            &config.name,
            NameStyle::DashForWhitespace,
            content,
        )?;
        self.register_file(&mut log, &entry);

        let helper_script = match self.commands.xdg_desktop_icon.clone() {
            Some(helper) => self.prepare_helper_script(&helper, &location, &mut log),
            None => None,
        };

        let strategy = match helper_script {
            Some(helper_script) => {
                self.install_with_helper(&helper_script, &entry, all_users, &mut log);
                SaveStrategy::DesktopIconViaHelper
            }
            None => {
                self.install_by_copy(config, &entry, all_users, &mut log);
                SaveStrategy::DesktopIconDirectCopy
            }
        };

        Ok(log.finish(strategy, entry))
    }

    /// Generate the wrapper script once per directory.
    fn prepare_helper_script(
        &mut self,
        helper: &Path,
        dir: &Path,
        log: &mut SaveLog,
    ) -> Option<PathBuf> {
        let path = dir.join(ScriptConfig::WRAPPER_FILE_NAME);
        if self.helper_scripts.contains(&path) {
            return Some(path);
        }

        let generator =
            HelperScriptGenerator::new(self.resources.as_ref(), helper, self.env.language());
        match generator.generate(dir) {
            Ok(path) => {
                self.register_file(log, &path);
                self.helper_scripts.insert(path.clone());
                Some(path)
            }
            Err(e) => {
                log.warn(
                    format!("desktop icon helper unusable, copying entry directly: {}", e),
                    Some(dir),
                );
                None
            }
        }
    }

    fn install_with_helper(
        &mut self,
        helper_script: &Path,
        entry: &Path,
        all_users: bool,
        log: &mut SaveLog,
    ) {
        let helper = helper_script.display().to_string();
        let entry = entry.display().to_string();

        self.xdg_install
            .append_command(&[helper.as_str(), "install", "--novendor", entry.as_str()]);

        let mut uninstall = DeferredScript::new("xdg-uninstall");
        uninstall.append_command(&[helper.as_str(), "uninstall", "--novendor", entry.as_str()]);
        self.recorder.add_uninstall_script(uninstall.render());

        if all_users {
            self.propagate_with_helper(&helper, &entry, log);
        }
    }

    /// `su <account> -c '<helper> install --novendor <entry>'` per account.
    fn propagate_with_helper(&mut self, helper: &str, entry: &str, log: &mut SaveLog) {
        let Some(targets) = self.other_accounts(log) else {
            return;
        };

        // The payload is quoted word by word here and once more as a whole
        // by `append_command`.
        let install = shell_join(&[helper, "install", "--novendor", entry]);
        let uninstall = shell_join(&[helper, "uninstall", "--novendor", entry]);

        for account in targets {
            self.root_install.append_command(&[
                self.commands.su.as_str(),
                account.name.as_str(),
                "-c",
                install.as_str(),
            ]);
            self.root_uninstall.append_command(&[
                self.commands.su.as_str(),
                account.name.as_str(),
                "-c",
                uninstall.as_str(),
            ]);
            log.propagated_to.push(account.name);
        }

        debug!("Root install script:\n{}", self.root_install.render());
    }

    fn install_by_copy(
        &mut self,
        config: &ShortcutConfig,
        entry: &Path,
        all_users: bool,
        log: &mut SaveLog,
    ) {
        let desktop = self.env.desktop_dir().to_path_buf();
        let copied = fs::create_dir_all(&desktop)
            .map_err(|e| DesklinkError::io_action("create desktop directory", &desktop, e))
            .and_then(|()| {
                entry_file::copy_to_unique(
                    entry,
                    &desktop,
                    &config.name,
                    NameStyle::DashForWhitespace,
                )
            });

        match copied {
            Ok(path) => self.register_file(log, &path),
            Err(e) => log.warn(
                format!("could not copy entry to the desktop: {}", e),
                Some(desktop.as_path()),
            ),
        }

        if all_users {
            self.propagate_by_copy(entry, log);
        }
    }

    /// Copy the entry into every other account's desktop as that account.
    fn propagate_by_copy(&mut self, entry: &Path, log: &mut SaveLog) {
        let Some(targets) = self.other_accounts(log) else {
            return;
        };
        if targets.is_empty() {
            debug!("No other accounts to copy {:?} to", entry);
            return;
        }
        let Some(file_name) = entry.file_name() else {
            return;
        };

        let temp = match self.shared_temp_copy(entry) {
            Ok(temp) => temp,
            Err(e) => {
                log.warn(
                    format!("could not stage entry for other accounts: {}", e),
                    e.path(),
                );
                return;
            }
        };
        let temp = temp.display().to_string();

        for account in targets {
            let dest = account.desktop_dir().join(file_name).display().to_string();
            let copy = shell_join(&[self.commands.cp.as_str(), temp.as_str(), dest.as_str()]);
            let remove = shell_join(&[self.commands.rm.as_str(), dest.as_str()]);

            self.root_install.append_command(&[
                self.commands.su.as_str(),
                account.name.as_str(),
                "-c",
                copy.as_str(),
            ]);
            self.root_install.append_command(&[
                self.commands.chown.as_str(),
                account.name.as_str(),
                dest.as_str(),
            ]);
            self.root_uninstall.append_command(&[
                self.commands.su.as_str(),
                account.name.as_str(),
                "-c",
                remove.as_str(),
            ]);
            log.propagated_to.push(account.name);
        }

        self.root_install
            .append_command(&[self.commands.rm.as_str(), temp.as_str()]);
    }

    /// World-readable copy of `entry` that other accounts can read.
    fn shared_temp_copy(&self, entry: &Path) -> Result<PathBuf> {
        let temp_dir = self.env.temp_dir();
        let prefix = format!(
            "{}-{}-entry-",
            ScriptConfig::TEMP_PREFIX,
            Utc::now().timestamp_millis()
        );
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(temp_dir)
            .map_err(|e| DesklinkError::io_action("create temp file", temp_dir, e))?;
        // Removed on drop until kept.
        let staged = file.into_temp_path();

        fs::copy(entry, &staged)
            .map_err(|e| DesklinkError::io_action("copy entry", staged.to_path_buf(), e))?;
        permissions::set_mode(&staged, ScriptConfig::SHARED_TEMP_MODE)?;

        let path = staged
            .keep()
            .map_err(|e| DesklinkError::io_action("keep temp file", temp_dir, e.error))?;
        debug!("Staged {:?} at {:?}", entry, path);
        Ok(path)
    }

    /// Distribution targets other than the invoker.
    fn other_accounts(&self, log: &mut SaveLog) -> Option<Vec<UserAccount>> {
        match self.distribution_targets() {
            Ok(targets) => Some(
                targets
                    .iter()
                    .filter(|account| {
                        let is_self = account.home.as_path() == self.env.home_dir();
                        if is_self {
                            info!("Skipping self-copy for {}", account.name);
                        }
                        !is_self
                    })
                    .cloned()
                    .collect(),
            ),
            Err(e) => {
                log.warn(format!("cannot enumerate local accounts: {}", e), None);
                None
            }
        }
    }

    fn save_menu_entry(
        &mut self,
        config: &ShortcutConfig,
        content: &str,
        all_users: bool,
        mut log: SaveLog,
    ) -> Result<SaveOutcome> {
        let (apps_dir, icons_dir, strategy) = if all_users {
            (
                self.env.system_applications_dir().to_path_buf(),
                self.env.system_icons_dir().to_path_buf(),
                SaveStrategy::SystemMenuEntry,
            )
        } else {
            let apps_dir = self.env.user_applications_dir();
            let icons_dir = self.env.user_icons_dir();
            for dir in [&apps_dir, &icons_dir] {
                if let Err(e) = fs::create_dir_all(dir) {
                    log.warn(format!("failed creating directory: {}", e), Some(dir.as_path()));
                }
            }
            (apps_dir, icons_dir, SaveStrategy::UserMenuEntry)
        };

        self.install_icon(config, &icons_dir, &mut log);

        let entry =
            entry_file::write_unique_entry(&apps_dir, &config.name, NameStyle::Verbatim, content)?;
        self.register_file(&mut log, &entry);

        Ok(log.finish(strategy, entry))
    }

    /// Copy an icon file next to the menu entries. Theme icon names are left
    /// for the icon theme to resolve.
    fn install_icon(&mut self, config: &ShortcutConfig, icons_dir: &Path, log: &mut SaveLog) {
        if config.icon.is_empty() {
            return;
        }

        let icon = Path::new(&config.icon);
        if !icon.is_absolute() {
            debug!("Icon {} is a theme icon name, not copying", config.icon);
            return;
        }
        let Some(file_name) = icon.file_name() else {
            log.warn(format!("icon path {} has no file name", config.icon), None);
            return;
        };

        let dest = icons_dir.join(file_name);
        match fs::copy(icon, &dest) {
            Ok(_) => self.register_file(log, &dest),
            Err(e) => log.warn(
                format!("could not copy {} to {}: {}", icon.display(), dest.display(), e),
                Some(dest.as_path()),
            ),
        }
    }
}
