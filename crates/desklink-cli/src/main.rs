//! Desklink - creates desktop icons and menu entries from an install manifest.

mod manifest;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use desklink_core::{
    CommandSet, DesktopTemplate, DirectoryResources, HostEnvironment, PathLocator,
    ShortcutSession, UninstallRecord, UserScope,
};
use manifest::Manifest;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "desklink")]
#[command(about = "Create desktop shortcuts for installed applications")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create every shortcut of a manifest and record how to remove them
    Install {
        #[arg(long)]
        manifest: PathBuf,

        /// Uninstall record to write (extended if it exists)
        #[arg(long)]
        record: PathBuf,
    },

    /// Remove everything listed in an uninstall record
    Uninstall {
        #[arg(long)]
        record: PathBuf,
    },

    /// List the program groups shortcuts can be placed in
    Groups {
        #[arg(long)]
        all_users: bool,
    },

    /// Print the rendered entries of a manifest without writing anything
    Render {
        #[arg(long)]
        manifest: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so that stdout stays machine readable.
    let log_level = if args.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    match args.command {
        Command::Install { manifest, record } => install(&manifest, &record, args.json),
        Command::Uninstall { record } => uninstall(&record, args.json),
        Command::Groups { all_users } => groups(all_users, args.json),
        Command::Render { manifest } => render(&manifest),
    }
}

#[derive(Serialize)]
struct InstallSummary {
    outcomes: Vec<desklink_core::SaveOutcome>,
    failed: Vec<String>,
    post_action: desklink_core::PostActionReport,
}

fn install(manifest_path: &Path, record_path: &Path, json: bool) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let env = manifest.configure(
        HostEnvironment::detect(&manifest.install_root)
            .context("Failed to detect host environment")?,
    );
    info!("Installing shortcuts for {}", manifest.install_root.display());

    let mut record = if record_path.exists() {
        UninstallRecord::load(record_path).context("Failed to load existing uninstall record")?
    } else {
        UninstallRecord::new()
    };

    let summary = {
        let mut session = ShortcutSession::new(env, &PathLocator, &mut record);
        if let Some(dir) = &manifest.resource_dir {
            session = session.with_resources(DirectoryResources::new(dir));
        }

        let mut outcomes = Vec::new();
        let mut failed = Vec::new();
        for shortcut in manifest.shortcuts() {
            match session.save(&shortcut) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!("Failed to create shortcut {}: {}", shortcut.name, e);
                    failed.push(shortcut.name.clone());
                }
            }
        }

        InstallSummary {
            outcomes,
            failed,
            post_action: session.post_action(),
        }
    };

    record
        .save(record_path)
        .context("Failed to write uninstall record")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for outcome in &summary.outcomes {
            println!("{}\t{}", outcome.shortcut, outcome.entry_path.display());
            for warning in &outcome.warnings {
                println!("  warning: {}", warning.message);
            }
        }
        for failure in &summary.post_action.failures {
            println!("post-install: {}", failure);
        }
    }

    if !summary.failed.is_empty() {
        bail!(
            "{} of {} shortcuts could not be created",
            summary.failed.len(),
            summary.failed.len() + summary.outcomes.len()
        );
    }
    Ok(())
}

fn uninstall(record_path: &Path, json: bool) -> Result<()> {
    let record = UninstallRecord::load(record_path).context("Failed to load uninstall record")?;
    let commands = CommandSet::resolve(&PathLocator);

    let report = record.uninstall(&commands.shell, &std::env::temp_dir());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for path in &report.removed {
            println!("removed\t{}", path.display());
        }
        for failure in &report.failures {
            println!("failed\t{}", failure);
        }
    }

    if !report.failures.is_empty() {
        bail!("Uninstall finished with {} failures", report.failures.len());
    }
    Ok(())
}

fn groups(all_users: bool, json: bool) -> Result<()> {
    let scope = if all_users {
        UserScope::AllUsers
    } else {
        UserScope::CurrentUser
    };
    let env = HostEnvironment::detect(std::env::current_dir()?)
        .context("Failed to detect host environment")?;
    let session = ShortcutSession::new(env, &PathLocator, UninstallRecord::new());

    let groups = session.program_groups(scope);
    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
    } else {
        for group in groups {
            println!("{}", group);
        }
    }
    Ok(())
}

fn render(manifest_path: &Path) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let env = manifest.configure(
        HostEnvironment::detect(&manifest.install_root)
            .context("Failed to detect host environment")?,
    );
    let template = DesktopTemplate::new(env.language());

    for shortcut in manifest.shortcuts() {
        shortcut
            .validate()
            .with_context(|| format!("Invalid shortcut {}", shortcut.name))?;
        println!("# {}", shortcut.name);
        println!("{}", template.render(&shortcut.to_properties()));
    }
    Ok(())
}
