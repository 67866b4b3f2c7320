mod apps;
mod common;
mod menu;
mod refresh;
mod setup;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::apps::CuratedList;
use crate::apps::commands as app_commands;
use crate::common::config::AppsConfig;
use crate::common::package::{HostProbe, Mode, SystemProbe};
use crate::common::terminal::{SystemTerminal, detect_terminal};
use crate::refresh::ShutdownOutcome;
use crate::setup::SetupCommands;
use crate::ui::prelude::*;

/// Curated application installer for Arch-based systems
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print debug events
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit one JSON object per line instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Use this app list instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    apps_file: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the curated app list
    List,

    /// Show which curated apps are not installed
    Status {
        /// Show installed apps instead
        #[arg(long)]
        installed: bool,
    },

    /// Install apps, or every missing curated app when none are given
    Install {
        apps: Vec<String>,
        /// Wait for the terminal windows to close and report their exit codes
        #[arg(short, long)]
        wait: bool,
    },

    /// Remove apps, or every installed curated app when none are given
    Remove {
        apps: Vec<String>,
        /// Wait for the terminal windows to close and report their exit codes
        #[arg(short, long)]
        wait: bool,
    },

    /// Add an app to the curated list
    Add { name: String },

    /// Drop an app from the curated list
    Drop { name: String },

    /// Show which backend would install each app
    Resolve {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List explicitly installed packages (pacman -Qenq, paru -Qemq)
    Explicit,

    /// System setup helpers
    Setup {
        #[command(subcommand)]
        command: SetupCommands,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Interactive menu (default)
    Menu,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the current settings
    Show,
    /// Set the privilege escalation command, e.g. "sudo" or "pkexec"
    SetElevation { command: String },
    /// Set the curated app list location
    SetAppsFile { path: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    ui::set_debug_mode(cli.debug);
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    ui::init(format, std::io::IsTerminal::is_terminal(&std::io::stdout()));

    match run(cli).await {
        Ok(ShutdownOutcome::Abandoned) => {
            // The blocked refresh thread would otherwise keep the runtime alive
            std::process::exit(0);
        }
        Ok(_) => {}
        Err(e) => {
            emit(
                Level::Error,
                "archapps.error",
                &format!("{} {:#}", char::from(NerdFont::Cross), e),
                None,
            );
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<ShutdownOutcome> {
    let mut config = AppsConfig::load()?;
    let apps_file = config.apps_file_path(cli.apps_file.as_deref())?;
    let probe: Arc<dyn SystemProbe> = Arc::new(HostProbe);
    let launcher = SystemTerminal;

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::List => {
            app_commands::list_apps(&CuratedList::load(&apps_file)?);
        }
        Commands::Status { installed } => {
            let list = CuratedList::load(&apps_file)?;
            app_commands::show_status(probe, &list, installed, config.shutdown_grace()).await?;
        }
        Commands::Install { apps, wait } => {
            let list = CuratedList::load(&apps_file)?;
            app_commands::run_batch(
                probe.as_ref(),
                &launcher,
                config.elevation_prefix()?,
                &list,
                apps,
                Mode::Install,
                wait.then(|| config.poll_interval()),
            )?;
        }
        Commands::Remove { apps, wait } => {
            let list = CuratedList::load(&apps_file)?;
            app_commands::run_batch(
                probe.as_ref(),
                &launcher,
                config.elevation_prefix()?,
                &list,
                apps,
                Mode::Remove,
                wait.then(|| config.poll_interval()),
            )?;
        }
        Commands::Add { name } => {
            let mut list = CuratedList::load(&apps_file)?;
            app_commands::add_app(probe.as_ref(), &mut list, &name)?;
        }
        Commands::Drop { name } => {
            let mut list = CuratedList::load(&apps_file)?;
            app_commands::drop_app(&mut list, &name)?;
        }
        Commands::Resolve { names } => {
            app_commands::resolve_apps(probe.as_ref(), &names);
        }
        Commands::Explicit => {
            app_commands::list_explicit(probe.as_ref());
        }
        Commands::Setup { command } => {
            setup::handle_setup_command(command, &config, probe.as_ref(), &launcher)?;
        }
        Commands::Config { command } => {
            handle_config_command(&mut config, command)?;
        }
        Commands::Menu => {
            return menu::run_menu(&config, apps_file, probe, &launcher).await;
        }
    }

    Ok(ShutdownOutcome::Idle)
}

fn handle_config_command(config: &mut AppsConfig, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let path = AppsConfig::config_file_path()?;
            let apps_file = config.apps_file_path(None)?;
            let terminal = detect_terminal().map(|t| t.program).unwrap_or("none found");
            emit(
                Level::Info,
                "config.show",
                &format!(
                    "{} {}\n  apps file:      {}\n  elevation:      {}\n  poll interval:  {} ms\n  shutdown grace: {} s\n  terminal:       {}",
                    char::from(NerdFont::Gear),
                    path.display(),
                    apps_file.display(),
                    config.elevation,
                    config.poll_interval_ms,
                    config.shutdown_grace_secs,
                    terminal
                ),
                Some(serde_json::json!({
                    "path": path.display().to_string(),
                    "apps_file": apps_file.display().to_string(),
                    "elevation": config.elevation,
                    "poll_interval_ms": config.poll_interval_ms,
                    "shutdown_grace_secs": config.shutdown_grace_secs,
                    "terminal": terminal,
                })),
            );
        }
        ConfigCommands::SetElevation { command } => {
            config.set_elevation(command)?;
            emit(
                Level::Success,
                "config.elevation",
                &format!(
                    "{} Elevation command set to '{}'",
                    char::from(NerdFont::Check),
                    config.elevation
                ),
                None,
            );
        }
        ConfigCommands::SetAppsFile { path } => {
            config.set_apps_file(path)?;
            emit(
                Level::Success,
                "config.apps_file",
                &format!(
                    "{} App list set to {}",
                    char::from(NerdFont::Check),
                    config.apps_file_path(None)?.display()
                ),
                None,
            );
        }
    }
    Ok(())
}
