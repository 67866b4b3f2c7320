//! Interactive menu
//!
//! A small dialoguer front-end over the curated list. Install-state checks run
//! on the refresh coordinator so the prompt thread never runs pacman itself.

mod navigator;
mod selection;

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, MultiSelect, Password, Select};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::apps::commands as app_commands;
use crate::apps::{CatalogError, CuratedList};
use crate::common::config::AppsConfig;
use crate::common::package::{DispatchReport, Dispatcher, InstallPlan, Mode, SystemProbe};
use crate::common::progress::create_spinner;
use crate::common::terminal::TerminalLauncher;
use crate::refresh::{RefreshCoordinator, RefreshUpdate, RefreshView, ShutdownOutcome};
use crate::setup::{SetupCommands, handle_setup_command};
use crate::ui::prelude::*;
use navigator::{Navigator, Screen};
use selection::Selection;

const MAIN_ENTRIES: &[(&str, Screen)] = &[
    ("Install apps", Screen::Installer),
    ("Remove apps", Screen::Uninstaller),
    ("Edit app list", Screen::Editor),
    ("System setup", Screen::Setup),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetupAction {
    AurHelper,
    GpuDrivers,
    NetworkShare,
}

const SETUP_ENTRIES: &[(&str, SetupAction)] = &[
    ("Install AUR helper (paru)", SetupAction::AurHelper),
    ("Install GPU drivers", SetupAction::GpuDrivers),
    ("Add network share", SetupAction::NetworkShare),
];

struct MenuState<'a> {
    config: &'a AppsConfig,
    elevation: Vec<String>,
    list: CuratedList,
    probe: Arc<dyn SystemProbe>,
    launcher: &'a dyn TerminalLauncher,
    refresh: RefreshCoordinator,
    updates: UnboundedReceiver<RefreshUpdate>,
    nav: Navigator,
}

/// Run the interactive menu until the user quits, then stop the refresh
/// worker within the configured grace period.
pub async fn run_menu(
    config: &AppsConfig,
    apps_file: PathBuf,
    probe: Arc<dyn SystemProbe>,
    launcher: &dyn TerminalLauncher,
) -> Result<ShutdownOutcome> {
    let (refresh, updates) = RefreshCoordinator::new(Arc::clone(&probe));
    let mut state = MenuState {
        config,
        elevation: config.elevation_prefix()?,
        list: CuratedList::load(apps_file)?,
        probe,
        launcher,
        refresh,
        updates,
        nav: Navigator::new(Screen::Main),
    };

    let result = state.run().await;
    if state.refresh.is_running() {
        emit(
            Level::Debug,
            "menu.shutdown.waiting",
            "Waiting for the running refresh to stop",
            None,
        );
    }
    let outcome = state.refresh.shutdown(config.shutdown_grace()).await;
    result.map(|_| outcome)
}

impl MenuState<'_> {
    async fn run(&mut self) -> Result<()> {
        while let Some(screen) = self.nav.current() {
            match screen {
                Screen::Main => self.main_screen()?,
                Screen::Installer => {
                    self.pick_and_dispatch(RefreshView::Missing).await?;
                    self.nav.close();
                }
                Screen::Uninstaller => {
                    self.pick_and_dispatch(RefreshView::Installed).await?;
                    self.nav.close();
                }
                Screen::Editor => self.editor_screen()?,
                Screen::Setup => self.setup_screen()?,
            }
        }
        Ok(())
    }

    fn main_screen(&mut self) -> Result<()> {
        let mut labels: Vec<&str> = MAIN_ENTRIES.iter().map(|(label, _)| *label).collect();
        labels.push("Quit");

        let choice = Select::new()
            .with_prompt(format!(
                "{} ({} apps in {})",
                Screen::Main.title(),
                self.list.len(),
                self.list.path().display()
            ))
            .items(&labels)
            .default(0)
            .interact_opt()
            .context("Failed to show selection dialog")?;

        match choice.and_then(|index| MAIN_ENTRIES.get(index)) {
            Some((_, screen)) => self.nav.show(*screen),
            None => {
                self.nav.close();
            }
        }
        Ok(())
    }

    async fn pick_and_dispatch(&mut self, view: RefreshView) -> Result<()> {
        let mode = match view {
            RefreshView::Missing => Mode::Install,
            RefreshView::Installed => Mode::Remove,
        };

        let pb = create_spinner("Checking which apps are installed...".to_string());
        let update = self
            .refresh
            .refresh_now(&mut self.updates, self.list.names(), view)
            .await;
        pb.finish_and_clear();

        let apps = update.map(|update| update.apps).unwrap_or_default();
        if apps.is_empty() {
            match view {
                RefreshView::Missing => emit(
                    Level::Success,
                    "menu.installer.empty",
                    &format!("{} All apps installed!", char::from(NerdFont::Check)),
                    None,
                ),
                RefreshView::Installed => emit(
                    Level::Info,
                    "menu.uninstaller.empty",
                    &format!("{} No apps to remove.", char::from(NerdFont::Info)),
                    None,
                ),
            }
            return Ok(());
        }

        let prompt = match mode {
            Mode::Install => Screen::Installer.title(),
            Mode::Remove => Screen::Uninstaller.title(),
        };
        let Some(chosen) = choose_apps(prompt, apps)? else {
            return Ok(());
        };
        if chosen.is_empty() {
            return Ok(());
        }

        let dispatcher = Dispatcher::new(
            self.probe.as_ref(),
            self.launcher,
            self.elevation.clone(),
        );
        let plan = dispatcher.plan(&chosen, mode);
        if plan.is_empty() {
            // Nothing to launch; execute still reports the dropped apps
            launch_or_report(&dispatcher, plan);
            return Ok(());
        }

        if mode == Mode::Install {
            app_commands::warn_conflicts(&self.list, &chosen);
        }

        if !Confirm::new()
            .with_prompt(format!(
                "{}Continue with {} app(s)?",
                plan.summary(),
                plan.app_count()
            ))
            .default(true)
            .interact()?
        {
            return Ok(());
        }

        launch_or_report(&dispatcher, plan);
        Ok(())
    }

    fn editor_screen(&mut self) -> Result<()> {
        let choice = Select::new()
            .with_prompt(Screen::Editor.title())
            .items(&["Add an app", "Remove an app from the list", "Back"])
            .default(0)
            .interact_opt()
            .context("Failed to show selection dialog")?;

        match choice {
            Some(0) => {
                let name: String = Input::new()
                    .with_prompt("Package name")
                    .interact_text()
                    .context("reading package name")?;
                self.add_app(&name)?;
            }
            Some(1) => {
                let names = self.list.names();
                if names.is_empty() {
                    emit(
                        Level::Info,
                        "menu.editor.empty",
                        &format!("{} The app list is empty", char::from(NerdFont::Info)),
                        None,
                    );
                    return Ok(());
                }
                let picked = Select::new()
                    .with_prompt("Remove which app?")
                    .items(&names)
                    .interact_opt()
                    .context("Failed to show selection dialog")?;
                if let Some(index) = picked {
                    self.drop_app(&names[index])?;
                }
            }
            _ => {
                self.nav.close();
            }
        }
        Ok(())
    }

    fn add_app(&mut self, name: &str) -> Result<()> {
        match self.list.add_app(self.probe.as_ref(), name) {
            Ok(record) => emit(
                Level::Success,
                "menu.editor.added",
                &format!(
                    "{} Added {} ({})",
                    char::from(NerdFont::Check),
                    record.name,
                    record.source.display_name()
                ),
                None,
            ),
            Err(CatalogError::Io(err)) => return Err(err),
            Err(err) => emit(
                Level::Warn,
                "menu.editor.rejected",
                &format!("{} {}", char::from(NerdFont::Warning), err),
                None,
            ),
        }
        Ok(())
    }

    fn drop_app(&mut self, name: &str) -> Result<()> {
        match self.list.drop_app(name) {
            Ok(record) => emit(
                Level::Success,
                "menu.editor.dropped",
                &format!("{} Removed {} from the list", char::from(NerdFont::Trash), record.name),
                None,
            ),
            Err(CatalogError::Io(err)) => return Err(err),
            Err(err) => emit(
                Level::Warn,
                "menu.editor.rejected",
                &format!("{} {}", char::from(NerdFont::Warning), err),
                None,
            ),
        }
        Ok(())
    }

    fn setup_screen(&mut self) -> Result<()> {
        let mut labels: Vec<&str> = SETUP_ENTRIES.iter().map(|(label, _)| *label).collect();
        labels.push("Back");

        let choice = Select::new()
            .with_prompt(Screen::Setup.title())
            .items(&labels)
            .default(0)
            .interact_opt()
            .context("Failed to show selection dialog")?;

        let Some((_, action)) = choice.and_then(|index| SETUP_ENTRIES.get(index)) else {
            self.nav.close();
            return Ok(());
        };
        let command = match action {
            SetupAction::AurHelper => SetupCommands::AurHelper,
            SetupAction::GpuDrivers => SetupCommands::GpuDrivers { yes: false },
            SetupAction::NetworkShare => prompt_network_share()?,
        };

        // A failed setup step is reported and the menu stays open
        if let Err(err) =
            handle_setup_command(command, self.config, self.probe.as_ref(), self.launcher)
        {
            emit(
                Level::Error,
                "menu.setup.failed",
                &format!("{} {:#}", char::from(NerdFont::Cross), err),
                None,
            );
        }
        Ok(())
    }
}

/// Launch `plan`, reporting a launch failure instead of returning it so the
/// menu stays open
fn launch_or_report(dispatcher: &Dispatcher<'_>, plan: InstallPlan) -> Option<DispatchReport> {
    match dispatcher.execute(plan) {
        Ok(report) => Some(report),
        Err(err) => {
            emit(
                Level::Error,
                "menu.dispatch.failed",
                &format!("{} {}", char::from(NerdFont::Cross), err),
                None,
            );
            None
        }
    }
}

fn prompt_network_share() -> Result<SetupCommands> {
    let share: String = Input::new()
        .with_prompt("Share (e.g. 192.168.1.10/backup)")
        .interact_text()
        .context("reading the share")?;
    let mount_point: String = Input::new()
        .with_prompt("Mount point")
        .default("/mnt/share".to_string())
        .interact_text()
        .context("reading the mount point")?;
    let user: String = Input::new()
        .with_prompt("User name")
        .interact_text()
        .context("reading the user name")?;
    let password = Password::new()
        .with_prompt(format!("Password for {}", user))
        .interact()
        .context("reading the share password")?;

    Ok(SetupCommands::NetworkShare {
        share,
        mount_point: PathBuf::from(mount_point),
        user,
        password: Some(password),
    })
}

/// Multi-select over `apps` with a leading select-all toggle. Returns `None`
/// when the prompt is cancelled.
fn choose_apps(prompt: &str, apps: Vec<String>) -> Result<Option<Vec<String>>> {
    let mut selection = Selection::new(apps);

    loop {
        let toggle = if selection.all_checked() {
            "[ Select none ]"
        } else {
            "[ Select all ]"
        };
        let mut labels = vec![toggle.to_string()];
        labels.extend(selection.items().iter().cloned());
        let mut defaults = vec![false];
        defaults.extend_from_slice(selection.checked());

        let Some(picked) = MultiSelect::new()
            .with_prompt(format!("{} (space to toggle, enter to confirm)", prompt))
            .items(&labels)
            .defaults(&defaults)
            .interact_opt()
            .context("Failed to show selection dialog")?
        else {
            return Ok(None);
        };

        let indices: Vec<usize> = picked
            .iter()
            .filter(|index| **index > 0)
            .map(|index| index - 1)
            .collect();
        selection.set_checked(&indices);

        if picked.contains(&0) {
            selection.toggle_all();
            continue;
        }
        return Ok(Some(selection.selected()));
    }
}
