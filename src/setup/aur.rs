use anyhow::{Context, Result, bail};
use serde_json::json;
use std::time::Duration;
use sudo::RunningAs;

use crate::common::package::{BackendKind, SystemProbe};
use crate::common::shell::join_command;
use crate::common::terminal::{LaunchCommand, ProcessExit, TerminalLauncher};
use crate::ui::prelude::*;

const PARU_REPO: &str = "https://aur.archlinux.org/paru.git";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    AlreadyInstalled,
    Finished(ProcessExit),
}

/// Shell script that builds the AUR helper from its AUR git repository
pub fn bootstrap_script(elevation: &[String]) -> String {
    let elevate = join_command(elevation);
    let prefix = if elevate.is_empty() {
        String::new()
    } else {
        format!("{} ", elevate)
    };
    format!(
        "{prefix}pacman -S --needed --noconfirm base-devel git && tmp=$(mktemp -d) && \
         git clone {PARU_REPO} \"$tmp\" && cd \"$tmp\" && makepkg -si --noconfirm && \
         cd / && rm -rf \"$tmp\""
    )
}

/// Install the AUR helper if it is missing and wait for the build terminal
/// to close.
pub fn bootstrap_aur_helper(
    probe: &dyn SystemProbe,
    launcher: &dyn TerminalLauncher,
    elevation: &[String],
    poll_interval: Duration,
) -> Result<BootstrapOutcome> {
    let Some(helper) = BackendKind::AurHelper.program() else {
        bail!("no AUR helper is configured");
    };

    if probe.backend_present(helper) {
        emit(
            Level::Info,
            "setup.aur.present",
            &format!("{} {} is already installed", char::from(NerdFont::Check), helper),
            None,
        );
        return Ok(BootstrapOutcome::AlreadyInstalled);
    }

    if matches!(sudo::check(), RunningAs::Root) {
        bail!("makepkg refuses to run as root; run this as your regular user");
    }

    run_bootstrap(launcher, helper, elevation, poll_interval)
}

fn run_bootstrap(
    launcher: &dyn TerminalLauncher,
    helper: &str,
    elevation: &[String],
    poll_interval: Duration,
) -> Result<BootstrapOutcome> {
    let command = LaunchCommand::Shell(bootstrap_script(elevation));
    let mut handle = launcher
        .launch(&command)
        .with_context(|| format!("opening a terminal to build {}", helper))?;

    emit(
        Level::Info,
        "setup.aur.started",
        &format!(
            "{} Building {} in {}, waiting for it to finish...",
            char::from(NerdFont::Download),
            helper,
            handle.terminal()
        ),
        Some(json!({ "terminal": handle.terminal(), "pid": handle.pid() })),
    );

    let exit = handle
        .poll_until_exit(poll_interval)
        .context("waiting for the AUR helper build")?;

    if !exit.success() {
        emit(
            Level::Error,
            "setup.aur.failed",
            &format!(
                "{} {} build exited with {}",
                char::from(NerdFont::Cross),
                helper,
                exit.code
                    .map(|code| format!("code {}", code))
                    .unwrap_or_else(|| "a signal".to_string())
            ),
            Some(json!({ "code": exit.code })),
        );
        bail!("Failed to install {}", helper);
    }

    emit(
        Level::Success,
        "setup.aur.done",
        &format!("{} {} installed", char::from(NerdFont::Check), helper),
        None,
    );
    Ok(BootstrapOutcome::Finished(exit))
}
