//! Setup command implementations
//!
//! Handles the `archapps setup` command and its subcommands.

use anyhow::{Context, Result};
use clap::Subcommand;
use dialoguer::{Confirm, Password};
use std::path::PathBuf;

use super::aur::bootstrap_aur_helper;
use super::gpu::{detect_gpu_vendor, install_gpu_drivers};
use super::samba::{NetworkShare, add_network_share};
use crate::common::config::AppsConfig;
use crate::common::package::SystemProbe;
use crate::common::terminal::TerminalLauncher;
use crate::ui::prelude::*;

#[derive(Subcommand, Debug, Clone)]
pub enum SetupCommands {
    /// Build and install the paru AUR helper if it is missing
    AurHelper,

    /// Detect the GPU vendor and install its driver packages
    GpuDrivers {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Mount a Samba share at boot through /etc/fstab
    ///
    /// The username and password are stored in ~/.smbcredentials with
    /// permissions 0600.
    NetworkShare {
        /// Share to mount, e.g. 192.168.1.10/backup or //server/share
        share: String,
        /// Local directory to mount it on
        mount_point: PathBuf,
        /// Samba user name
        #[arg(short, long)]
        user: String,
        /// Samba password, prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
}

/// Handle setup command dispatch
pub fn handle_setup_command(
    command: SetupCommands,
    config: &AppsConfig,
    probe: &dyn SystemProbe,
    launcher: &dyn TerminalLauncher,
) -> Result<()> {
    let elevation = config.elevation_prefix()?;

    match command {
        SetupCommands::AurHelper => {
            bootstrap_aur_helper(probe, launcher, &elevation, config.poll_interval())?;
        }
        SetupCommands::GpuDrivers { yes } => {
            let Some(vendor) = detect_gpu_vendor() else {
                emit(
                    Level::Warn,
                    "setup.gpu.unknown",
                    &format!(
                        "{} GPU vendor not recognized, no drivers installed",
                        char::from(NerdFont::Warning)
                    ),
                    None,
                );
                return Ok(());
            };

            emit(
                Level::Info,
                "setup.gpu.detected",
                &format!(
                    "{} Detected {} GPU: {}",
                    char::from(NerdFont::Cpu),
                    vendor.name(),
                    vendor.driver_packages().join(" ")
                ),
                None,
            );

            if !yes
                && !Confirm::new()
                    .with_prompt(format!("Install {} drivers?", vendor.name()))
                    .default(true)
                    .interact()?
            {
                return Ok(());
            }
            install_gpu_drivers(launcher, vendor, &elevation)?;
        }
        SetupCommands::NetworkShare {
            share,
            mount_point,
            user,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => Password::new()
                    .with_prompt(format!("Password for {}", user))
                    .interact()
                    .context("reading the share password")?,
            };
            let share = NetworkShare {
                share,
                mount_point,
                username: user,
                password,
            };
            add_network_share(&share, &elevation)?;
        }
    }

    Ok(())
}
