use anyhow::{Context, Result};
use duct::cmd;
use serde::Serialize;
use serde_json::json;

use crate::common::terminal::{LaunchCommand, ProcessHandle, TerminalLauncher};
use crate::ui::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GpuVendor {
    Intel,
    Nvidia,
    Amd,
}

impl GpuVendor {
    pub fn driver_packages(&self) -> &'static [&'static str] {
        match self {
            GpuVendor::Intel => &[
                "mesa",
                "lib32-mesa",
                "vulkan-intel",
                "lib32-vulkan-intel",
                "xf86-video-intel",
            ],
            GpuVendor::Nvidia => &["nvidia", "nvidia-utils", "lib32-nvidia-utils"],
            GpuVendor::Amd => &[
                "mesa",
                "lib32-mesa",
                "vulkan-radeon",
                "lib32-vulkan-radeon",
                "xf86-video-amdgpu",
            ],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GpuVendor::Intel => "Intel",
            GpuVendor::Nvidia => "NVIDIA",
            GpuVendor::Amd => "AMD",
        }
    }

    /// Command line installing this vendor's drivers
    pub fn install_command(&self, elevation: &[String]) -> Vec<String> {
        let mut argv: Vec<String> = elevation.to_vec();
        argv.extend(["pacman", "-S", "--needed"].map(String::from));
        argv.extend(self.driver_packages().iter().map(|pkg| pkg.to_string()));
        argv
    }
}

/// Vendor of the first VGA controller in `lspci -v` output
pub fn parse_lspci(output: &str) -> Option<GpuVendor> {
    output
        .lines()
        .filter(|line| line.contains("VGA compatible controller"))
        .find_map(|line| {
            if line.contains("Intel") {
                Some(GpuVendor::Intel)
            } else if line.contains("NVIDIA") {
                Some(GpuVendor::Nvidia)
            } else if line.contains("AMD") {
                Some(GpuVendor::Amd)
            } else {
                None
            }
        })
}

/// Detect the GPU vendor; `None` when lspci is missing or nothing matches
pub fn detect_gpu_vendor() -> Option<GpuVendor> {
    match cmd!("lspci", "-v").stderr_null().read() {
        Ok(output) => parse_lspci(&output),
        Err(err) => {
            emit(
                Level::Debug,
                "setup.gpu.lspci_failed",
                &format!("lspci failed: {}", err),
                None,
            );
            None
        }
    }
}

/// Open a terminal that installs the drivers for `vendor`
pub fn install_gpu_drivers(
    launcher: &dyn TerminalLauncher,
    vendor: GpuVendor,
    elevation: &[String],
) -> Result<ProcessHandle> {
    let command = LaunchCommand::Argv(vendor.install_command(elevation));
    let handle = launcher
        .launch(&command)
        .context("opening a terminal for the driver install")?;

    emit(
        Level::Info,
        "setup.gpu.launched",
        &format!(
            "{} Installing {} drivers in {}",
            char::from(NerdFont::Cpu),
            vendor.name(),
            handle.terminal()
        ),
        Some(json!({
            "vendor": vendor,
            "packages": vendor.driver_packages(),
        })),
    );
    Ok(handle)
}
