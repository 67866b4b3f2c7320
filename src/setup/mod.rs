//! One-off system setup steps offered next to the app list
//!
//! Each step either launches a terminal (AUR helper bootstrap, GPU drivers)
//! or runs a short elevated helper (network shares).

mod aur;
mod commands;
mod gpu;
mod samba;

pub use commands::{SetupCommands, handle_setup_command};
