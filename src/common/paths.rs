use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the archapps config directory, creating it if needed
pub fn archapps_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("archapps");

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating config directory at {}", config_dir.display()))?;

    Ok(config_dir)
}

/// Default location of the curated app list
pub fn default_apps_file() -> Result<PathBuf> {
    Ok(archapps_config_dir()?.join("apps.yaml"))
}

/// Location of the Samba credentials file written by `setup network-share`
pub fn smb_credentials_file() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Unable to determine home directory")?
        .join(".smbcredentials"))
}
