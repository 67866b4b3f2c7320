use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};

use crate::common::paths;

fn default_elevation() -> String {
    "pkexec".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_shutdown_grace_secs() -> u64 {
    3
}

/// User settings stored in `~/.config/archapps/config.toml`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppsConfig {
    /// Curated app list location; `~` is expanded
    pub apps_file: Option<String>,
    /// Privilege escalation command prefixed to official repo operations
    #[serde(default = "default_elevation")]
    pub elevation: String,
    /// Sleep between polls of a supervised terminal process
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long shutdown waits for an in-flight refresh
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for AppsConfig {
    fn default() -> Self {
        Self {
            apps_file: None,
            elevation: default_elevation(),
            poll_interval_ms: default_poll_interval_ms(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl AppsConfig {
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(paths::archapps_config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let cfg_path = Self::config_file_path()?;
        if !cfg_path.exists() {
            return Ok(Self::default());
        }

        let s = fs::read_to_string(&cfg_path)
            .with_context(|| format!("reading config {}", cfg_path.display()))?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing config toml")
    }

    pub fn save(&self) -> Result<()> {
        let cfg_path = Self::config_file_path()?;
        if let Some(parent) = cfg_path.parent() {
            fs::create_dir_all(parent).context("creating config directory")?;
        }

        let toml = toml::to_string_pretty(self).context("serializing config to toml")?;
        fs::write(&cfg_path, toml).context("writing config file")?;
        Ok(())
    }

    /// Resolve the curated list path, honouring an explicit override first
    pub fn apps_file_path(&self, override_path: Option<&str>) -> Result<PathBuf> {
        match override_path.or(self.apps_file.as_deref()) {
            Some(path) => Ok(PathBuf::from(shellexpand::tilde(path).into_owned())),
            None => paths::default_apps_file(),
        }
    }

    /// The elevation prefix split into words, e.g. `sudo -A` -> `["sudo", "-A"]`
    pub fn elevation_prefix(&self) -> Result<Vec<String>> {
        let words = shell_words::split(&self.elevation)
            .with_context(|| format!("parsing elevation command '{}'", self.elevation))?;
        if words.is_empty() {
            anyhow::bail!("elevation command must not be empty");
        }
        Ok(words)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn set_elevation(&mut self, elevation: String) -> Result<()> {
        self.elevation = elevation;
        self.elevation_prefix()?;
        self.save()
    }

    pub fn set_apps_file(&mut self, path: String) -> Result<()> {
        self.apps_file = Some(path);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = AppsConfig::from_toml("").unwrap();
        assert_eq!(config, AppsConfig::default());
        assert_eq!(config.elevation, "pkexec");
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = AppsConfig::from_toml("elevation = \"sudo -A\"\n").unwrap();
        assert_eq!(config.elevation_prefix().unwrap(), vec!["sudo", "-A"]);
        assert_eq!(config.poll_interval_ms, 1000);
    }

    #[test]
    fn test_blank_elevation_is_rejected() {
        let config = AppsConfig {
            elevation: "   ".to_string(),
            ..AppsConfig::default()
        };
        assert!(config.elevation_prefix().is_err());
    }

    #[test]
    fn test_override_wins_over_configured_path() {
        let config = AppsConfig {
            apps_file: Some("/srv/apps.yaml".to_string()),
            ..AppsConfig::default()
        };
        assert_eq!(
            config.apps_file_path(Some("/tmp/other.yaml")).unwrap(),
            PathBuf::from("/tmp/other.yaml")
        );
        assert_eq!(
            config.apps_file_path(None).unwrap(),
            PathBuf::from("/srv/apps.yaml")
        );
    }

    #[test]
    fn test_tilde_is_expanded() {
        let config = AppsConfig {
            apps_file: Some("~/apps.yaml".to_string()),
            ..AppsConfig::default()
        };
        let path = config.apps_file_path(None).unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with("apps.yaml"));
    }

    #[test]
    fn test_poll_interval_has_floor() {
        let config = AppsConfig {
            poll_interval_ms: 0,
            ..AppsConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
    }
}
