use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// An isolated HOME and config directory for one test
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        fs::create_dir_all(temp_dir.path().join("home"))?;
        fs::create_dir_all(temp_dir.path().join("config"))?;
        Ok(Self { temp_dir })
    }

    pub fn home(&self) -> PathBuf {
        self.temp_dir.path().join("home")
    }

    pub fn config_home(&self) -> PathBuf {
        self.temp_dir.path().join("config")
    }

    pub fn apps_file(&self) -> PathBuf {
        self.temp_dir.path().join("apps.yaml")
    }

    pub fn write_apps(&self, yaml: &str) -> Result<PathBuf> {
        let path = self.apps_file();
        fs::write(&path, yaml)?;
        Ok(path)
    }

    /// Run the archapps binary with HOME and XDG_CONFIG_HOME pointed at the
    /// temp directory and an empty PATH, so no package manager or terminal
    /// is ever found
    pub fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(env!("CARGO_BIN_EXE_archapps"))
            .args(args)
            .env("HOME", self.home())
            .env("XDG_CONFIG_HOME", self.config_home())
            .env("PATH", self.temp_dir.path().join("empty-path"))
            .env("NO_COLOR", "1")
            .output()?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    pub fn run_with_apps(&self, args: &[&str]) -> Result<CommandOutput> {
        let apps = path_str(&self.apps_file());
        let mut full = vec!["--apps-file", apps.as_str()];
        full.extend_from_slice(args);
        self.run(&full)
    }
}

pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Parse line-oriented JSON output
pub fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}
