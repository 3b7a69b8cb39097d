use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::Coordinates;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// proxy_url = "http://localhost:3000"
///
/// [home]
/// lat = 51.5074
/// lon = -0.1278
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Base URL of the running `skycast-proxy`.
    pub proxy_url: Option<String>,

    /// Position reported as the device location. Without it the dashboard
    /// starts on the default city.
    pub home: Option<Coordinates>,
}

impl Config {
    /// The configured proxy URL.
    pub fn proxy_url(&self) -> Result<&str> {
        self.proxy_url.as_deref().filter(|u| !u.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No proxy URL configured.\n\
                 Hint: run `skycast configure` and enter the address of skycast-proxy first."
            )
        })
    }

    pub fn set_proxy_url(&mut self, url: String) {
        self.proxy_url = Some(url.trim().trim_end_matches('/').to_string());
    }

    pub fn set_home(&mut self, home: Option<Coordinates>) {
        self.home = home;
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding the persisted dashboard state (history, chat, units).
    pub fn data_dir() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "skycast", "skycast")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
