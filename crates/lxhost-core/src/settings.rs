use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Host-wide defaults, stored as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostSettings {
    #[serde(default)]
    pub use_sudo: bool,
    /// Directory holding one subdirectory per container.
    #[serde(default = "default_lxc_path")]
    pub lxc_path: String,
    /// Directory holding `lxc.conf` and per-container config files.
    #[serde(default = "default_config_dir")]
    pub config_dir: String,
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            use_sudo: false,
            lxc_path: default_lxc_path(),
            config_dir: default_config_dir(),
            wait_timeout_secs: default_wait_timeout(),
        }
    }
}

fn default_lxc_path() -> String {
    "/var/lib/lxc".to_owned()
}

fn default_config_dir() -> String {
    "/etc/lxc".to_owned()
}

fn default_wait_timeout() -> u64 {
    60
}

impl HostSettings {
    #[must_use]
    pub fn with_sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }

    /// Load `~/.config/lxhost/settings.json`, or defaults when it is absent.
    pub fn load_default() -> Result<Self, CoreError> {
        let path = default_settings_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CoreError::Settings(format!("invalid settings {}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Settings(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn host_config_path(&self) -> String {
        format!("{}/lxc.conf", self.config_dir.trim_end_matches('/'))
    }

    pub fn container_config_path(&self, name: &str) -> String {
        format!("{}/{name}", self.config_dir.trim_end_matches('/'))
    }

    pub fn container_root(&self, name: &str) -> String {
        format!("{}/{name}", self.lxc_path.trim_end_matches('/'))
    }
}

pub fn default_settings_path() -> Result<PathBuf, CoreError> {
    let home =
        std::env::var("HOME").map_err(|_| CoreError::Settings("HOME not set".to_owned()))?;
    Ok(PathBuf::from(home).join(".config/lxhost/settings.json"))
}
