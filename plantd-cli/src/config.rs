///! CLI configuration management

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_server: String,
    pub default_output: String,
    /// Request timeout in seconds
    pub timeout: u64,
    pub default_namespace: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_server: "http://localhost:5000".to_string(),
            default_output: "table".to_string(),
            timeout: 30,
            default_namespace: None,
            log_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Sets one key by its TOML name
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let optional = |v: &str| (!v.is_empty()).then(|| v.to_string());
        match key {
            "default_server" => self.default_server = value.to_string(),
            "default_output" => self.default_output = value.to_string(),
            "timeout" => self.timeout = value.parse()?,
            "default_namespace" => self.default_namespace = optional(value),
            "log_dir" => self.log_dir = optional(value).map(PathBuf::from),
            _ => bail!(
                "Unknown config key '{}' (expected default_server, default_output, timeout, default_namespace or log_dir)",
                key
            ),
        }
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")?;
        Ok(PathBuf::from(home).join(".config/plantd/cli.toml"))
    }
}
