//! CLI configuration management.
//!
//! Precedence, lowest first: defaults, the JSON config file, environment
//! variables (a `.env` file is honored), then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use elemgraph_naming::NamingConfig;

/// Application-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace root holding the `.self/index` stores.
    pub store_dir: PathBuf,

    /// Naming configuration file used when `--naming` is not given.
    pub naming_config: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("."),
            naming_config: None,
        }
    }
}

impl Config {
    /// Load configuration from the config file and environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if missing)
        let _ = dotenvy::dotenv();

        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        if let Ok(store_dir) = std::env::var("EG_STORE_DIR") {
            config.store_dir = PathBuf::from(store_dir);
        }
        if let Ok(naming) = std::env::var("EG_NAMING_CONFIG") {
            config.naming_config = Some(PathBuf::from(naming));
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save current configuration to the config file.
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::config_file_path() {
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
            let contents = serde_json::to_string_pretty(self)?;
            std::fs::write(&config_path, contents)
                .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
        }
        Ok(())
    }

    /// Get the path to the config file.
    pub fn config_file_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "elemgraph", "eg")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Naming configuration from `override_path`, the configured file, or defaults.
    pub fn naming(&self, override_path: Option<&Path>) -> Result<NamingConfig> {
        match override_path.or(self.naming_config.as_deref()) {
            Some(path) => NamingConfig::load(path)
                .with_context(|| format!("Failed to load naming config {}", path.display())),
            None => Ok(NamingConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "naming_config": "naming.json" }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.store_dir, PathBuf::from("."));
        assert_eq!(config.naming_config, Some(PathBuf::from("naming.json")));
    }

    #[test]
    fn test_naming_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("naming.json");
        std::fs::write(&path, r#"{ "types": { "book": { "idFields": ["&parent"] } } }"#).unwrap();

        let config = Config {
            naming_config: Some(dir.path().join("missing.json")),
            ..Config::default()
        };
        let naming = config.naming(Some(&path)).unwrap();
        assert!(naming.is_nameable("book"));
        assert!(config.naming(None).is_err());
    }
}
