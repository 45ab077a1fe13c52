//! Config command implementation.
//!
//! Manages CLI configuration.

use anyhow::Result;

use crate::config::Config;

/// Show current configuration.
pub fn show(config: &Config) -> Result<()> {
    println!("elemgraph CLI Configuration");
    println!("{:-<40}", "");
    println!("Store Directory:     {}", config.store_dir.display());
    println!(
        "Naming Config:       {}",
        config
            .naming_config
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(defaults)".to_string())
    );

    if let Some(config_path) = Config::config_file_path() {
        println!("\nConfig file: {}", config_path.display());
    }

    Ok(())
}

/// Set a configuration value.
pub fn set(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "store-dir" => config.store_dir = value.into(),
        "naming-config" | "naming" => config.naming_config = Some(value.into()),
        _ => {
            anyhow::bail!(
                "Unknown config key: {}. Valid keys: store-dir, naming-config",
                key
            );
        }
    }

    config.save()?;
    println!("Set {} to: {}", key, value);
    Ok(())
}

/// Get a configuration value.
pub fn get(config: &Config, key: &str) -> Result<()> {
    let value = match key {
        "store-dir" => config.store_dir.display().to_string(),
        "naming-config" | "naming" => config
            .naming_config
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not set)".to_string()),
        _ => {
            anyhow::bail!("Unknown config key: {}", key);
        }
    };

    println!("{}", value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn reset() -> Result<()> {
    Config::default().save()?;
    println!("Configuration reset to defaults");
    Ok(())
}
