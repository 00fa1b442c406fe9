//! Configuration management for gbtune.
//!
//! - [`core`]: the training hyperparameter vector ([`Options`]) and its builder
//! - [`search_space`]: per-parameter `(min, max, step)` ranges for searches
//! - [`search`]: knobs of the cross-validated search drivers
//!
//! All three can be read from and written to `.json` or `.toml` files.

pub mod core;
pub mod search;
pub mod search_space;

pub use self::core::{Options, OptionsBuilder};
pub use search::{FoldAssignment, SearchConfig};
pub use search_space::{ParamRange, SearchSpace};

use crate::core::error::{GbtuneError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Configuration file format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML configuration format
    Toml,
    /// JSON configuration format
    Json,
}

impl ConfigFormat {
    /// Detect the format of `path` from its extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => Ok(ConfigFormat::Json),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => Err(GbtuneError::config(format!(
                "Unsupported config file format for {}. Use .json or .toml",
                path.display()
            ))),
        }
    }
}

/// Read any serde-enabled configuration value from a `.json`/`.toml` file.
pub(crate) fn load_config_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .map_err(|e| GbtuneError::config(format!("Failed to read config file: {}", e)))?;

    let value = match format {
        ConfigFormat::Json => serde_json::from_str(&content)
            .map_err(|e| GbtuneError::config(format!("Failed to parse JSON config: {}", e)))?,
        ConfigFormat::Toml => toml::from_str(&content)
            .map_err(|e| GbtuneError::config(format!("Failed to parse TOML config: {}", e)))?,
    };
    Ok(value)
}

/// Write any serde-enabled configuration value to a `.json`/`.toml` file.
pub(crate) fn save_config_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = match ConfigFormat::from_path(path)? {
        ConfigFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| GbtuneError::config(format!("Failed to serialize to JSON: {}", e)))?,
        ConfigFormat::Toml => toml::to_string_pretty(value)
            .map_err(|e| GbtuneError::config(format!("Failed to serialize to TOML: {}", e)))?,
    };

    std::fs::write(path, content)
        .map_err(|e| GbtuneError::config(format!("Failed to write config file: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/b.json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("opts.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(ConfigFormat::from_path(Path::new("opts.yaml")).is_err());
        assert!(ConfigFormat::from_path(Path::new("opts")).is_err());
    }
}
