//! JSON configuration source.
//!
//! Implements [`ConfigPort`].  The host reads a file (path from
//! `GREENHOUSE_CONFIG`, default `config.json`); the firmware image embeds
//! the document at build time.  Either way it is parsed and validated once.

use std::path::PathBuf;

use log::info;

use crate::app::ports::ConfigPort;
use crate::config::GreenhouseConfig;
use crate::error::ConfigError;

/// Environment variable naming the host configuration file.
pub const CONFIG_ENV: &str = "GREENHOUSE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

pub enum JsonConfigSource {
    File(PathBuf),
    Embedded(&'static str),
}

impl JsonConfigSource {
    /// File named by `GREENHOUSE_CONFIG`, or `config.json` in the working
    /// directory.
    pub fn from_env() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        Self::File(path)
    }
}

impl ConfigPort for JsonConfigSource {
    fn load(&self) -> Result<GreenhouseConfig, ConfigError> {
        let config = match self {
            Self::File(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path.display(), e)))?;
                info!("Config: loaded {}", path.display());
                GreenhouseConfig::from_json(&text)?
            }
            Self::Embedded(text) => {
                info!("Config: using embedded document");
                GreenhouseConfig::from_json(text)?
            }
        };
        info!(
            "Config: {} actuators, {} sensors, {} buttons",
            config.actuators.len(),
            config.sensors.len(),
            config.buttons.len()
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_document_parses() {
        let src = JsonConfigSource::Embedded(r#"{"actuators": [{"id": "pump_1", "pin": 5}]}"#);
        let cfg = src.load().unwrap();
        assert_eq!(cfg.actuators.len(), 1);
    }

    #[test]
    fn missing_file_is_unreadable() {
        let src = JsonConfigSource::File(PathBuf::from("/nonexistent/greenhouse.json"));
        assert!(matches!(src.load(), Err(ConfigError::Unreadable(_))));
    }

    #[test]
    fn invalid_document_is_parse_error() {
        let src = JsonConfigSource::Embedded("{not json");
        assert!(matches!(src.load(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn file_roundtrip() {
        let path = std::env::temp_dir().join(format!("greenhouse-cfg-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"client_id": "bench", "timing": {"debounce_ms": 50}}"#).unwrap();
        let cfg = JsonConfigSource::File(path.clone()).load().unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(cfg.client_id.as_deref(), Some("bench"));
        assert_eq!(cfg.timing.debounce_ms, 50);
    }
}
