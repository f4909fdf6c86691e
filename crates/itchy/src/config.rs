//! Configuration file handling
//!
//! The configuration is a JSON document. Missing fields take their defaults,
//! so an empty object is a valid configuration.

use crate::query::QueryOptions;
use crate::{ItchyError, ItchyResult};
use itchy_protocol::{DeviceIdentifier, SimulationParameters};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SCHEMA_VERSION: &str = "itchy.config/1";

/// Longest accepted read timeout.
const MAX_TIMEOUT_MS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItchyConfig {
    pub schema_version: String,
    /// Which HID interface to open.
    pub device: DeviceIdentifier,
    pub query: QueryOptions,
    /// Simulation parameters pushed to the device by `itchyctl apply`.
    pub simulation: Option<SimulationParameters>,
    /// Calibration rectangle in metres pushed by `itchyctl apply`.
    pub calibration_target: Option<[f32; 2]>,
}

impl Default for ItchyConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            device: DeviceIdentifier::default(),
            query: QueryOptions::default(),
            simulation: None,
            calibration_target: None,
        }
    }
}

impl ItchyConfig {
    /// Load from the default location.
    pub fn load() -> ItchyResult<Self> {
        Self::load_from_path(Self::default_config_path()?)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> ItchyResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: ItchyConfig = serde_json::from_str(&content)?;
        config.validate()?;

        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> ItchyResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        debug!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn default_config_path() -> ItchyResult<PathBuf> {
        let config_dir = if cfg!(windows) {
            std::env::var("LOCALAPPDATA").map(PathBuf::from).map_err(|_| {
                ItchyError::InvalidConfiguration(
                    "LOCALAPPDATA environment variable not set".to_string(),
                )
            })?
        } else if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg)
        } else {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .map_err(|_| {
                    ItchyError::InvalidConfiguration("HOME environment variable not set".to_string())
                })?
        };

        Ok(config_dir.join("itchy").join("config.json"))
    }

    pub fn validate(&self) -> ItchyResult<()> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ItchyError::InvalidConfiguration(format!(
                "Unsupported schema version: {}",
                self.schema_version
            )));
        }

        if self.query.connect_attempts == 0 {
            return Err(ItchyError::InvalidConfiguration(
                "connect_attempts must be at least 1".to_string(),
            ));
        }

        if self.query.timeout_ms == 0 || self.query.timeout_ms > MAX_TIMEOUT_MS {
            return Err(ItchyError::InvalidConfiguration(format!(
                "Invalid read timeout: {} ms",
                self.query.timeout_ms
            )));
        }

        if let Some(params) = &self.simulation {
            params.validate()?;
        }

        if let Some([width, height]) = self.calibration_target {
            if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
                return Err(ItchyError::InvalidConfiguration(format!(
                    "Invalid calibration target: {width} x {height} m"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn default_config_is_valid() -> ItchyResult<()> {
        ItchyConfig::default().validate()
    }

    #[test]
    fn empty_object_takes_defaults() -> TestResult {
        let config: ItchyConfig = serde_json::from_str("{}")?;
        assert_eq!(config, ItchyConfig::default());
        Ok(())
    }

    #[test]
    fn partial_query_section() -> TestResult {
        let config: ItchyConfig =
            serde_json::from_str(r#"{"query": {"detached": true, "timeout_ms": 100}}"#)?;
        assert!(config.query.detached);
        assert_eq!(config.query.timeout_ms, 100);
        assert_eq!(config.query.connect_attempts, 100);
        Ok(())
    }

    #[test]
    fn missing_file_yields_defaults() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = ItchyConfig::load_from_path(dir.path().join("absent.json"))?;
        assert_eq!(config, ItchyConfig::default());
        Ok(())
    }

    #[test]
    fn save_then_load() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("config.json");
        let config = ItchyConfig {
            simulation: Some(SimulationParameters {
                mass: 0.2,
                ..SimulationParameters::default()
            }),
            calibration_target: Some([0.3, 0.2]),
            ..ItchyConfig::default()
        };

        config.save_to_path(&path)?;
        assert_eq!(ItchyConfig::load_from_path(&path)?, config);
        Ok(())
    }

    #[test]
    fn rejects_wrong_schema() {
        let config = ItchyConfig {
            schema_version: "other.config/1".to_string(),
            ..ItchyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ItchyError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_zero_timeout_and_attempts() {
        let mut config = ItchyConfig::default();
        config.query.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ItchyConfig::default();
        config.query.timeout_ms = 20_000;
        assert!(config.validate().is_err());

        let mut config = ItchyConfig::default();
        config.query.connect_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_calibration_target() {
        let config = ItchyConfig {
            calibration_target: Some([0.0, 0.1]),
            ..ItchyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_invalid_simulation() {
        let config = ItchyConfig {
            simulation: Some(SimulationParameters {
                mass: -1.0,
                ..SimulationParameters::default()
            }),
            ..ItchyConfig::default()
        };
        assert!(matches!(config.validate(), Err(ItchyError::Protocol(_))));
    }

    #[test]
    fn invalid_file_is_an_error() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json")?;
        assert!(matches!(
            ItchyConfig::load_from_path(&path),
            Err(ItchyError::Json(_))
        ));
        Ok(())
    }
}
