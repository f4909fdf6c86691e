//! Persistent configuration of the virtual device
//!
//! Plays the part of the firmware's EEPROM: one record holding simulation
//! parameters, calibration target and both sensor calibrations, guarded by a
//! marker byte. The record lives in memory and is optionally mirrored to a
//! JSON file so a simulated device keeps its settings across runs.

use crate::math::Vec2f;
use crate::{SensorCalibration, SimResult};
use itchy_protocol::SimulationParameters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Marker written in front of a valid record.
pub const STORE_MAGIC: u8 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredConfig {
    pub parameters: SimulationParameters,
    pub calibration_target: Vec2f,
    pub left: SensorCalibration,
    pub right: SensorCalibration,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    magic: u8,
    config: StoredConfig,
}

#[derive(Debug, Default)]
pub struct ConfigStore {
    record: Option<StoredConfig>,
    path: Option<PathBuf>,
}

impl ConfigStore {
    /// A blank store without backing file.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A store mirrored to `path`, loading any record already there.
    ///
    /// A file with the wrong marker counts as blank; unreadable JSON is an
    /// error.
    pub fn with_file<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut record = None;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let file: StoreFile = serde_json::from_str(&content)?;
            if file.magic == STORE_MAGIC {
                debug!("Loaded stored device config from {:?}", path);
                record = Some(file.config);
            } else {
                warn!(magic = file.magic, "Ignoring config store without valid marker");
            }
        }

        Ok(Self {
            record,
            path: Some(path),
        })
    }

    pub fn is_stored(&self) -> bool {
        self.record.is_some()
    }

    pub fn load(&self) -> Option<StoredConfig> {
        self.record
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn save(&mut self, config: StoredConfig) -> SimResult<()> {
        self.record = Some(config);

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = StoreFile {
                magic: STORE_MAGIC,
                config,
            };
            std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
            info!("Saved device config to {:?}", path);
        }
        Ok(())
    }
}
