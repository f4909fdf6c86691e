//! Backend selection and config loading shared by all commands

use crate::error::CliError;
use itchy::{DeviceConnector, Itchy, ItchyConfig, ItchyError, QueryOptions, TactileMouseQuery};
use itchy_sim::{SimulatedConnector, VirtualDevice};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

/// Radius of the circle the simulated hand traces, in metres.
const SIM_CIRCLE_RADIUS: f32 = 0.02;
/// Angular speed of the simulated hand in rad/s.
const SIM_CIRCLE_SPEED: f32 = 1.5;
const SIM_MOTION_PERIOD: Duration = Duration::from_millis(10);

pub struct Session {
    pub config: ItchyConfig,
    pub config_path: PathBuf,
    simulate: bool,
}

impl Session {
    pub fn load(config_path: Option<&Path>, simulate: bool) -> Result<Self, CliError> {
        let config_path = resolve_config_path(config_path)?;

        let config = ItchyConfig::load_from_path(&config_path).map_err(|e| match e {
            ItchyError::Io(e) => CliError::IoError(e),
            other => CliError::InvalidConfiguration(other.to_string()),
        })?;
        debug!(path = %config_path.display(), simulate, "Session configured");

        Ok(Self {
            config,
            config_path,
            simulate,
        })
    }

    pub fn query_options(&self) -> QueryOptions {
        self.config.query
    }

    pub fn connect(&self) -> Result<Backend, CliError> {
        if self.simulate {
            return Ok(Backend::simulated());
        }
        Backend::hardware()
    }

    /// Open the configured device or fail with `DeviceNotFound`.
    pub fn open_device(&self, backend: &Backend) -> Result<Itchy, CliError> {
        let mut device = Itchy::with_identifier(backend.connector(), self.config.device);
        let options = self.config.query;
        device
            .open(
                options.connect_attempts,
                Duration::from_millis(options.connect_interval_ms),
            )
            .map_err(CliError::from_command)?;
        Ok(device)
    }

    pub fn query(&self, backend: &Backend, options: QueryOptions) -> TactileMouseQuery {
        TactileMouseQuery::with_identifier(backend.connector(), self.config.device, options)
    }
}

/// The `--config` path, or the platform default.
pub fn resolve_config_path(config_path: Option<&Path>) -> Result<PathBuf, CliError> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => ItchyConfig::default_config_path().map_err(CliError::from_command),
    }
}

/// A connector plus whatever keeps it alive.
pub struct Backend {
    connector: Arc<dyn DeviceConnector>,
    _motion: Option<SimulatedHand>,
}

impl Backend {
    fn simulated() -> Self {
        let mut device = VirtualDevice::new();
        device.press_reset();
        let connector = Arc::new(SimulatedConnector::new(device));
        let motion = SimulatedHand::start(&connector);
        Self {
            connector,
            _motion: motion,
        }
    }

    #[cfg(feature = "hidapi")]
    fn hardware() -> Result<Self, CliError> {
        Ok(Self {
            connector: Arc::new(itchy_hid::HidApiConnector::new()),
            _motion: None,
        })
    }

    #[cfg(not(feature = "hidapi"))]
    fn hardware() -> Result<Self, CliError> {
        Err(CliError::DeviceNotFound(
            "built without hidapi support, use --simulate".to_string(),
        ))
    }

    pub fn connector(&self) -> Arc<dyn DeviceConnector> {
        Arc::clone(&self.connector)
    }
}

/// Background thread moving the virtual device on a circle so monitoring
/// commands have something to show.
struct SimulatedHand {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SimulatedHand {
    fn start(connector: &SimulatedConnector) -> Option<Self> {
        let device = connector.device();
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let spawned = std::thread::Builder::new()
            .name("itchy-sim-hand".to_string())
            .spawn(move || {
                let step = SIM_CIRCLE_SPEED * SIM_MOTION_PERIOD.as_secs_f32();
                let mut phase = 0.0f32;
                while flag.load(Ordering::Acquire) {
                    let next = phase + step;
                    let dx = SIM_CIRCLE_RADIUS * (next.cos() - phase.cos());
                    let dy = SIM_CIRCLE_RADIUS * (next.sin() - phase.sin());
                    device.lock().translate(dx, dy);
                    phase = next % std::f32::consts::TAU;
                    std::thread::sleep(SIM_MOTION_PERIOD);
                }
            });

        match spawned {
            Ok(handle) => Some(Self {
                running,
                handle: Some(handle),
            }),
            Err(e) => {
                warn!(error = %e, "Could not start simulated motion");
                None
            }
        }
    }
}

impl Drop for SimulatedHand {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Simulated motion thread panicked");
            }
        }
    }
}
