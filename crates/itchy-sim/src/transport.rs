//! `HidTransport` and `DeviceConnector` backed by a [`VirtualDevice`]
//!
//! Reads advance the virtual firmware by the wall-clock time elapsed since
//! the previous read, so a client polling the transport sees state reports
//! at the configured update rate.

use crate::VirtualDevice;
use itchy_hid::{DeviceConnector, HidDeviceInfo, HidError, HidResult, HidTransport};
use itchy_protocol::DeviceIdentifier;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const READ_POLL_INTERVAL: Duration = Duration::from_millis(1);

pub const SIMULATED_DEVICE_PATH: &str = "sim://itchy";

fn simulated_info() -> HidDeviceInfo {
    HidDeviceInfo::for_identifier(&DeviceIdentifier::default(), SIMULATED_DEVICE_PATH)
        .with_manufacturer("ITCHy")
        .with_product_name("ITCHy (simulated)")
        .with_serial("SIM-0001")
}

pub struct SimulatedTransport {
    device: Arc<Mutex<VirtualDevice>>,
    plugged: Arc<AtomicBool>,
    info: HidDeviceInfo,
    last_tick: Instant,
    open: bool,
}

impl SimulatedTransport {
    pub fn new(device: Arc<Mutex<VirtualDevice>>) -> Self {
        Self {
            device,
            plugged: Arc::new(AtomicBool::new(true)),
            info: simulated_info(),
            last_tick: Instant::now(),
            open: true,
        }
    }

    fn check_open(&self) -> HidResult<()> {
        if self.open && self.plugged.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(HidError::Disconnected)
        }
    }
}

impl HidTransport for SimulatedTransport {
    fn write_report(&mut self, data: &[u8]) -> HidResult<usize> {
        self.check_open()?;
        self.device
            .lock()
            .handle_report(data)
            .map_err(|e| HidError::WriteError(e.to_string()))?;
        Ok(data.len())
    }

    fn read_report(&mut self, timeout_ms: u32) -> HidResult<Option<Vec<u8>>> {
        let deadline = Instant::now() + Duration::from_millis(u64::from(timeout_ms));

        loop {
            self.check_open()?;

            let now = Instant::now();
            let dt = now.duration_since(self.last_tick).as_secs_f32();
            self.last_tick = now;

            if let Some(frame) = self.device.lock().tick(dt) {
                return Ok(Some(frame.encode().to_vec()));
            }
            if now >= deadline {
                return Ok(None);
            }
            std::thread::sleep(READ_POLL_INTERVAL.min(deadline - now));
        }
    }

    fn device_info(&self) -> &HidDeviceInfo {
        &self.info
    }

    fn is_connected(&self) -> bool {
        self.open && self.plugged.load(Ordering::Acquire)
    }

    fn close(&mut self) -> HidResult<()> {
        if self.open {
            debug!("Closing simulated transport");
            self.open = false;
        }
        Ok(())
    }
}

/// Connector exposing one shared virtual device.
pub struct SimulatedConnector {
    device: Arc<Mutex<VirtualDevice>>,
    plugged: Arc<AtomicBool>,
    info: HidDeviceInfo,
}

impl SimulatedConnector {
    pub fn new(device: VirtualDevice) -> Self {
        Self::from_shared(Arc::new(Mutex::new(device)))
    }

    pub fn from_shared(device: Arc<Mutex<VirtualDevice>>) -> Self {
        Self {
            device,
            plugged: Arc::new(AtomicBool::new(true)),
            info: simulated_info(),
        }
    }

    /// Handle to drive buttons and sensor motion from the outside.
    pub fn device(&self) -> Arc<Mutex<VirtualDevice>> {
        Arc::clone(&self.device)
    }

    /// Simulate unplugging the cable; open transports fail with
    /// [`HidError::Disconnected`] until plugged back in.
    pub fn set_plugged(&self, plugged: bool) {
        if !plugged {
            warn!("Simulated device unplugged");
        }
        self.plugged.store(plugged, Ordering::Release);
    }
}

impl DeviceConnector for SimulatedConnector {
    fn list(&self) -> HidResult<Vec<HidDeviceInfo>> {
        if self.plugged.load(Ordering::Acquire) {
            Ok(vec![self.info.clone()])
        } else {
            Ok(Vec::new())
        }
    }

    fn open(&self, id: &DeviceIdentifier) -> HidResult<Option<Box<dyn HidTransport>>> {
        if !self.plugged.load(Ordering::Acquire) || !self.info.matches(id) {
            return Ok(None);
        }

        let mut transport = SimulatedTransport::new(Arc::clone(&self.device));
        transport.plugged = Arc::clone(&self.plugged);
        Ok(Some(Box::new(transport)))
    }
}
