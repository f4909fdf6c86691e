//! Position query adapter over an ITCHy device

use crate::device::Itchy;
use crate::vector::Vec2;
use itchy_hid::DeviceConnector;
use itchy_protocol::{Color, DeviceIdentifier, DeviceState};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

/// Color shown once the device is initialized.
pub const READY_COLOR: Color = Color::new(255, 128, 0);

/// Read timeout of one background poll. The device lock is released
/// between polls so commands from the frame loop wait at most this long.
pub const DETACHED_POLL_TIMEOUT_MS: u32 = 10;

const POLLER_IDLE: Duration = Duration::from_millis(10);

/// Source of planar pose and button input for an application frame loop.
pub trait PositionQuery {
    fn position(&self) -> Vec2;
    fn velocity(&self) -> Vec2;
    /// Orientation in radians.
    fn orientation(&self) -> f32;
    fn angular_velocity(&self) -> f32;
    fn button_pressed(&self) -> bool;

    /// Latch the newest device state; the readers above only change here.
    fn update(&mut self);
    fn initialize(&mut self) -> bool;
    /// Set the RGB feedback LED.
    fn feedback(&mut self, r: u8, g: u8, b: u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Poll the device on a background thread.
    pub detached: bool,
    /// Read timeout for `update` when not detached.
    pub timeout_ms: u32,
    pub connect_attempts: u32,
    pub connect_interval_ms: u64,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            detached: false,
            timeout_ms: 50,
            connect_attempts: 100,
            connect_interval_ms: 10,
        }
    }
}

struct Poller {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// [`PositionQuery`] backed by an ITCHy device.
pub struct TactileMouseQuery {
    options: QueryOptions,
    mouse: Arc<Mutex<Itchy>>,
    published: Arc<Mutex<DeviceState>>,
    front: DeviceState,
    poller: Option<Poller>,
}

impl TactileMouseQuery {
    pub fn new(connector: Arc<dyn DeviceConnector>, options: QueryOptions) -> Self {
        Self::from_device(Itchy::new(connector), options)
    }

    pub fn with_identifier(
        connector: Arc<dyn DeviceConnector>,
        identifier: DeviceIdentifier,
        options: QueryOptions,
    ) -> Self {
        Self::from_device(Itchy::with_identifier(connector, identifier), options)
    }

    #[cfg(feature = "hidapi")]
    pub fn with_hidapi(options: QueryOptions) -> Self {
        Self::from_device(Itchy::with_hidapi(), options)
    }

    pub fn from_device(device: Itchy, options: QueryOptions) -> Self {
        Self {
            options,
            mouse: Arc::new(Mutex::new(device)),
            published: Arc::new(Mutex::new(DeviceState::default())),
            front: DeviceState::default(),
            poller: None,
        }
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }

    pub fn connected(&self) -> bool {
        self.mouse.lock().connected()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_some()
    }

    /// The state latched by the last `update`.
    pub fn state(&self) -> DeviceState {
        self.front
    }

    /// Shared access to the underlying device, e.g. to register callbacks or
    /// send configuration commands.
    pub fn device(&self) -> Arc<Mutex<Itchy>> {
        Arc::clone(&self.mouse)
    }

    fn start_poller(&mut self) {
        let running = Arc::new(AtomicBool::new(true));
        let mouse = Arc::clone(&self.mouse);
        let published = Arc::clone(&self.published);
        let flag = Arc::clone(&running);

        let spawned = std::thread::Builder::new()
            .name("itchy-poller".to_string())
            .spawn(move || {
                while flag.load(Ordering::Acquire) {
                    let mut guard = mouse.lock();
                    let state = guard.current_state(DETACHED_POLL_TIMEOUT_MS);
                    let connected = guard.connected();
                    // Hand the lock to a waiting `feedback` before polling again.
                    MutexGuard::unlock_fair(guard);
                    *published.lock() = state;
                    if !connected {
                        std::thread::sleep(POLLER_IDLE);
                    }
                }
            });

        match spawned {
            Ok(handle) => {
                debug!("Started detached state poller");
                self.poller = Some(Poller { running, handle });
            }
            Err(e) => warn!(error = %e, "Could not start poller, falling back to polling in update"),
        }
    }

    fn stop_poller(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.running.store(false, Ordering::Release);
            if poller.handle.join().is_err() {
                warn!("State poller panicked");
            }
        }
    }
}

impl PositionQuery for TactileMouseQuery {
    fn position(&self) -> Vec2 {
        Vec2::from(self.front.position)
    }

    fn velocity(&self) -> Vec2 {
        Vec2::from(self.front.velocity)
    }

    fn orientation(&self) -> f32 {
        self.front.angle
    }

    fn angular_velocity(&self) -> f32 {
        self.front.angular_velocity
    }

    fn button_pressed(&self) -> bool {
        self.front.button_pressed()
    }

    fn update(&mut self) {
        self.front = if self.poller.is_some() {
            *self.published.lock()
        } else {
            self.mouse.lock().current_state(self.options.timeout_ms)
        };
    }

    fn initialize(&mut self) -> bool {
        let connected = self.mouse.lock().connect_with_retry(
            self.options.connect_attempts,
            Duration::from_millis(self.options.connect_interval_ms),
        );

        if connected {
            self.feedback(READY_COLOR.r, READY_COLOR.g, READY_COLOR.b);
            if self.options.detached && self.poller.is_none() {
                self.start_poller();
            }
        }
        connected
    }

    fn feedback(&mut self, r: u8, g: u8, b: u8) {
        // Feedback has no error path; failures are logged and reported
        // through the device callbacks.
        let _delivered = self.mouse.lock().set_color(Color::new(r, g, b));
    }
}

impl Drop for TactileMouseQuery {
    fn drop(&mut self) {
        self.stop_poller();
        let mut mouse = self.mouse.lock();
        let _delivered = mouse.set_color(Color::BLACK);
        mouse.disconnect();
    }
}
