//! Virtual ITCHy: firmware mode machine, LED, buttons and frame emission

use crate::body::RigidBody;
use crate::math::{self, Vec2f};
use crate::sensor::{Sensor, SensorCalibration};
use crate::store::{ConfigStore, StoredConfig};
use crate::{DEFAULT_CALIBRATION_TARGET, SimResult};
use itchy_protocol::{Color, Command, DeviceState, ProtocolError, SimulationParameters};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

/// Idle color of the status LED.
pub const DEFAULT_COLOR: Color = Color::new(255, 64, 0);
pub const CALIBRATE_X_COLOR: Color = Color::new(255, 0, 0);
pub const CALIBRATE_Y_COLOR: Color = Color::new(0, 255, 0);
/// Shown between the two calibration strokes.
pub const CALIBRATE_WAIT_COLOR: Color = Color::new(255, 255, 0);

/// Longest integration step in seconds.
const MAX_SUBSTEP: f32 = 0.001;

/// Longest span a single `tick` simulates.
const MAX_TICK: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FirmwareMode {
    /// Waiting for the reset button.
    Init,
    /// Recording the horizontal calibration stroke.
    CalibrateX,
    /// X stroke recorded; waiting for the thumb button before the Y stroke.
    AwaitingY,
    /// Recording the vertical calibration stroke.
    CalibrateY,
    /// Running the body simulation and streaming state reports.
    Simulate,
}

/// RGB status LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Led {
    color: Color,
    lit: bool,
    blinks: u32,
}

impl Led {
    fn new() -> Self {
        Self {
            color: Color::BLACK,
            lit: false,
            blinks: 0,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    /// What an observer sees right now.
    pub fn shown(&self) -> Color {
        if self.lit { self.color } else { Color::BLACK }
    }

    /// Number of blink sequences shown since boot.
    pub fn blink_count(&self) -> u32 {
        self.blinks
    }

    fn on(&mut self) {
        self.lit = true;
    }

    fn off(&mut self) {
        self.lit = false;
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Flash `color` a number of times and restore the previous state.
    fn blink(&mut self, color: Color, times: u32) {
        trace!(?color, times, "LED blink");
        self.blinks += times;
    }
}

pub struct VirtualDevice {
    mode: FirmwareMode,
    led: Led,
    parameters: SimulationParameters,
    calibration_target: Vec2f,
    left: Sensor,
    right: Sensor,
    body: RigidBody,
    store: ConfigStore,
    pending_left: [i64; 2],
    pending_right: [i64; 2],
    thumb_latch: u8,
    since_frame_ms: f32,
    time: f32,
    last_raw_left: [i64; 2],
    last_raw_right: [i64; 2],
    frames_sent: u64,
}

impl Default for VirtualDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualDevice {
    /// A freshly flashed device without stored configuration.
    pub fn new() -> Self {
        Self::with_store(ConfigStore::in_memory())
    }

    /// Boot with the record in `store`, or with defaults when it is blank.
    ///
    /// Without a stored record the sensors start from a nominal calibration
    /// so the model is usable before the first calibration run.
    pub fn with_store(store: ConfigStore) -> Self {
        let mut device = Self {
            mode: FirmwareMode::Init,
            led: Led::new(),
            parameters: SimulationParameters::default(),
            calibration_target: DEFAULT_CALIBRATION_TARGET,
            left: Sensor::new(false, true),
            right: Sensor::new(true, false),
            body: RigidBody::new(),
            store,
            pending_left: [0, 0],
            pending_right: [0, 0],
            thumb_latch: 0,
            since_frame_ms: 0.0,
            time: 0.0,
            last_raw_left: [0, 0],
            last_raw_right: [0, 0],
            frames_sent: 0,
        };

        match device.store.load() {
            Some(stored) => {
                info!("Booting virtual device from stored configuration");
                device.parameters = stored.parameters;
                device.calibration_target = stored.calibration_target;
                device.left.set_calibration(stored.left);
                device.right.set_calibration(stored.right);
            }
            None => {
                device.left.set_calibration(SensorCalibration::nominal());
                device.right.set_calibration(SensorCalibration::nominal());
            }
        }
        device.left.set_calibration_target(device.calibration_target);
        device.right.set_calibration_target(device.calibration_target);

        device.led.blink(DEFAULT_COLOR, 1);
        device.led.on();
        device.led.set_color(DEFAULT_COLOR);
        device.reset_simulation();
        device
    }

    pub fn mode(&self) -> FirmwareMode {
        self.mode
    }

    pub fn led(&self) -> &Led {
        &self.led
    }

    pub fn parameters(&self) -> SimulationParameters {
        self.parameters
    }

    pub fn calibration_target(&self) -> Vec2f {
        self.calibration_target
    }

    pub fn left_sensor(&self) -> &Sensor {
        &self.left
    }

    pub fn right_sensor(&self) -> &Sensor {
        &self.right
    }

    pub fn body(&self) -> &RigidBody {
        &self.body
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Decode and apply a host command report. Reports with the `Invalid`
    /// opcode or an opcode the firmware does not know are ignored.
    pub fn handle_report(&mut self, data: &[u8]) -> SimResult<()> {
        match Command::decode(data) {
            Ok(Some(command)) => self.apply(command),
            Ok(None) => {
                trace!("Ignoring invalid command report");
                Ok(())
            }
            Err(ProtocolError::UnknownOpCode(op)) => {
                trace!(op, "Ignoring unknown command report");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn apply(&mut self, command: Command) -> SimResult<()> {
        debug!(?command, mode = ?self.mode, "Virtual device command");
        match command {
            Command::SetColor(color) => {
                self.led.on();
                self.led.set_color(color);
            }
            Command::CalibrationData { target } => {
                self.led.blink(DEFAULT_COLOR, 2);
                self.calibration_target = target;
                self.left.set_calibration_target(target);
                self.right.set_calibration_target(target);
                self.reset_simulation();
                self.mode = FirmwareMode::Init;
            }
            Command::SimulationData(parameters) => {
                self.led.blink(DEFAULT_COLOR, 3);
                if let Err(e) = parameters.validate() {
                    warn!(error = %e, "Ignoring simulation parameters");
                    return Ok(());
                }
                self.parameters = parameters;
                self.reset_simulation();
            }
            Command::SaveConfig => {
                self.led.blink(DEFAULT_COLOR, 5);
                self.store.save(StoredConfig {
                    parameters: self.parameters,
                    calibration_target: self.calibration_target,
                    left: self.left.calibration(),
                    right: self.right.calibration(),
                })?;
            }
            Command::Calibrate => {
                self.led.blink(DEFAULT_COLOR, 6);
                self.start_calibration();
                self.led.on();
            }
        }
        Ok(())
    }

    /// Press and release the reset button.
    pub fn press_reset(&mut self) {
        match self.mode {
            FirmwareMode::Init => {
                info!("Virtual device entering simulation");
                self.mode = FirmwareMode::Simulate;
                self.reset_simulation();
            }
            FirmwareMode::Simulate => {
                self.led.off();
                self.reset_simulation();
                self.led.on();
            }
            FirmwareMode::CalibrateX | FirmwareMode::AwaitingY | FirmwareMode::CalibrateY => {}
        }
    }

    /// Press and release the thumb button.
    pub fn press_thumb(&mut self) {
        match self.mode {
            FirmwareMode::Simulate => self.thumb_latch = 1,
            FirmwareMode::CalibrateX => {
                self.left.calibration_finish_x();
                self.right.calibration_finish_x();
                self.clear_pending();
                self.led.on();
                self.led.set_color(CALIBRATE_WAIT_COLOR);
                self.mode = FirmwareMode::AwaitingY;
            }
            FirmwareMode::AwaitingY => {
                self.mode = FirmwareMode::CalibrateY;
                self.led.off();
                self.left.reset();
                self.right.reset();
                self.clear_pending();
            }
            FirmwareMode::CalibrateY => {
                self.left.calibration_finish_y();
                self.right.calibration_finish_y();
                self.led.blink(DEFAULT_COLOR, 3);
                info!(
                    left = ?self.left.calibration(),
                    right = ?self.right.calibration(),
                    "Calibration finished"
                );
                self.mode = FirmwareMode::Simulate;
                self.reset_simulation();
                self.led.off();
            }
            FirmwareMode::Init => {}
        }
    }

    /// Press thumb and reset together; forces calibration while simulating.
    pub fn press_both(&mut self) {
        match self.mode {
            FirmwareMode::Simulate => {
                self.led.on();
                self.led.blink(DEFAULT_COLOR, 6);
                self.start_calibration();
            }
            FirmwareMode::Init => self.press_reset(),
            FirmwareMode::CalibrateX | FirmwareMode::AwaitingY | FirmwareMode::CalibrateY => {
                self.press_thumb()
            }
        }
    }

    pub fn set_lifted(&mut self, left: bool, right: bool) {
        self.left.set_lifted(left);
        self.right.set_lifted(right);
    }

    /// Queue raw sensor counts, consumed by the next `tick`.
    pub fn move_sensors(&mut self, left: [i16; 2], right: [i16; 2]) {
        for axis in 0..2 {
            self.pending_left[axis] += i64::from(left[axis]);
            self.pending_right[axis] += i64::from(right[axis]);
        }
    }

    /// Queue the counts that move the whole device by `dx`, `dy` metres in
    /// the simulated frame.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        // Sensor deltas get rotated into the body frame, so undo that here.
        let r = self.body.rotation;
        let local = math::mul_mat(&[r[0], r[2], r[1], r[3]], [dx, dy]);

        match (self.left.counts_for(local), self.right.counts_for(local)) {
            (Some(left), Some(right)) => {
                for axis in 0..2 {
                    self.pending_left[axis] += left[axis];
                    self.pending_right[axis] += right[axis];
                }
            }
            _ => warn!("Sensor calibration is degenerate, cannot translate"),
        }
    }

    /// Advance the firmware by `dt` seconds and return the state report it
    /// sends, if one is due.
    pub fn tick(&mut self, dt: f32) -> Option<DeviceState> {
        if !dt.is_finite() || dt < 0.0 {
            warn!(dt, "Ignoring invalid time step");
            return None;
        }
        let dt = dt.min(MAX_TICK);

        match self.mode {
            FirmwareMode::Init => {
                self.led.set_color(DEFAULT_COLOR);
                self.clear_pending();
                None
            }
            FirmwareMode::CalibrateX => {
                self.led.on();
                self.led.set_color(CALIBRATE_X_COLOR);
                self.integrate_pending();
                None
            }
            FirmwareMode::AwaitingY => {
                self.led.on();
                self.led.set_color(CALIBRATE_WAIT_COLOR);
                self.clear_pending();
                None
            }
            FirmwareMode::CalibrateY => {
                self.led.on();
                self.led.set_color(CALIBRATE_Y_COLOR);
                self.integrate_pending();
                None
            }
            FirmwareMode::Simulate => self.simulate(dt),
        }
    }

    fn simulate(&mut self, dt: f32) -> Option<DeviceState> {
        let (delta_left, delta_right) = self.integrate_pending();

        let substeps = (dt / MAX_SUBSTEP).ceil().max(1.0) as u32;
        let h = dt / substeps as f32;
        self.body.step(delta_left, delta_right, &self.parameters, h);
        for _ in 1..substeps {
            self.body.step([0.0, 0.0], [0.0, 0.0], &self.parameters, h);
        }
        self.time += dt;
        self.since_frame_ms += dt * 1000.0;

        let frame = (self.since_frame_ms > self.parameters.update_rate_ms as f32).then(|| {
            let frame = self.build_frame(dt);
            self.since_frame_ms = 0.0;
            self.thumb_latch = 0;
            self.frames_sent += 1;
            frame
        });

        if self.left.is_lifted() || self.right.is_lifted() {
            self.body.reset_rotation();
        }
        frame
    }

    fn build_frame(&mut self, dt: f32) -> DeviceState {
        let raw_left = self.left.raw_position();
        let raw_right = self.right.raw_position();
        let increment = |now: [i64; 2], last: [i64; 2]| {
            [saturate_i16(now[0] - last[0]), saturate_i16(now[1] - last[1])]
        };

        let frame = DeviceState {
            position: self.body.position,
            angle: self.body.angle,
            velocity: self.body.velocity,
            angular_velocity: self.body.angular_velocity,
            button: self.thumb_latch,
            left_sensor: self.body.position_left,
            right_sensor: self.body.position_right,
            left_increment: increment(raw_left, self.last_raw_left),
            right_increment: increment(raw_right, self.last_raw_right),
            time_step: dt,
            time: self.time,
        };

        self.last_raw_left = raw_left;
        self.last_raw_right = raw_right;
        frame
    }

    fn start_calibration(&mut self) {
        info!("Virtual device entering calibration");
        self.mode = FirmwareMode::CalibrateX;
        self.left.calibration_start();
        self.right.calibration_start();
        self.clear_pending();
    }

    fn reset_simulation(&mut self) {
        self.body.reset();
        self.left.reset();
        self.right.reset();
        self.clear_pending();
        self.last_raw_left = [0, 0];
        self.last_raw_right = [0, 0];
        self.time = 0.0;
    }

    fn clear_pending(&mut self) {
        self.pending_left = [0, 0];
        self.pending_right = [0, 0];
    }

    fn integrate_pending(&mut self) -> (Vec2f, Vec2f) {
        let left = feed(&mut self.left, &mut self.pending_left);
        let right = feed(&mut self.right, &mut self.pending_right);
        (left, right)
    }
}

/// Feed queued counts to `sensor` in register-sized chunks.
fn feed(sensor: &mut Sensor, pending: &mut [i64; 2]) -> Vec2f {
    let mut total = [0.0, 0.0];
    while *pending != [0, 0] {
        let chunk = [saturate_i16(pending[0]), saturate_i16(pending[1])];
        pending[0] -= i64::from(chunk[0]);
        pending[1] -= i64::from(chunk[1]);
        total = math::add(total, sensor.integrate(chunk));
    }
    total
}

fn saturate_i16(value: i64) -> i16 {
    value.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
}
