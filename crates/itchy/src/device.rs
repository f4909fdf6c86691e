//! ITCHy device client

use crate::callbacks::{CallbackRegistry, CallbackType};
use crate::{ItchyError, ItchyResult};
use itchy_hid::{DeviceConnector, HidDeviceInfo, HidTransport};
use itchy_protocol::{Color, Command, DeviceIdentifier, DeviceState, SimulationParameters};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Delay between attempts in [`Itchy::connect`].
pub const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Default wait for a state report in [`Itchy::current_state`].
pub const DEFAULT_STATE_TIMEOUT_MS: u32 = 50;

/// Connection to one ITCHy device.
///
/// Commands return `false` when the device is not connected or the report
/// could not be delivered; the `try_*`/[`Itchy::send`] forms return the
/// underlying error instead. Every delivery failure fires the
/// [`CallbackType::CommunicationError`] callbacks.
pub struct Itchy {
    connector: Arc<dyn DeviceConnector>,
    identifier: DeviceIdentifier,
    transport: Option<Box<dyn HidTransport>>,
    callbacks: CallbackRegistry,
    last_state: DeviceState,
}

impl Itchy {
    pub fn new(connector: Arc<dyn DeviceConnector>) -> Self {
        Self::with_identifier(connector, DeviceIdentifier::default())
    }

    pub fn with_identifier(connector: Arc<dyn DeviceConnector>, identifier: DeviceIdentifier) -> Self {
        Self {
            connector,
            identifier,
            transport: None,
            callbacks: CallbackRegistry::new(),
            last_state: DeviceState::default(),
        }
    }

    #[cfg(feature = "hidapi")]
    pub fn with_hidapi() -> Self {
        Self::new(Arc::new(itchy_hid::HidApiConnector::new()))
    }

    pub fn identifier(&self) -> DeviceIdentifier {
        self.identifier
    }

    pub fn device_info(&self) -> Option<&HidDeviceInfo> {
        self.transport.as_deref().map(|t| t.device_info())
    }

    /// Block until the device is found.
    pub fn connect(&mut self) {
        while !self.try_connect() {
            std::thread::sleep(CONNECT_RETRY_INTERVAL);
        }
    }

    /// Try to connect up to `attempts` times, `interval` apart.
    pub fn connect_with_retry(&mut self, attempts: u32, interval: Duration) -> bool {
        for attempt in 0..attempts.max(1) {
            if attempt > 0 {
                std::thread::sleep(interval);
            }
            if self.try_connect() {
                return true;
            }
        }
        debug!(identifier = %self.identifier, attempts, "Device not found");
        false
    }

    /// Like [`Itchy::connect_with_retry`] but reports a missing device as an error.
    pub fn open(&mut self, attempts: u32, interval: Duration) -> ItchyResult<()> {
        if self.connect_with_retry(attempts, interval) {
            Ok(())
        } else {
            Err(ItchyError::DeviceNotFound(self.identifier))
        }
    }

    pub fn try_connect(&mut self) -> bool {
        if self.transport.is_some() {
            return true;
        }

        match self.connector.open(&self.identifier) {
            Ok(Some(transport)) => {
                info!(
                    identifier = %self.identifier,
                    path = %transport.device_info().path,
                    "ITCHy connected"
                );
                self.transport = Some(transport);
                self.callbacks.fire(CallbackType::Connected);
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!(identifier = %self.identifier, error = %e, "Failed to open device");
                false
            }
        }
    }

    pub fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close() {
                warn!(error = %e, "Error while closing device");
            }
            info!(identifier = %self.identifier, "ITCHy disconnected");
            self.callbacks.fire(CallbackType::Disconnected);
        }
    }

    pub fn connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Send one command report.
    pub fn send(&mut self, command: Command) -> ItchyResult<()> {
        let transport = self.transport.as_mut().ok_or(ItchyError::NotConnected)?;
        let report = command.encode();

        let result = match transport.write_report(&report) {
            Ok(0) => Err(ItchyError::ShortWrite(report.len())),
            Ok(_) => Ok(()),
            Err(e) => Err(ItchyError::from(e)),
        };

        if let Err(e) = &result {
            warn!(opcode = ?command.opcode(), error = %e, "Failed to send command");
            self.callbacks.fire(CallbackType::CommunicationError);
        }
        result
    }

    /// Size of the calibration rectangle in metres.
    pub fn try_set_calibration_parameters(&mut self, target: [f32; 2]) -> ItchyResult<()> {
        self.send(Command::CalibrationData { target })
    }

    pub fn set_calibration_parameters(&mut self, target: [f32; 2]) -> bool {
        self.try_set_calibration_parameters(target).is_ok()
    }

    /// Invalid parameters are rejected before anything is sent.
    pub fn try_set_simulation(&mut self, params: SimulationParameters) -> ItchyResult<()> {
        if !self.connected() {
            return Err(ItchyError::NotConnected);
        }
        params.validate()?;
        self.send(Command::SimulationData(params))
    }

    pub fn set_simulation_parameters(
        &mut self,
        mass: f32,
        stiffness: f32,
        damping: f32,
        update_rate_ms: u32,
    ) -> bool {
        self.try_set_simulation(SimulationParameters {
            mass,
            stiffness,
            damping,
            update_rate_ms,
        })
        .is_ok()
    }

    pub fn try_set_color(&mut self, color: Color) -> ItchyResult<()> {
        self.send(Command::SetColor(color))
    }

    pub fn set_color(&mut self, color: Color) -> bool {
        self.try_set_color(color).is_ok()
    }

    /// Put the firmware into its two-step calibration mode.
    pub fn start_calibration(&mut self) -> bool {
        self.send(Command::Calibrate).is_ok()
    }

    /// Persist parameters and calibration in the device's EEPROM.
    pub fn save_state(&mut self) -> bool {
        self.send(Command::SaveConfig).is_ok()
    }

    /// Read the next state report, waiting up to `timeout_ms`.
    ///
    /// Returns the previous state when disconnected, on timeout, or when the
    /// report cannot be decoded. A read failure drops the connection.
    pub fn current_state(&mut self, timeout_ms: u32) -> DeviceState {
        let Some(transport) = self.transport.as_mut() else {
            return self.last_state;
        };

        match transport.read_report(timeout_ms) {
            Ok(Some(data)) => match DeviceState::parse(&data) {
                Ok(state) => self.last_state = state,
                Err(e) => {
                    warn!(error = %e, "Discarding malformed state report");
                    self.callbacks.fire(CallbackType::CommunicationError);
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "State read failed, dropping connection");
                self.callbacks.fire(CallbackType::CommunicationError);
                self.disconnect();
            }
        }

        self.last_state
    }

    /// The most recently received state, without touching the device.
    pub fn last_state(&self) -> DeviceState {
        self.last_state
    }

    pub fn add_callback(&mut self, kind: CallbackType, callback: impl FnMut() + Send + 'static) {
        self.callbacks.add(kind, callback);
    }
}

impl Drop for Itchy {
    fn drop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close() {
                debug!(error = %e, "Error while closing device on drop");
            }
        }
    }
}

impl std::fmt::Debug for Itchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Itchy")
            .field("identifier", &self.identifier)
            .field("connected", &self.connected())
            .field("callbacks", &self.callbacks)
            .field("last_state", &self.last_state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itchy_hid::mock::{MockConnector, MockDevice};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn setup() -> (MockDevice, Arc<MockConnector>, Itchy) {
        let device = MockDevice::itchy();
        let connector = Arc::new(MockConnector::with_device(device.clone()));
        let itchy = Itchy::new(connector.clone());
        (device, connector, itchy)
    }

    fn counter(itchy: &mut Itchy, kind: CallbackType) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&hits);
        itchy.add_callback(kind, move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        hits
    }

    #[test]
    fn try_connect_fires_connected_once() {
        let (_device, connector, mut itchy) = setup();
        let connected = counter(&mut itchy, CallbackType::Connected);

        assert!(itchy.try_connect());
        assert!(itchy.try_connect());
        assert!(itchy.connected());
        assert_eq!(connected.load(Ordering::SeqCst), 1);
        assert_eq!(connector.open_attempts(), 1);
    }

    #[test]
    fn try_connect_without_device() {
        let connector = Arc::new(MockConnector::new());
        let mut itchy = Itchy::new(connector);
        assert!(!itchy.try_connect());
        assert!(!itchy.connected());
    }

    #[test]
    fn connect_with_retry_waits_for_device() {
        let (_device, connector, mut itchy) = setup();
        connector.absent_for(3);
        assert!(itchy.connect_with_retry(5, Duration::from_millis(1)));
        assert_eq!(connector.open_attempts(), 4);
    }

    #[test]
    fn connect_with_retry_gives_up() {
        let (_device, connector, mut itchy) = setup();
        connector.absent_for(10);
        assert!(!itchy.connect_with_retry(3, Duration::from_millis(1)));
        assert_eq!(connector.open_attempts(), 3);
        assert!(matches!(
            itchy.open(2, Duration::from_millis(1)),
            Err(ItchyError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn disconnect_fires_once_and_closes() {
        let (device, _connector, mut itchy) = setup();
        let disconnected = counter(&mut itchy, CallbackType::Disconnected);
        assert!(itchy.try_connect());

        itchy.disconnect();
        itchy.disconnect();
        assert!(!itchy.connected());
        assert_eq!(disconnected.load(Ordering::SeqCst), 1);
        assert_eq!(device.close_count(), 1);
    }

    #[test]
    fn commands_require_connection() {
        let (device, _connector, mut itchy) = setup();
        assert!(!itchy.set_color(Color::new(1, 2, 3)));
        assert!(!itchy.save_state());
        assert!(!itchy.start_calibration());
        assert!(!itchy.set_calibration_parameters([0.1, 0.1]));
        assert!(!itchy.set_simulation_parameters(0.1, 2000.0, 30.0, 20));
        assert!(device.write_history().is_empty());
    }

    #[test]
    fn set_color_writes_report() {
        let (device, _connector, mut itchy) = setup();
        itchy.connect();
        assert!(itchy.set_color(Color::new(255, 0, 0)));

        let writes = device.write_history();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].len(), 64);
        assert_eq!(&writes[0][..4], &[3, 255, 0, 0]);
    }

    #[test]
    fn write_failure_fires_communication_error() {
        let (device, _connector, mut itchy) = setup();
        let errors = counter(&mut itchy, CallbackType::CommunicationError);
        itchy.connect();
        device.fail_writes(true);

        assert!(!itchy.save_state());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        // a failed write does not drop the link
        assert!(itchy.connected());
    }

    #[test]
    fn zero_byte_write_is_a_failure() {
        let (device, _connector, mut itchy) = setup();
        let errors = counter(&mut itchy, CallbackType::CommunicationError);
        itchy.connect();
        device.short_writes(true);

        assert!(matches!(
            itchy.send(Command::Calibrate),
            Err(ItchyError::ShortWrite(64))
        ));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_simulation_parameters_are_not_sent() {
        let (device, _connector, mut itchy) = setup();
        let errors = counter(&mut itchy, CallbackType::CommunicationError);
        itchy.connect();

        assert!(!itchy.set_simulation_parameters(0.0, 2000.0, 30.0, 20));
        assert!(device.write_history().is_empty());
        assert_eq!(errors.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn current_state_when_disconnected_returns_cached() {
        let (_device, _connector, mut itchy) = setup();
        assert_eq!(itchy.current_state(10), DeviceState::default());
    }

    #[test]
    fn current_state_decodes_and_caches() {
        let (device, _connector, mut itchy) = setup();
        itchy.connect();
        let state = DeviceState {
            velocity: [0.5, -0.25],
            button: 1,
            time: 3.0,
            ..DeviceState::default()
        };
        device.queue_report(state.encode().to_vec());
        device.queue_timeout();

        assert_eq!(itchy.current_state(10), state);
        // timeout keeps the last state
        assert_eq!(itchy.current_state(10), state);
        assert_eq!(itchy.last_state(), state);
    }

    #[test]
    fn malformed_report_keeps_state_and_link() {
        let (device, _connector, mut itchy) = setup();
        let errors = counter(&mut itchy, CallbackType::CommunicationError);
        itchy.connect();
        device.queue_report(vec![0u8; 8]);

        assert_eq!(itchy.current_state(10), DeviceState::default());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert!(itchy.connected());
    }

    #[test]
    fn read_failure_disconnects() {
        let (device, _connector, mut itchy) = setup();
        let errors = counter(&mut itchy, CallbackType::CommunicationError);
        let disconnected = counter(&mut itchy, CallbackType::Disconnected);
        itchy.connect();

        let state = DeviceState {
            angle: 0.3,
            ..DeviceState::default()
        };
        device.queue_report(state.encode().to_vec());
        device.queue_read_error();

        assert_eq!(itchy.current_state(10), state);
        assert_eq!(itchy.current_state(10), state);
        assert!(!itchy.connected());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(disconnected.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reconnects_after_unplug() {
        let (device, _connector, mut itchy) = setup();
        itchy.connect();
        device.unplug();
        let _ = itchy.current_state(10);
        assert!(!itchy.connected());
        assert!(!itchy.try_connect());

        device.plug_in();
        assert!(itchy.try_connect());
    }

    #[test]
    fn drop_closes_transport() {
        let (device, _connector, mut itchy) = setup();
        itchy.connect();
        drop(itchy);
        assert_eq!(device.close_count(), 1);
    }
}
