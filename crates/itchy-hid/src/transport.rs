//! Transport traits

use crate::{HidDeviceInfo, HidResult};
use itchy_protocol::DeviceIdentifier;

/// An open raw HID interface.
pub trait HidTransport: Send {
    /// Send one output report. Returns the number of bytes written.
    fn write_report(&mut self, data: &[u8]) -> HidResult<usize>;

    /// Wait up to `timeout_ms` for one input report. `Ok(None)` means the
    /// timeout elapsed without data.
    fn read_report(&mut self, timeout_ms: u32) -> HidResult<Option<Vec<u8>>>;

    fn device_info(&self) -> &HidDeviceInfo;

    fn is_connected(&self) -> bool;

    fn close(&mut self) -> HidResult<()>;
}

/// Finds and opens interfaces.
pub trait DeviceConnector: Send + Sync {
    fn list(&self) -> HidResult<Vec<HidDeviceInfo>>;

    /// Open the first interface matching `id`. `Ok(None)` means no such
    /// device is attached.
    fn open(&self, id: &DeviceIdentifier) -> HidResult<Option<Box<dyn HidTransport>>>;
}

pub mod mock {
    use super::*;
    use crate::HidError;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone)]
    enum MockRead {
        Report(Vec<u8>),
        Timeout,
        Error,
    }

    #[derive(Debug, Default)]
    struct MockState {
        reads: VecDeque<MockRead>,
        writes: Vec<Vec<u8>>,
        fail_writes: bool,
        short_writes: bool,
        unplugged: bool,
        closes: u32,
    }

    /// Shared handle to a scripted device. Transports opened from it see the
    /// same read queue and write history.
    #[derive(Debug, Clone)]
    pub struct MockDevice {
        info: HidDeviceInfo,
        state: Arc<Mutex<MockState>>,
    }

    impl MockDevice {
        pub fn new(info: HidDeviceInfo) -> Self {
            Self {
                info,
                state: Arc::new(Mutex::new(MockState::default())),
            }
        }

        /// A device answering to the default ITCHy identifier.
        pub fn itchy() -> Self {
            Self::new(HidDeviceInfo::for_identifier(
                &DeviceIdentifier::default(),
                "/dev/hidraw0",
            ))
        }

        pub fn info(&self) -> &HidDeviceInfo {
            &self.info
        }

        pub fn queue_report(&self, data: impl Into<Vec<u8>>) {
            self.state.lock().reads.push_back(MockRead::Report(data.into()));
        }

        pub fn queue_timeout(&self) {
            self.state.lock().reads.push_back(MockRead::Timeout);
        }

        pub fn queue_read_error(&self) {
            self.state.lock().reads.push_back(MockRead::Error);
        }

        pub fn write_history(&self) -> Vec<Vec<u8>> {
            self.state.lock().writes.clone()
        }

        pub fn clear_write_history(&self) {
            self.state.lock().writes.clear();
        }

        pub fn fail_writes(&self, fail: bool) {
            self.state.lock().fail_writes = fail;
        }

        /// Make writes report zero bytes written.
        pub fn short_writes(&self, short: bool) {
            self.state.lock().short_writes = short;
        }

        pub fn unplug(&self) {
            self.state.lock().unplugged = true;
        }

        pub fn plug_in(&self) {
            self.state.lock().unplugged = false;
        }

        pub fn is_plugged_in(&self) -> bool {
            !self.state.lock().unplugged
        }

        pub fn close_count(&self) -> u32 {
            self.state.lock().closes
        }

        pub fn transport(&self) -> MockTransport {
            MockTransport {
                info: self.info.clone(),
                state: Arc::clone(&self.state),
                open: true,
            }
        }
    }

    pub struct MockTransport {
        info: HidDeviceInfo,
        state: Arc<Mutex<MockState>>,
        open: bool,
    }

    impl HidTransport for MockTransport {
        fn write_report(&mut self, data: &[u8]) -> HidResult<usize> {
            let mut state = self.state.lock();
            if !self.open || state.unplugged {
                return Err(HidError::Disconnected);
            }
            if state.fail_writes {
                return Err(HidError::WriteError("scripted write failure".to_string()));
            }
            state.writes.push(data.to_vec());
            if state.short_writes {
                return Ok(0);
            }
            Ok(data.len())
        }

        fn read_report(&mut self, _timeout_ms: u32) -> HidResult<Option<Vec<u8>>> {
            let mut state = self.state.lock();
            if !self.open || state.unplugged {
                return Err(HidError::Disconnected);
            }
            match state.reads.pop_front() {
                Some(MockRead::Report(data)) => Ok(Some(data)),
                Some(MockRead::Timeout) | None => Ok(None),
                Some(MockRead::Error) => {
                    Err(HidError::ReadError("scripted read failure".to_string()))
                }
            }
        }

        fn device_info(&self) -> &HidDeviceInfo {
            &self.info
        }

        fn is_connected(&self) -> bool {
            self.open && !self.state.lock().unplugged
        }

        fn close(&mut self) -> HidResult<()> {
            if self.open {
                self.open = false;
                self.state.lock().closes += 1;
            }
            Ok(())
        }
    }

    /// Connector over a fixed set of mock devices.
    #[derive(Default)]
    pub struct MockConnector {
        devices: Mutex<Vec<MockDevice>>,
        absent_for: AtomicU32,
        open_attempts: AtomicU32,
    }

    impl MockConnector {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_device(device: MockDevice) -> Self {
            let connector = Self::new();
            connector.add_device(device);
            connector
        }

        pub fn add_device(&self, device: MockDevice) {
            self.devices.lock().push(device);
        }

        pub fn device_count(&self) -> usize {
            self.devices.lock().len()
        }

        /// Report "no device" for the next `attempts` calls to `open`.
        pub fn absent_for(&self, attempts: u32) {
            self.absent_for.store(attempts, Ordering::SeqCst);
        }

        pub fn open_attempts(&self) -> u32 {
            self.open_attempts.load(Ordering::SeqCst)
        }
    }

    impl DeviceConnector for MockConnector {
        fn list(&self) -> HidResult<Vec<HidDeviceInfo>> {
            Ok(self
                .devices
                .lock()
                .iter()
                .filter(|d| d.is_plugged_in())
                .map(|d| d.info.clone())
                .collect())
        }

        fn open(&self, id: &DeviceIdentifier) -> HidResult<Option<Box<dyn HidTransport>>> {
            self.open_attempts.fetch_add(1, Ordering::SeqCst);
            let absent = self
                .absent_for
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if absent {
                return Ok(None);
            }

            let devices = self.devices.lock();
            Ok(devices
                .iter()
                .find(|d| d.is_plugged_in() && d.info.matches(id))
                .map(|d| Box::new(d.transport()) as Box<dyn HidTransport>))
        }
    }
}
