//! hidapi backend

use crate::{DeviceConnector, HidDeviceInfo, HidError, HidResult, HidTransport};
use hidapi::{HidApi, HidDevice};
use itchy_protocol::{DeviceIdentifier, REPORT_LEN};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// The firmware does not use numbered reports; hidapi expects a leading 0.
const NO_REPORT_ID: u8 = 0x00;

/// Opens ITCHy interfaces through hidapi.
///
/// The `HidApi` context is created on first use and re-enumerated on every
/// call, so devices plugged in later are found.
#[derive(Default)]
pub struct HidApiConnector {
    api: Mutex<Option<HidApi>>,
}

impl HidApiConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_api<T>(&self, f: impl FnOnce(&HidApi) -> HidResult<T>) -> HidResult<T> {
        let mut guard = self.api.lock();
        match guard.as_mut() {
            Some(api) => api
                .refresh_devices()
                .map_err(|e| HidError::Backend(e.to_string()))?,
            None => {
                *guard = Some(HidApi::new().map_err(|e| HidError::Backend(e.to_string()))?);
            }
        }
        match guard.as_ref() {
            Some(api) => f(api),
            None => Err(HidError::Backend("HID API not initialized".to_string())),
        }
    }
}

fn to_info(device: &hidapi::DeviceInfo) -> HidDeviceInfo {
    HidDeviceInfo {
        vendor_id: device.vendor_id(),
        product_id: device.product_id(),
        usage_page: device.usage_page(),
        usage: device.usage(),
        serial_number: device.serial_number().map(str::to_string),
        manufacturer: device.manufacturer_string().map(str::to_string),
        product_name: device.product_string().map(str::to_string),
        path: device.path().to_string_lossy().into_owned(),
    }
}

impl DeviceConnector for HidApiConnector {
    fn list(&self) -> HidResult<Vec<HidDeviceInfo>> {
        self.with_api(|api| Ok(api.device_list().map(to_info).collect()))
    }

    fn open(&self, id: &DeviceIdentifier) -> HidResult<Option<Box<dyn HidTransport>>> {
        self.with_api(|api| {
            let Some(candidate) = api
                .device_list()
                .find(|d| id.matches(d.vendor_id(), d.product_id(), d.usage_page(), d.usage()))
            else {
                return Ok(None);
            };

            let info = to_info(candidate);
            let device = candidate
                .open_device(api)
                .map_err(|e| HidError::OpenError(format!("{}: {e}", info.path)))?;
            debug!(path = %info.path, "Opened raw HID interface");
            Ok(Some(
                Box::new(HidApiTransport::new(device, info)) as Box<dyn HidTransport>
            ))
        })
    }
}

pub struct HidApiTransport {
    device: Option<HidDevice>,
    info: HidDeviceInfo,
}

impl HidApiTransport {
    pub fn new(device: HidDevice, info: HidDeviceInfo) -> Self {
        Self {
            device: Some(device),
            info,
        }
    }
}

impl HidTransport for HidApiTransport {
    fn write_report(&mut self, data: &[u8]) -> HidResult<usize> {
        let device = self.device.as_ref().ok_or(HidError::Disconnected)?;
        let mut frame = Vec::with_capacity(data.len().saturating_add(1));
        frame.push(NO_REPORT_ID);
        frame.extend_from_slice(data);

        let written = device
            .write(&frame)
            .map_err(|e| HidError::WriteError(e.to_string()))?;
        // The report id byte is counted by some platforms and not others.
        Ok(written.min(data.len()))
    }

    fn read_report(&mut self, timeout_ms: u32) -> HidResult<Option<Vec<u8>>> {
        let device = self.device.as_ref().ok_or(HidError::Disconnected)?;
        let mut buf = [0u8; REPORT_LEN];
        let timeout = i32::try_from(timeout_ms).unwrap_or(i32::MAX);
        match device.read_timeout(&mut buf, timeout) {
            Ok(0) => Ok(None),
            Ok(n) => Ok(buf.get(..n).map(<[u8]>::to_vec)),
            Err(e) => {
                warn!(path = %self.info.path, error = %e, "HID read failed");
                Err(HidError::ReadError(e.to_string()))
            }
        }
    }

    fn device_info(&self) -> &HidDeviceInfo {
        &self.info
    }

    fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    fn close(&mut self) -> HidResult<()> {
        if self.device.take().is_some() {
            debug!(path = %self.info.path, "Closed raw HID interface");
        }
        Ok(())
    }
}
