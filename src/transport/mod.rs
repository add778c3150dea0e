//! # HID Transport Module
//!
//! Finds and opens DualSense controllers through `hidapi`.
//!
//! This module handles:
//! - Enumerating controllers by vendor/product id
//! - Selecting one by device path or serial number
//! - Blocking reads with a timeout, writes and feature reports

pub mod hid_trait;

pub use hid_trait::{HidTransport, TransportInfo};

use std::ffi::CString;

use hidapi::{HidApi, HidDevice};
use tracing::{debug, info};

use crate::error::{DualSenseError, Result};
use crate::report::protocol::{FeatureReport, PRODUCT_ID, VENDOR_ID};

/// Which controller to open when several are attached
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSelector {
    pub serial_number: Option<String>,
    /// Takes precedence over `serial_number` when both are set
    pub path: Option<String>,
}

impl DeviceSelector {
    /// Whether `candidate` satisfies this selector
    pub fn matches(&self, candidate: &TransportInfo) -> bool {
        if let Some(path) = &self.path {
            return candidate.path == *path;
        }
        if let Some(serial) = &self.serial_number {
            return candidate.serial_number.as_deref() == Some(serial.as_str());
        }
        true
    }
}

impl std::fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.path, &self.serial_number) {
            (Some(path), _) => write!(f, "path {}", path),
            (None, Some(serial)) => write!(f, "serial {}", serial),
            (None, None) => write!(f, "{:04x}:{:04x}", VENDOR_ID, PRODUCT_ID),
        }
    }
}

fn transport_info(device: &hidapi::DeviceInfo) -> TransportInfo {
    TransportInfo {
        path: device.path().to_string_lossy().into_owned(),
        serial_number: device.serial_number().map(str::to_owned),
        interface_number: device.interface_number(),
    }
}

/// Keep the DualSense entries of a device listing that satisfy `selector`,
/// in listing order.
fn select_controllers<I>(devices: I, selector: &DeviceSelector) -> Vec<TransportInfo>
where
    I: IntoIterator<Item = (u16, u16, TransportInfo)>,
{
    devices
        .into_iter()
        .filter(|(vendor_id, product_id, _)| *vendor_id == VENDOR_ID && *product_id == PRODUCT_ID)
        .map(|(_, _, info)| info)
        .filter(|info| selector.matches(info))
        .collect()
}

fn list_controllers(api: &HidApi, selector: &DeviceSelector) -> Vec<TransportInfo> {
    select_controllers(
        api.device_list()
            .map(|d| (d.vendor_id(), d.product_id(), transport_info(d))),
        selector,
    )
}

/// List every attached controller matching `selector`
///
/// # Errors
///
/// Returns error if the HID library cannot be initialised
pub fn enumerate(selector: &DeviceSelector) -> Result<Vec<TransportInfo>> {
    let api = HidApi::new()?;
    Ok(list_controllers(&api, selector))
}

/// Production transport backed by a `hidapi` device handle
pub struct HidapiTransport {
    device: HidDevice,
    info: TransportInfo,
}

impl std::fmt::Debug for HidapiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidapiTransport")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl HidapiTransport {
    /// Open the first controller matching `selector`
    ///
    /// # Arguments
    ///
    /// * `selector` - Device path or serial number filter; empty opens the
    ///   first controller found
    ///
    /// # Returns
    ///
    /// * `Result<HidapiTransport>` - Opened device
    ///
    /// # Errors
    ///
    /// Returns error if no controller matches or the device cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dualsense_link::transport::{DeviceSelector, HidapiTransport, HidTransport};
    ///
    /// let transport = HidapiTransport::open(&DeviceSelector::default())?;
    /// println!("Opened {}", transport.info().path);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(selector: &DeviceSelector) -> Result<Self> {
        let api = HidApi::new()?;

        let info = list_controllers(&api, selector)
            .into_iter()
            .next()
            .ok_or_else(|| DualSenseError::DeviceNotFound(selector.to_string()))?;

        debug!("Opening controller at {}", info.path);

        let c_path = CString::new(info.path.clone()).map_err(|e| {
            DualSenseError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;
        let device = api.open_path(&c_path)?;

        info!(
            "Opened controller at {} (interface {})",
            info.path, info.interface_number
        );
        Ok(Self { device, info })
    }
}

impl HidTransport for HidapiTransport {
    fn info(&self) -> &TransportInfo {
        &self.info
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize> {
        Ok(self.device.read_timeout(buf, timeout_ms)?)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.device.write(data)?)
    }

    fn get_feature_report(&mut self, report: FeatureReport) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; report.length];
        buf[0] = report.id;
        let n = self.device.get_feature_report(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }
}

impl Drop for HidapiTransport {
    fn drop(&mut self) {
        debug!("Closing controller at {}", self.info.path);
    }
}
