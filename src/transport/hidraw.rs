//! # Hidraw Transport
//!
//! Exchanges configuration reports with the gamepad MCU as HID feature
//! reports on a Linux hidraw node.
//!
//! This module handles:
//! - Opening the hidraw node (first usable path wins)
//! - Sending one 64-byte feature report
//! - Fetching the 64-byte feature report that answers it
//!
//! hidapi calls block, so every exchange runs on the blocking pool.

use std::ffi::CString;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hidapi::{HidApi, HidDevice};
use tracing::{debug, info, warn};

use super::port_trait::Transport;
use crate::error::{AllyError, Result, TransportError};
use crate::hid::protocol::{REPORT_ID, REPORT_SIZE};

/// Blocking feature-report access to a HID device
pub trait FeatureReports: Send + 'static {
    /// Send `report`; its first byte is the report id
    fn send_feature(&self, report: &[u8]) -> std::result::Result<(), TransportError>;

    /// Fetch the feature report whose id is in `buf[0]`, returning its length
    fn get_feature(&self, buf: &mut [u8]) -> std::result::Result<usize, TransportError>;
}

impl FeatureReports for HidDevice {
    fn send_feature(&self, report: &[u8]) -> std::result::Result<(), TransportError> {
        self.send_feature_report(report)
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    fn get_feature(&self, buf: &mut [u8]) -> std::result::Result<usize, TransportError> {
        self.get_feature_report(buf)
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}

/// Hidraw report channel
///
/// Generic over the device so tests can run it against a fake.
pub struct HidrawTransport<D = HidDevice> {
    device: Arc<Mutex<D>>,
    device_path: String,
}

impl<D> std::fmt::Debug for HidrawTransport<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidrawTransport")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl HidrawTransport<HidDevice> {
    /// Open a hidraw node
    ///
    /// # Arguments
    ///
    /// * `api` - hidapi context
    /// * `path` - Device path (e.g., "/dev/hidraw3")
    ///
    /// # Errors
    ///
    /// Returns [`AllyError::Hid`] if the node cannot be opened
    pub fn open(api: &HidApi, path: &str) -> Result<Self> {
        let c_path = CString::new(path)
            .map_err(|e| TransportError::Io(format!("invalid device path {path:?}: {e}")))?;
        let device = api.open_path(&c_path)?;
        Ok(Self::from_device(device, path))
    }

    /// Open the first usable node out of `paths`
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try, in order
    ///
    /// # Returns
    ///
    /// * `Result<HidrawTransport>` - Opened transport or [`AllyError::DeviceNotFound`]
    pub fn open_with_paths(paths: &[&str]) -> Result<Self> {
        let api = match HidApi::new_without_enumerate() {
            Ok(api) => api,
            Err(e) => {
                warn!("Failed to initialize hidapi: {}", e);
                return Err(AllyError::DeviceNotFound(paths.join(", ")));
            }
        };

        for path in paths {
            debug!("Trying to open hidraw node: {}", path);

            match Self::open(&api, path) {
                Ok(transport) => {
                    info!("Opened gamepad configuration endpoint at {}", path);
                    return Ok(transport);
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(AllyError::DeviceNotFound(paths.join(", ")))
    }
}

impl<D> HidrawTransport<D> {
    pub fn from_device(device: D, device_path: &str) -> Self {
        Self {
            device: Arc::new(Mutex::new(device)),
            device_path: device_path.to_string(),
        }
    }

    /// Path of the opened node
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

fn exchange<D: FeatureReports>(
    device: &Mutex<D>,
    report: &[u8],
) -> std::result::Result<Vec<u8>, TransportError> {
    let device = device
        .lock()
        .map_err(|_| TransportError::Io("hidraw device lock poisoned".to_string()))?;
    device.send_feature(report)?;

    let mut response = vec![0u8; REPORT_SIZE];
    response[0] = REPORT_ID;
    let read = device.get_feature(&mut response)?;
    if read < REPORT_SIZE {
        return Err(TransportError::Io(format!(
            "short feature report: {read} of {REPORT_SIZE} bytes"
        )));
    }
    Ok(response)
}

#[async_trait]
impl<D: FeatureReports> Transport for HidrawTransport<D> {
    async fn send(&mut self, report: &[u8]) -> std::result::Result<Vec<u8>, TransportError> {
        let device = Arc::clone(&self.device);
        let request = report.to_vec();
        let response = tokio::task::spawn_blocking(move || exchange(&device, &request))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))??;
        debug!("Exchanged report ({} bytes) with {}", report.len(), self.device_path);
        Ok(response)
    }
}
