//! Trait abstraction for HID device operations to enable testing

use crate::error::Result;
use crate::report::protocol::FeatureReport;

/// Identity of an opened HID device
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportInfo {
    /// Platform device path
    pub path: String,
    pub serial_number: Option<String>,
    /// USB interface number; negative when the device is not behind a USB
    /// interface (Bluetooth)
    pub interface_number: i32,
}

/// Trait for HID device I/O operations
///
/// Dropping the transport closes the device.
pub trait HidTransport: Send {
    /// Device the transport is bound to
    fn info(&self) -> &TransportInfo;

    /// Read one input report. Returns `Ok(0)` when nothing arrived within
    /// `timeout_ms`.
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize>;

    /// Write one output report, report id included
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Fetch a feature report. The returned bytes start with the report id
    /// and may be shorter than `report.length`.
    fn get_feature_report(&mut self, report: FeatureReport) -> Result<Vec<u8>>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::error::DualSenseError;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};
    use std::io;
    use std::sync::Arc;
    use std::time::Duration;

    /// One scripted answer to `read_timeout`
    #[derive(Debug, Clone)]
    pub enum ReadStep {
        Report(Vec<u8>),
        Timeout,
        Error(io::ErrorKind),
    }

    #[derive(Debug, Default)]
    pub struct MockState {
        pub reads: VecDeque<ReadStep>,
        pub written: Vec<Vec<u8>>,
        pub feature_reports: HashMap<u8, Vec<u8>>,
        pub feature_error: Option<io::ErrorKind>,
        pub write_error: Option<io::ErrorKind>,
        pub feature_delay: Option<Duration>,
        pub dropped: bool,
    }

    /// Scripted HID device.
    ///
    /// Clones share state, so a test keeps one clone to inspect what the
    /// session wrote after handing the other over.
    #[derive(Debug, Clone)]
    pub struct MockTransport {
        info: TransportInfo,
        pub state: Arc<Mutex<MockState>>,
    }

    impl MockTransport {
        pub fn new(interface_number: i32) -> Self {
            Self {
                info: TransportInfo {
                    path: "mock-hid".to_string(),
                    serial_number: Some("mock-serial".to_string()),
                    interface_number,
                },
                state: Arc::new(Mutex::new(MockState::default())),
            }
        }

        /// USB device answering every feature report with `0x11` filler.
        pub fn usb() -> Self {
            let mock = Self::new(3);
            mock.set_default_feature_reports();
            mock
        }

        pub fn set_default_feature_reports(&self) {
            use crate::report::protocol::{
                FEATURE_REPORT_CALIBRATION, FEATURE_REPORT_FIRMWARE, FEATURE_REPORT_PAIRING,
            };
            for report in [
                FEATURE_REPORT_CALIBRATION,
                FEATURE_REPORT_PAIRING,
                FEATURE_REPORT_FIRMWARE,
            ] {
                let mut bytes = vec![0x11u8; report.length];
                bytes[0] = report.id;
                self.set_feature_report(report.id, bytes);
            }
        }

        pub fn set_feature_report(&self, id: u8, bytes: Vec<u8>) {
            self.state.lock().feature_reports.insert(id, bytes);
        }

        pub fn push_read(&self, step: ReadStep) {
            self.state.lock().reads.push_back(step);
        }

        pub fn set_write_error(&self, error: io::ErrorKind) {
            self.state.lock().write_error = Some(error);
        }

        pub fn set_feature_error(&self, error: io::ErrorKind) {
            self.state.lock().feature_error = Some(error);
        }

        /// Make every feature report read block for `delay`, holding the
        /// session in `Opening`.
        pub fn set_feature_delay(&self, delay: Duration) {
            self.state.lock().feature_delay = Some(delay);
        }

        pub fn get_written_data(&self) -> Vec<Vec<u8>> {
            self.state.lock().written.clone()
        }

        pub fn dropped(&self) -> bool {
            self.state.lock().dropped
        }
    }

    impl HidTransport for MockTransport {
        fn info(&self) -> &TransportInfo {
            &self.info
        }

        fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize> {
            let step = self.state.lock().reads.pop_front();
            match step {
                Some(ReadStep::Report(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Some(ReadStep::Error(kind)) => {
                    Err(DualSenseError::Io(io::Error::new(kind, "Mock read error")))
                }
                Some(ReadStep::Timeout) | None => {
                    // Stand in for the blocking wait without slowing tests down
                    let wait = timeout_ms.clamp(0, 5) as u64;
                    std::thread::sleep(Duration::from_millis(wait));
                    Ok(0)
                }
            }
        }

        fn write(&mut self, data: &[u8]) -> Result<usize> {
            let mut state = self.state.lock();
            if let Some(kind) = state.write_error {
                return Err(DualSenseError::Io(io::Error::new(kind, "Mock write error")));
            }
            state.written.push(data.to_vec());
            Ok(data.len())
        }

        fn get_feature_report(&mut self, report: FeatureReport) -> Result<Vec<u8>> {
            let delay = self.state.lock().feature_delay;
            if let Some(delay) = delay {
                std::thread::sleep(delay);
            }
            let state = self.state.lock();
            if let Some(kind) = state.feature_error {
                return Err(DualSenseError::Io(io::Error::new(kind, "Mock feature report error")));
            }
            Ok(state
                .feature_reports
                .get(&report.id)
                .cloned()
                .unwrap_or_else(|| vec![report.id]))
        }
    }

    impl Drop for MockTransport {
        fn drop(&mut self) {
            // Tests hold the other clone; the one handed over is the device
            self.state.lock().dropped = true;
        }
    }
}
