//! # Error Types
//!
//! Custom error types for the DualSense driver using `thiserror`.

use thiserror::Error;

/// Main error type for the DualSense driver
#[derive(Debug, Error)]
pub enum DualSenseError {
    /// HID layer errors (open, read, write, feature reports)
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No controller matched the requested vendor/product, serial or path
    #[error("No DualSense controller found ({0})")]
    DeviceNotFound(String),

    /// `open()` was called while the polling loop is still running
    #[error("Controller is already open")]
    AlreadyOpen,

    /// Input report length does not match the active transport
    #[error("Input report length mismatch: expected {expected} bytes, got {actual}")]
    ReportLength { expected: usize, actual: usize },

    /// Feature report came back shorter than its documented size
    #[error("Feature report 0x{id:02X} too short: expected {expected} bytes, got {actual}")]
    FeatureReport { id: u8, expected: usize, actual: usize },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

impl DualSenseError {
    /// Whether this is an I/O-kind failure: the device transport, or opening
    /// and setting up the controller.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            DualSenseError::Hid(_)
                | DualSenseError::Io(_)
                | DualSenseError::DeviceNotFound(_)
                | DualSenseError::AlreadyOpen
                | DualSenseError::FeatureReport { .. }
        )
    }
}

/// Result type alias for the DualSense driver
pub type Result<T> = std::result::Result<T, DualSenseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_length_message() {
        let err = DualSenseError::ReportLength { expected: 64, actual: 12 };
        assert_eq!(
            err.to_string(),
            "Input report length mismatch: expected 64 bytes, got 12"
        );
        assert!(!err.is_io());
    }

    #[test]
    fn test_io_kind() {
        let err = DualSenseError::from(std::io::Error::new(std::io::ErrorKind::Other, "gone"));
        assert!(err.is_io());
    }

    #[test]
    fn test_open_failures_are_io_kind() {
        assert!(DualSenseError::AlreadyOpen.is_io());
        assert!(DualSenseError::DeviceNotFound("any".to_string()).is_io());
        assert!(DualSenseError::FeatureReport { id: 0x09, expected: 20, actual: 2 }.is_io());
    }

    #[test]
    fn test_config_is_not_io_kind() {
        let err = toml::from_str::<toml::Value>("[broken").unwrap_err();
        assert!(!DualSenseError::from(err).is_io());
    }
}
