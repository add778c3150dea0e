//! # Report Codec
//!
//! Binary layout of the DualSense HID reports.
//!
//! This module handles:
//! - Input report decoding into a typed snapshot and component updates
//! - Output report encoding from dirty component state
//! - Bluetooth framing (sub-header and CRC32 trailer)

pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod protocol;

pub use decoder::{apply_input_report, decode, parse_input_report, InputReport};
pub use encoder::encode_output_report;
pub use protocol::TransportMode;
