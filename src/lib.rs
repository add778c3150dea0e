//! # DualSense Link Library
//!
//! Driver for the PS5 DualSense controller over USB or Bluetooth HID.
//!
//! This library decodes input reports into edge-triggered component state
//! (buttons, d-pad, sticks, touchpad, triggers, gyroscope, battery) and
//! encodes output reports (rumble, LEDs, adaptive triggers, audio) from
//! dirty-tracked component state, on a dedicated polling thread per
//! controller.

pub mod components;
pub mod config;
pub mod error;
pub mod event;
pub mod report;
pub mod session;
pub mod transport;

pub use error::{DualSenseError, Result};
pub use session::{DualSense, SessionOptions, SessionState};
