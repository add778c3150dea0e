//! # Input Report Decoder
//!
//! Turns a raw input report into an [`InputReport`] snapshot and applies it
//! to the input components.

use super::protocol::*;
use crate::components::{Inputs, TouchReport};
use crate::error::{DualSenseError, Result};

/// Decoded contents of one input report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputReport {
    /// Raw `(x, y)` bytes, 127 is centre
    pub left_stick: (u8, u8),
    pub right_stick: (u8, u8),
    pub left_trigger: u8,
    pub right_trigger: u8,

    pub square: bool,
    pub cross: bool,
    pub circle: bool,
    pub triangle: bool,
    /// D-pad code (0-8, 8 = released)
    pub dpad: u8,

    pub left_bumper: bool,
    pub right_bumper: bool,
    pub share: bool,
    pub options: bool,
    pub left_stick_click: bool,
    pub right_stick_click: bool,

    pub ps: bool,
    pub touchpad_click: bool,
    pub mic: bool,

    /// `(roll, pitch, yaw)`
    pub gyroscope: (i16, i16, i16),
    pub touch_1: TouchReport,
    pub touch_2: TouchReport,
    /// Battery status byte
    pub status: u8,
}

/// Parse a raw input report
///
/// # Arguments
///
/// * `report` - Report bytes as read from the device, report id included
/// * `mode` - Transport the report arrived on
///
/// # Returns
///
/// * `Result<InputReport>` - Decoded snapshot
///
/// # Errors
///
/// Returns [`DualSenseError::ReportLength`] if the buffer is not exactly the
/// size expected for `mode`.
pub fn parse_input_report(report: &[u8], mode: TransportMode) -> Result<InputReport> {
    let expected = mode.report_length();
    if report.len() != expected {
        return Err(DualSenseError::ReportLength {
            expected,
            actual: report.len(),
        });
    }

    // Bluetooth carries one extra byte after the report id
    let data = match mode {
        TransportMode::Usb => report,
        TransportMode::Bluetooth => &report[1..],
    };

    let symbols = data[IN_SYMBOL_BUTTONS];
    let top = data[IN_TOP_BUTTONS];
    let system = data[IN_SYSTEM_BUTTONS];

    Ok(InputReport {
        left_stick: (data[IN_LEFT_STICK_X], data[IN_LEFT_STICK_Y]),
        right_stick: (data[IN_RIGHT_STICK_X], data[IN_RIGHT_STICK_Y]),
        left_trigger: data[IN_LEFT_TRIGGER],
        right_trigger: data[IN_RIGHT_TRIGGER],

        square: symbols & BTN_SQUARE != 0,
        cross: symbols & BTN_CROSS != 0,
        circle: symbols & BTN_CIRCLE != 0,
        triangle: symbols & BTN_TRIANGLE != 0,
        dpad: symbols & DPAD_MASK,

        left_bumper: top & BTN_L1 != 0,
        right_bumper: top & BTN_R1 != 0,
        share: top & BTN_SHARE != 0,
        options: top & BTN_OPTIONS != 0,
        left_stick_click: top & BTN_L3 != 0,
        right_stick_click: top & BTN_R3 != 0,

        ps: system & BTN_PS != 0,
        touchpad_click: system & BTN_TOUCHPAD != 0,
        mic: system & BTN_MIC != 0,

        gyroscope: (
            read_i16_le(data, IN_GYRO_ROLL),
            read_i16_le(data, IN_GYRO_PITCH),
            read_i16_le(data, IN_GYRO_YAW),
        ),
        touch_1: parse_touch_point(&data[IN_TOUCH_POINT_1..IN_TOUCH_POINT_1 + 4]),
        touch_2: parse_touch_point(&data[IN_TOUCH_POINT_2..IN_TOUCH_POINT_2 + 4]),
        status: data[IN_STATUS],
    })
}

/// Unpack a 4-byte touch point: id/active byte, then 12-bit x and y.
fn parse_touch_point(bytes: &[u8]) -> TouchReport {
    TouchReport {
        id: bytes[0] & TOUCH_ID_MASK,
        active: bytes[0] & TOUCH_INACTIVE_BIT == 0,
        x: ((bytes[2] as u16 & 0x0f) << 8) | bytes[1] as u16,
        y: ((bytes[3] as u16) << 4) | ((bytes[2] as u16 & 0xf0) >> 4),
    }
}

fn read_i16_le(data: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Push a decoded snapshot into the input components.
///
/// Components fire their callbacks from here, on the calling thread.
pub fn apply_input_report(report: &InputReport, inputs: &Inputs) {
    inputs.square.update(report.square);
    inputs.cross.update(report.cross);
    inputs.circle.update(report.circle);
    inputs.triangle.update(report.triangle);
    inputs.dpad.update(report.dpad);

    inputs.share.update(report.share);
    inputs.options.update(report.options);
    inputs.ps.update(report.ps);
    inputs.mic_button.update(report.mic);
    inputs.left_bumper.update(report.left_bumper);
    inputs.right_bumper.update(report.right_bumper);

    inputs.left_trigger.update(report.left_trigger);
    inputs.right_trigger.update(report.right_trigger);

    let (lx, ly) = report.left_stick;
    inputs.left_stick.update(report.left_stick_click, lx, ly);
    let (rx, ry) = report.right_stick;
    inputs.right_stick.update(report.right_stick_click, rx, ry);

    inputs
        .touchpad
        .update(report.touchpad_click, report.touch_1, report.touch_2);

    let (roll, pitch, yaw) = report.gyroscope;
    inputs.gyroscope.update(roll, pitch, yaw);

    inputs.battery.update(report.status);
}

/// Parse `report` and apply it to `inputs`.
///
/// # Errors
///
/// Returns [`DualSenseError::ReportLength`] on a mis-sized report; no
/// component is touched in that case.
pub fn decode(report: &[u8], mode: TransportMode, inputs: &Inputs) -> Result<InputReport> {
    let parsed = parse_input_report(report, mode)?;
    apply_input_report(&parsed, inputs);
    Ok(parsed)
}
