//! # DualSense Protocol Constants and Types
//!
//! Report identifiers, lengths, byte offsets and flag bits for the DualSense
//! input and output reports.
//!
//! All offsets below are relative to the "common" layout, i.e. the USB layout.
//! Bluetooth input reports carry one extra byte after the report id and
//! Bluetooth output reports carry a two byte sub-header after the report id;
//! the decoder and encoder apply those shifts.

use bitflags::bitflags;

/// Sony vendor ID
pub const VENDOR_ID: u16 = 0x054c;

/// DualSense product ID (wired and Bluetooth)
pub const PRODUCT_ID: u16 = 0x0ce6;

/// Input report length over USB
pub const USB_REPORT_LENGTH: usize = 64;

/// Input report length over Bluetooth
pub const BLUETOOTH_REPORT_LENGTH: usize = 78;

/// Output report id over USB
pub const USB_OUTPUT_REPORT_ID: u8 = 0x02;

/// Output report id over Bluetooth
pub const BLUETOOTH_OUTPUT_REPORT_ID: u8 = 0x31;

/// Sub-header inserted after the report id in Bluetooth output reports
pub const BLUETOOTH_OUTPUT_SUBHEADER: [u8; 2] = [0x00, 0x10];

/// Length of the CRC32 trailer on Bluetooth output reports
pub const CRC32_TRAILER_LENGTH: usize = 4;

/// Feature report carrying IMU calibration data
pub const FEATURE_REPORT_CALIBRATION: FeatureReport = FeatureReport { id: 0x05, length: 41 };

/// Feature report carrying the pairing information (MAC address)
pub const FEATURE_REPORT_PAIRING: FeatureReport = FeatureReport { id: 0x09, length: 20 };

/// Feature report carrying hardware and firmware versions
pub const FEATURE_REPORT_FIRMWARE: FeatureReport = FeatureReport { id: 0x20, length: 64 };

/// Identifier and size of a feature report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureReport {
    pub id: u8,
    pub length: usize,
}

// Input report offsets (common layout)
pub const IN_LEFT_STICK_X: usize = 1;
pub const IN_LEFT_STICK_Y: usize = 2;
pub const IN_RIGHT_STICK_X: usize = 3;
pub const IN_RIGHT_STICK_Y: usize = 4;
pub const IN_LEFT_TRIGGER: usize = 5;
pub const IN_RIGHT_TRIGGER: usize = 6;
pub const IN_SYMBOL_BUTTONS: usize = 8;
pub const IN_TOP_BUTTONS: usize = 9;
pub const IN_SYSTEM_BUTTONS: usize = 10;
pub const IN_GYRO_ROLL: usize = 22;
pub const IN_GYRO_PITCH: usize = 24;
pub const IN_GYRO_YAW: usize = 26;
pub const IN_TOUCH_POINT_1: usize = 33;
pub const IN_TOUCH_POINT_2: usize = 37;
pub const IN_STATUS: usize = 53;

// Symbol button byte
pub const BTN_SQUARE: u8 = 0x10;
pub const BTN_CROSS: u8 = 0x20;
pub const BTN_CIRCLE: u8 = 0x40;
pub const BTN_TRIANGLE: u8 = 0x80;
pub const DPAD_MASK: u8 = 0x0f;

// Top button byte
pub const BTN_L1: u8 = 0x01;
pub const BTN_R1: u8 = 0x02;
pub const BTN_SHARE: u8 = 0x10;
pub const BTN_OPTIONS: u8 = 0x20;
pub const BTN_L3: u8 = 0x40;
pub const BTN_R3: u8 = 0x80;

// System button byte
pub const BTN_PS: u8 = 0x01;
pub const BTN_TOUCHPAD: u8 = 0x02;
pub const BTN_MIC: u8 = 0x04;

/// Touch point byte 0: set while the finger is NOT touching
pub const TOUCH_INACTIVE_BIT: u8 = 0x80;
/// Touch point byte 0: finger id
pub const TOUCH_ID_MASK: u8 = 0x7f;

// Output report offsets (common layout)
pub const OUT_FLAGS_1: usize = 1;
pub const OUT_FLAGS_2: usize = 2;
pub const OUT_RUMBLE_RIGHT: usize = 3;
pub const OUT_RUMBLE_LEFT: usize = 4;
pub const OUT_HEADSET_VOLUME: usize = 5;
pub const OUT_SPEAKER_VOLUME: usize = 6;
pub const OUT_MIC_VOLUME: usize = 7;
pub const OUT_AUDIO_ENABLE: usize = 8;
pub const OUT_MIC_LED: usize = 9;
pub const OUT_AUDIO_MUTE: usize = 10;
pub const OUT_RIGHT_TRIGGER: usize = 11;
pub const OUT_LEFT_TRIGGER: usize = 22;
pub const OUT_LED_SETUP: usize = 39;
pub const OUT_TOUCHPAD_LED_MODE: usize = 42;
pub const OUT_BRIGHTNESS: usize = 43;
pub const OUT_PLAYER_LEDS: usize = 44;
pub const OUT_TOUCHPAD_RGB: usize = 45;

/// Size of one trigger effect block (mode, start, end, force)
pub const TRIGGER_EFFECT_LENGTH: usize = 4;

bitflags! {
    /// Validity flags in output byte 1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UpdateFlags1: u8 {
        /// Both bits are required for the rumble motors to react
        const RUMBLE = 0x01 | 0x02;
        const RIGHT_TRIGGER = 0x04;
        const LEFT_TRIGGER = 0x08;
        const HEADSET_VOLUME = 0x10;
        const SPEAKER_VOLUME = 0x20;
        const MICROPHONE_VOLUME = 0x40;
        const AUDIO_ROUTING = 0x80;
    }
}

bitflags! {
    /// Validity flags in output byte 2.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UpdateFlags2: u8 {
        const MICROPHONE_LED = 0x01;
        const AUDIO_MUTE = 0x02;
        const TOUCHPAD_LED = 0x04;
        /// Clears every stored LED value on the controller; never sent.
        const ALL_LEDS_OFF = 0x08;
        const PLAYER_LEDS = 0x10;
    }
}

bitflags! {
    /// Audio routing byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AudioEnableFlags: u8 {
        /// Internal microphone and headset microphone
        const MICROPHONE = 0x01;
        const DISABLE_HEADPHONES = 0x10;
        const INTERNAL_SPEAKER = 0x20;
    }
}

bitflags! {
    /// Audio mute byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AudioMuteFlags: u8 {
        const MICROPHONE = 0x10;
        const INTERNAL_SPEAKER = 0x20;
        const HEADSET = 0x40;
    }
}

bitflags! {
    /// LED setup byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LedSetupFlags: u8 {
        /// Brightness register (player LEDs and mic LED) is valid
        const BRIGHTNESS = 0x01;
        /// Touchpad light bar mode byte is valid
        const TOUCHPAD = 0x02;
    }
}

/// Touchpad light bar mode: fade to blue
pub const TOUCHPAD_LED_FADE_BLUE: u8 = 0x01;

/// Transport used to reach the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportMode {
    #[default]
    Usb,
    Bluetooth,
}

impl TransportMode {
    /// Expected input report length for this transport
    pub fn report_length(self) -> usize {
        match self {
            TransportMode::Usb => USB_REPORT_LENGTH,
            TransportMode::Bluetooth => BLUETOOTH_REPORT_LENGTH,
        }
    }

    /// Output report id for this transport
    pub fn output_report_id(self) -> u8 {
        match self {
            TransportMode::Usb => USB_OUTPUT_REPORT_ID,
            TransportMode::Bluetooth => BLUETOOTH_OUTPUT_REPORT_ID,
        }
    }

    /// Derive the transport from a HID interface number.
    ///
    /// hidapi reports `-1` for devices that are not behind a USB interface,
    /// which for this controller means Bluetooth. `force_bluetooth` covers
    /// platforms where that lookup is unreliable.
    pub fn detect(interface_number: i32, force_bluetooth: bool) -> Self {
        if force_bluetooth || interface_number < 0 {
            TransportMode::Bluetooth
        } else {
            TransportMode::Usb
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportMode::Usb => write!(f, "USB"),
            TransportMode::Bluetooth => write!(f, "Bluetooth"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_ids() {
        assert_eq!(VENDOR_ID, 0x054c, "Sony vendor ID should be 0x054c");
        assert_eq!(PRODUCT_ID, 0x0ce6, "DualSense product ID should be 0x0ce6");
    }

    #[test]
    fn test_report_lengths() {
        assert_eq!(TransportMode::Usb.report_length(), 64);
        assert_eq!(TransportMode::Bluetooth.report_length(), 78);
    }

    #[test]
    fn test_output_report_ids_differ() {
        assert_eq!(TransportMode::Usb.output_report_id(), 0x02);
        assert_eq!(TransportMode::Bluetooth.output_report_id(), 0x31);
    }

    #[test]
    fn test_detect_transport_mode() {
        assert_eq!(TransportMode::detect(3, false), TransportMode::Usb);
        assert_eq!(TransportMode::detect(0, false), TransportMode::Usb);
        assert_eq!(TransportMode::detect(-1, false), TransportMode::Bluetooth);
        assert_eq!(TransportMode::detect(3, true), TransportMode::Bluetooth);
    }

    #[test]
    fn test_feature_reports() {
        assert_eq!(FEATURE_REPORT_CALIBRATION, FeatureReport { id: 0x05, length: 41 });
        assert_eq!(FEATURE_REPORT_PAIRING, FeatureReport { id: 0x09, length: 20 });
        assert_eq!(FEATURE_REPORT_FIRMWARE, FeatureReport { id: 0x20, length: 64 });
    }

    #[test]
    fn test_rumble_flag_sets_both_bits() {
        assert_eq!(UpdateFlags1::RUMBLE.bits(), 0x03);
    }

    #[test]
    fn test_output_payloads_fit_usb_report() {
        assert!(OUT_TOUCHPAD_RGB + 3 <= USB_REPORT_LENGTH);
        assert!(OUT_LEFT_TRIGGER + TRIGGER_EFFECT_LENGTH <= OUT_LED_SETUP);
    }
}
