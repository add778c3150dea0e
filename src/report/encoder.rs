//! # Output Report Encoder
//!
//! Builds an output report from the dirty fields of [`Outputs`].
//!
//! Every dirty field sets its validity bit in one of the two flag bytes and
//! writes its payload at a fixed offset; fields that are not dirty stay zero
//! and the controller ignores them. Encoding clears the dirty flags, so a
//! second encode with no setter calls in between produces an all-clear
//! report.

use super::crc::seal_output_report;
use super::protocol::*;
use crate::components::led::Brightness;
use crate::components::Outputs;

/// Common-layout length used while filling a Bluetooth report, before the
/// sub-header is inserted.
const BLUETOOTH_COMMON_LENGTH: usize = BLUETOOTH_REPORT_LENGTH - BLUETOOTH_OUTPUT_SUBHEADER.len();

/// Encode an output report for `mode`
///
/// # Arguments
///
/// * `outputs` - Output state; dirty flags are cleared
/// * `mode` - Transport the report will be written to
///
/// # Returns
///
/// * `Vec<u8>` - 64 bytes over USB, 78 bytes (sub-header and CRC32 trailer
///   included) over Bluetooth
///
/// # Examples
///
/// ```
/// use dualsense_link::components::Outputs;
/// use dualsense_link::report::{encode_output_report, TransportMode};
///
/// let mut outputs = Outputs::new();
/// outputs.left_rumble.set_intensity(200);
///
/// let report = encode_output_report(&mut outputs, TransportMode::Usb);
/// assert_eq!(report.len(), 64);
/// assert_eq!(report[0], 0x02);
/// assert_eq!(report[4], 200);
/// ```
pub fn encode_output_report(outputs: &mut Outputs, mode: TransportMode) -> Vec<u8> {
    let length = match mode {
        TransportMode::Usb => USB_REPORT_LENGTH,
        TransportMode::Bluetooth => BLUETOOTH_COMMON_LENGTH,
    };
    let mut report = vec![0u8; length];
    report[0] = mode.output_report_id();

    let mut flags_1 = UpdateFlags1::empty();
    let mut flags_2 = UpdateFlags2::empty();
    let mut led_setup = LedSetupFlags::empty();

    // Triggers
    if let Some(effect) = outputs.right_trigger.take_report() {
        flags_1 |= UpdateFlags1::RIGHT_TRIGGER;
        report[OUT_RIGHT_TRIGGER..OUT_RIGHT_TRIGGER + TRIGGER_EFFECT_LENGTH].copy_from_slice(&effect);
    }
    if let Some(effect) = outputs.left_trigger.take_report() {
        flags_1 |= UpdateFlags1::LEFT_TRIGGER;
        report[OUT_LEFT_TRIGGER..OUT_LEFT_TRIGGER + TRIGGER_EFFECT_LENGTH].copy_from_slice(&effect);
    }

    // Rumble: either motor sets the shared flag, both bytes carry their
    // current value
    let right = outputs.right_rumble.take_report();
    let left = outputs.left_rumble.take_report();
    if right.is_some() || left.is_some() {
        flags_1 |= UpdateFlags1::RUMBLE;
        report[OUT_RUMBLE_RIGHT] = outputs.right_rumble.intensity();
        report[OUT_RUMBLE_LEFT] = outputs.left_rumble.intensity();
    }

    // Mic LED and player LEDs
    if let Some(state) = outputs.mic_led.take_state() {
        flags_2 |= UpdateFlags2::MICROPHONE_LED;
        report[OUT_MIC_LED] = state;
    }
    if let Some(mask) = outputs.player_led.take_mask() {
        flags_2 |= UpdateFlags2::PLAYER_LEDS;
        report[OUT_PLAYER_LEDS] = mask;
    }
    if let Some(brightness) = reconcile_brightness(outputs) {
        led_setup |= LedSetupFlags::BRIGHTNESS;
        report[OUT_BRIGHTNESS] = brightness as u8;
    }

    // Touchpad light bar
    if let Some(rgb) = outputs.touchpad_led.take_color() {
        flags_2 |= UpdateFlags2::TOUCHPAD_LED;
        report[OUT_TOUCHPAD_RGB..OUT_TOUCHPAD_RGB + 3].copy_from_slice(&rgb);
    }
    if outputs.touchpad_led.take_fade_to_blue() {
        led_setup |= LedSetupFlags::TOUCHPAD;
        report[OUT_TOUCHPAD_LED_MODE] = TOUCHPAD_LED_FADE_BLUE;
    }

    encode_audio(outputs, &mut report, &mut flags_1, &mut flags_2);

    report[OUT_FLAGS_1] = flags_1.bits();
    report[OUT_FLAGS_2] = flags_2.bits();
    report[OUT_LED_SETUP] = led_setup.bits();

    match mode {
        TransportMode::Usb => report,
        TransportMode::Bluetooth => frame_bluetooth(&report),
    }
}

/// Resolve the shared brightness register.
///
/// When both the player LEDs and the mic LED have a pending brightness, the
/// one written last wins. Both owners end up holding the value sent.
fn reconcile_brightness(outputs: &mut Outputs) -> Option<Brightness> {
    let player = outputs.player_led.brightness_claim().pending();
    let mic = outputs.mic_led.brightness_claim().pending();

    let winner = match (player, mic) {
        (None, None) => return None,
        (Some((value, _)), None) | (None, Some((value, _))) => value,
        (Some((player_value, player_at)), Some((mic_value, mic_at))) => {
            if player_at > mic_at {
                player_value
            } else {
                mic_value
            }
        }
    };

    outputs.player_led.brightness_claim().sync(winner);
    outputs.mic_led.brightness_claim().sync(winner);
    Some(winner)
}

/// Volumes, routing and mute. Routing and mute bytes are shared by the
/// speaker and the microphone, so a change on either side rewrites both.
fn encode_audio(
    outputs: &mut Outputs,
    report: &mut [u8],
    flags_1: &mut UpdateFlags1,
    flags_2: &mut UpdateFlags2,
) {
    let speaker = &mut outputs.speaker;
    let microphone = &mut outputs.microphone;

    if let Some(volume) = speaker.take_headset_volume() {
        *flags_1 |= UpdateFlags1::HEADSET_VOLUME;
        report[OUT_HEADSET_VOLUME] = volume;
    }
    if let Some(volume) = speaker.take_volume() {
        *flags_1 |= UpdateFlags1::SPEAKER_VOLUME;
        report[OUT_SPEAKER_VOLUME] = volume;
    }
    if let Some(volume) = microphone.take_volume() {
        *flags_1 |= UpdateFlags1::MICROPHONE_VOLUME;
        report[OUT_MIC_VOLUME] = volume;
    }

    // Non-short-circuit so both dirty flags are cleared
    if speaker.take_routing() | microphone.take_routing() {
        *flags_1 |= UpdateFlags1::AUDIO_ROUTING;
        report[OUT_AUDIO_ENABLE] = (speaker.routing_bits() | microphone.routing_bits()).bits();
    }
    if speaker.take_mute() | microphone.take_mute() {
        *flags_2 |= UpdateFlags2::AUDIO_MUTE;
        report[OUT_AUDIO_MUTE] = (speaker.mute_bits() | microphone.mute_bits()).bits();
    }
}

/// Insert the sub-header after the report id and seal with the CRC32 trailer.
fn frame_bluetooth(common: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(BLUETOOTH_REPORT_LENGTH);
    framed.push(common[0]);
    framed.extend_from_slice(&BLUETOOTH_OUTPUT_SUBHEADER);
    framed.extend_from_slice(&common[1..]);
    seal_output_report(&mut framed);
    framed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Brightness, MicLedState, PlayerLedArrangement, TriggerMode};

    #[test]
    fn test_clean_usb_report() {
        let mut outputs = Outputs::new();
        let report = encode_output_report(&mut outputs, TransportMode::Usb);

        assert_eq!(report.len(), 64);
        assert_eq!(report[0], 0x02);
        assert!(report[1..].iter().all(|&b| b == 0), "clean state encodes all zeros");
    }

    #[test]
    fn test_force_update_sets_every_flag() {
        let mut outputs = Outputs::new();
        outputs.force_update();
        let report = encode_output_report(&mut outputs, TransportMode::Usb);

        assert_eq!(report[OUT_FLAGS_1], 0xFF);
        assert_eq!(report[OUT_FLAGS_2], 0x17);
        assert_eq!(report[OUT_LED_SETUP], 0x01);

        // Dirty flags were drained
        let again = encode_output_report(&mut outputs, TransportMode::Usb);
        assert_eq!(again[OUT_FLAGS_1], 0);
        assert_eq!(again[OUT_FLAGS_2], 0);
        assert_eq!(again[OUT_LED_SETUP], 0);
        assert!(!outputs.is_dirty());
    }

    #[test]
    fn test_payload_offsets() {
        let mut outputs = Outputs::new();
        outputs.right_trigger.set_profile(TriggerMode::Rigid, 180, 40, 200);
        outputs.left_trigger.set_profile(TriggerMode::PulseAB, 90, 10, 100);
        outputs.right_rumble.set_intensity(33);
        outputs.player_led.set_arrangement(PlayerLedArrangement::Player3);
        outputs.mic_led.set_state(MicLedState::Pulse);
        outputs.touchpad_led.set_color(1, 2, 3);

        let report = encode_output_report(&mut outputs, TransportMode::Usb);

        assert_eq!(&report[11..15], &[0x01, 40, 200, 180]);
        assert_eq!(&report[22..26], &[0x26, 10, 100, 90]);
        assert_eq!(report[OUT_RUMBLE_RIGHT], 33);
        assert_eq!(report[OUT_RUMBLE_LEFT], 0);
        assert_eq!(report[OUT_PLAYER_LEDS], 0b10101);
        assert_eq!(report[OUT_MIC_LED], 0x02);
        assert_eq!(&report[45..48], &[1, 2, 3]);

        assert_eq!(report[OUT_FLAGS_1], 0x03 | 0x04 | 0x08);
        assert_eq!(report[OUT_FLAGS_2], 0x01 | 0x04 | 0x10);
    }

    #[test]
    fn test_latest_brightness_wins() {
        let mut outputs = Outputs::new();
        outputs.player_led.set_brightness(Brightness::Low);
        outputs.mic_led.set_brightness(Brightness::Medium);

        let report = encode_output_report(&mut outputs, TransportMode::Usb);
        assert_eq!(report[OUT_BRIGHTNESS], Brightness::Medium as u8);
        assert_eq!(report[OUT_LED_SETUP], LedSetupFlags::BRIGHTNESS.bits());
        assert_eq!(outputs.player_led.brightness(), Brightness::Medium);
        assert_eq!(outputs.mic_led.brightness(), Brightness::Medium);

        outputs.mic_led.set_brightness(Brightness::High);
        outputs.player_led.set_brightness(Brightness::Low);

        let report = encode_output_report(&mut outputs, TransportMode::Usb);
        assert_eq!(report[OUT_BRIGHTNESS], Brightness::Low as u8);
        assert_eq!(outputs.mic_led.brightness(), Brightness::Low);
    }

    #[test]
    fn test_single_brightness_writer_syncs_other_owner() {
        let mut outputs = Outputs::new();
        outputs.player_led.set_brightness(Brightness::Low);

        encode_output_report(&mut outputs, TransportMode::Usb);
        assert_eq!(outputs.mic_led.brightness(), Brightness::Low);
        assert!(!outputs.is_dirty());
    }

    #[test]
    fn test_audio_bytes_carry_both_owners() {
        let mut outputs = Outputs::new();
        outputs.microphone.set_enabled(true);
        outputs.microphone.set_muted(true);
        encode_output_report(&mut outputs, TransportMode::Usb);

        // Only the speaker changes; the microphone bits must survive
        outputs.speaker.set_enabled(true);
        outputs.speaker.set_muted(true);
        let report = encode_output_report(&mut outputs, TransportMode::Usb);

        assert_eq!(report[OUT_AUDIO_ENABLE], 0x01 | 0x10 | 0x20);
        assert_eq!(report[OUT_AUDIO_MUTE], 0x10 | 0x20 | 0x40);
        assert_eq!(report[OUT_FLAGS_1], UpdateFlags1::AUDIO_ROUTING.bits());
        assert_eq!(report[OUT_FLAGS_2], UpdateFlags2::AUDIO_MUTE.bits());
    }

    #[test]
    fn test_volumes() {
        let mut outputs = Outputs::new();
        outputs.speaker.set_headset_volume(70);
        outputs.speaker.set_volume(100);
        outputs.microphone.set_volume(40);

        let report = encode_output_report(&mut outputs, TransportMode::Usb);
        assert_eq!(&report[5..8], &[70, 100, 40]);
        assert_eq!(report[OUT_FLAGS_1], 0x10 | 0x20 | 0x40);
    }

    #[test]
    fn test_touchpad_fade_to_blue() {
        let mut outputs = Outputs::new();
        outputs.touchpad_led.fade_to_blue();

        let report = encode_output_report(&mut outputs, TransportMode::Usb);
        assert_eq!(report[OUT_LED_SETUP], LedSetupFlags::TOUCHPAD.bits());
        assert_eq!(report[OUT_TOUCHPAD_LED_MODE], TOUCHPAD_LED_FADE_BLUE);

        let report = encode_output_report(&mut outputs, TransportMode::Usb);
        assert_eq!(report[OUT_TOUCHPAD_LED_MODE], 0);
    }

    #[test]
    fn test_clean_bluetooth_report() {
        let mut outputs = Outputs::new();
        let report = encode_output_report(&mut outputs, TransportMode::Bluetooth);

        assert_eq!(report.len(), 78);
        assert_eq!(&report[..3], &[0x31, 0x00, 0x10]);
        assert!(report[3..74].iter().all(|&b| b == 0));
        assert_eq!(&report[74..], &0x231501B5u32.to_le_bytes());
    }

    #[test]
    fn test_bluetooth_payload_is_shifted_by_subheader() {
        let mut outputs = Outputs::new();
        outputs.left_rumble.set_intensity(0x7F);
        outputs.touchpad_led.set_color(9, 8, 7);

        let usb = encode_output_report(&mut outputs.clone(), TransportMode::Usb);
        let bluetooth = encode_output_report(&mut outputs, TransportMode::Bluetooth);

        assert_eq!(&bluetooth[3..3 + 63], &usb[1..]);
        let crc = crate::report::crc::crc32_seeded(0xA2, &bluetooth[..74]);
        assert_eq!(&bluetooth[74..], &crc.to_le_bytes());
    }
}
