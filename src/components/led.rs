//! # LEDs
//!
//! Three LED groups are driven through the output report:
//!
//! - the five player indicator LEDs under the touchpad ([`PlayerLed`])
//! - the orange LED inside the mic button ([`MicLed`])
//! - the RGB light bar around the touchpad ([`TouchpadLed`])
//!
//! The player LEDs and the mic LED share one hardware brightness register.
//! Each keeps its own logical copy; the encoder pushes whichever copy was
//! written most recently and then tells the other owner the value the
//! hardware now holds.

use std::sync::atomic::{AtomicU64, Ordering};

use super::OutputComponent;

/// Brightness of the player LEDs and mic LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Brightness {
    #[default]
    High = 0x00,
    Medium = 0x01,
    Low = 0x02,
}

/// Orders brightness writes across both owners.
static BRIGHTNESS_CLOCK: AtomicU64 = AtomicU64::new(1);

/// One owner's view of the shared brightness register.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BrightnessClaim {
    value: Brightness,
    dirty: bool,
    written_at: u64,
}

impl BrightnessClaim {
    fn set(&mut self, value: Brightness) {
        self.value = value;
        self.dirty = true;
        self.written_at = BRIGHTNESS_CLOCK.fetch_add(1, Ordering::Relaxed);
    }

    /// `(value, write order)` while a write is pending
    pub(crate) fn pending(&self) -> Option<(Brightness, u64)> {
        self.dirty.then_some((self.value, self.written_at))
    }

    /// Accept the value the hardware now holds and drop any pending write.
    pub(crate) fn sync(&mut self, value: Brightness) {
        self.value = value;
        self.dirty = false;
    }
}

/// Preset player indicator patterns (5-bit, LSB = leftmost LED).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PlayerLedArrangement {
    #[default]
    Off = 0b00000,
    Player1 = 0b00100,
    Player2 = 0b01010,
    Player3 = 0b10101,
    Player4 = 0b11011,
    All = 0b11111,
}

/// Mask of the five player LEDs
pub const PLAYER_LED_MASK: u8 = 0b11111;

/// Player indicator LEDs.
#[derive(Debug, Clone, Default)]
pub struct PlayerLed {
    mask: u8,
    mask_dirty: bool,
    brightness: BrightnessClaim,
}

impl PlayerLed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw 5-bit LED mask
    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn brightness(&self) -> Brightness {
        self.brightness.value
    }

    /// Light one of the preset patterns.
    pub fn set_arrangement(&mut self, arrangement: PlayerLedArrangement) {
        self.set_mask(arrangement as u8);
    }

    /// Light an arbitrary combination; bits above the fifth are ignored.
    pub fn set_mask(&mut self, mask: u8) {
        let mask = mask & PLAYER_LED_MASK;
        if self.mask != mask {
            self.mask = mask;
            self.mask_dirty = true;
        }
    }

    /// Always queues a write: the latest brightness setter wins.
    pub fn set_brightness(&mut self, brightness: Brightness) {
        self.brightness.set(brightness);
    }

    pub(crate) fn take_mask(&mut self) -> Option<u8> {
        if !self.mask_dirty {
            return None;
        }
        self.mask_dirty = false;
        Some(self.mask)
    }

    pub(crate) fn brightness_claim(&mut self) -> &mut BrightnessClaim {
        &mut self.brightness
    }
}

impl OutputComponent for PlayerLed {
    fn is_dirty(&self) -> bool {
        self.mask_dirty || self.brightness.dirty
    }

    fn force_update(&mut self) {
        self.mask_dirty = true;
        self.brightness.dirty = true;
    }
}

/// Mic button LED mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum MicLedState {
    #[default]
    Off = 0x00,
    On = 0x01,
    Pulse = 0x02,
}

/// LED inside the mic button.
#[derive(Debug, Clone, Default)]
pub struct MicLed {
    state: MicLedState,
    state_dirty: bool,
    brightness: BrightnessClaim,
}

impl MicLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MicLedState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state != MicLedState::Off
    }

    pub fn is_pulsating(&self) -> bool {
        self.state == MicLedState::Pulse
    }

    pub fn brightness(&self) -> Brightness {
        self.brightness.value
    }

    pub fn set_state(&mut self, state: MicLedState) {
        if self.state != state {
            self.state = state;
            self.state_dirty = true;
        }
    }

    /// Steady on or off.
    pub fn set_on(&mut self, on: bool) {
        self.set_state(if on { MicLedState::On } else { MicLedState::Off });
    }

    pub fn set_pulsating(&mut self, pulsating: bool) {
        self.set_state(if pulsating {
            MicLedState::Pulse
        } else {
            MicLedState::On
        });
    }

    /// Always queues a write: the latest brightness setter wins.
    pub fn set_brightness(&mut self, brightness: Brightness) {
        self.brightness.set(brightness);
    }

    pub(crate) fn take_state(&mut self) -> Option<u8> {
        if !self.state_dirty {
            return None;
        }
        self.state_dirty = false;
        Some(self.state as u8)
    }

    pub(crate) fn brightness_claim(&mut self) -> &mut BrightnessClaim {
        &mut self.brightness
    }
}

impl OutputComponent for MicLed {
    fn is_dirty(&self) -> bool {
        self.state_dirty || self.brightness.dirty
    }

    fn force_update(&mut self) {
        self.state_dirty = true;
        self.brightness.dirty = true;
    }
}

/// RGB light bar around the touchpad.
#[derive(Debug, Clone, Default)]
pub struct TouchpadLed {
    color: (u8, u8, u8),
    color_dirty: bool,
    fade_to_blue: bool,
}

impl TouchpadLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(&self) -> (u8, u8, u8) {
        self.color
    }

    pub fn set_color(&mut self, red: u8, green: u8, blue: u8) {
        if self.color != (red, green, blue) {
            self.color = (red, green, blue);
            self.color_dirty = true;
        }
    }

    /// Turn the light bar off. Always resent.
    pub fn off(&mut self) {
        self.color = (0, 0, 0);
        self.color_dirty = true;
    }

    /// One-shot firmware animation; the bar stays blue afterwards until a new
    /// colour is sent.
    pub fn fade_to_blue(&mut self) {
        self.fade_to_blue = true;
    }

    pub(crate) fn take_color(&mut self) -> Option<[u8; 3]> {
        if !self.color_dirty {
            return None;
        }
        self.color_dirty = false;
        Some([self.color.0, self.color.1, self.color.2])
    }

    pub(crate) fn take_fade_to_blue(&mut self) -> bool {
        std::mem::take(&mut self.fade_to_blue)
    }
}

impl OutputComponent for TouchpadLed {
    fn is_dirty(&self) -> bool {
        self.color_dirty || self.fade_to_blue
    }

    fn force_update(&mut self) {
        self.color_dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_led_mask_is_five_bits() {
        let mut led = PlayerLed::new();
        led.set_mask(0xFF);
        assert_eq!(led.mask(), 0b11111);
        assert_eq!(led.take_mask(), Some(0b11111));
        assert_eq!(led.take_mask(), None);
    }

    #[test]
    fn test_player_arrangements() {
        let mut led = PlayerLed::new();
        led.set_arrangement(PlayerLedArrangement::Player2);
        assert_eq!(led.mask(), 0b01010);
        led.set_arrangement(PlayerLedArrangement::Player2);
        assert_eq!(led.take_mask(), Some(0b01010));
    }

    #[test]
    fn test_brightness_writes_are_ordered() {
        let mut player = PlayerLed::new();
        let mut mic = MicLed::new();

        player.set_brightness(Brightness::Low);
        mic.set_brightness(Brightness::Medium);

        let (_, player_at) = player.brightness_claim().pending().expect("pending");
        let (_, mic_at) = mic.brightness_claim().pending().expect("pending");
        assert!(mic_at > player_at);
    }

    #[test]
    fn test_brightness_sync_clears_pending() {
        let mut mic = MicLed::new();
        mic.set_brightness(Brightness::Low);
        mic.brightness_claim().sync(Brightness::Medium);

        assert_eq!(mic.brightness(), Brightness::Medium);
        assert!(mic.brightness_claim().pending().is_none());
        assert!(!mic.is_dirty());
    }

    #[test]
    fn test_mic_led_states() {
        let mut mic = MicLed::new();
        mic.set_on(true);
        assert!(mic.is_on());
        mic.set_pulsating(true);
        assert!(mic.is_pulsating());
        assert_eq!(mic.take_state(), Some(0x02));
        assert_eq!(mic.take_state(), None);
    }

    #[test]
    fn test_touchpad_led_fade_is_one_shot() {
        let mut bar = TouchpadLed::new();
        bar.fade_to_blue();
        assert!(bar.is_dirty());
        assert!(bar.take_fade_to_blue());
        assert!(!bar.take_fade_to_blue());
    }

    #[test]
    fn test_touchpad_led_color() {
        let mut bar = TouchpadLed::new();
        bar.set_color(0, 0, 0);
        assert!(!bar.is_dirty());
        bar.set_color(255, 64, 0);
        assert_eq!(bar.take_color(), Some([255, 64, 0]));
        bar.off();
        assert_eq!(bar.take_color(), Some([0, 0, 0]));
    }

    #[test]
    fn test_force_update_marks_everything() {
        let mut player = PlayerLed::new();
        let mut mic = MicLed::new();
        let mut bar = TouchpadLed::new();
        player.force_update();
        mic.force_update();
        bar.force_update();
        assert!(player.is_dirty() && mic.is_dirty() && bar.is_dirty());
        assert_eq!(player.take_mask(), Some(0));
        assert_eq!(mic.take_state(), Some(0));
    }
}
