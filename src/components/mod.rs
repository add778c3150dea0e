//! # Controller Components
//!
//! One state machine per physical control.
//!
//! Input components ([`Inputs`]) are updated by the decoder from the polling
//! thread and fire callbacks on transitions. Each one guards its own state
//! with an atomic or a small lock that is released before any callback runs,
//! so callbacks may read any component.
//!
//! Output components ([`Outputs`]) hold what should be sent to the
//! controller together with per-field dirty flags. They live behind the
//! session's single output lock; the encoder drains the dirty flags once per
//! polling iteration.

pub mod audio;
pub mod battery;
pub mod button;
pub mod dpad;
pub mod gyroscope;
pub mod led;
pub mod rumble;
pub mod thumbstick;
pub mod touchpad;
pub mod trigger;

pub use audio::{Microphone, Speaker};
pub use battery::{Battery, BatteryState};
pub use button::Button;
pub use dpad::{Dpad, DpadDirection};
pub use gyroscope::Gyroscope;
pub use led::{Brightness, MicLed, MicLedState, PlayerLed, PlayerLedArrangement, TouchpadLed};
pub use rumble::RumbleMotor;
pub use thumbstick::Thumbstick;
pub use touchpad::{TouchPoint, TouchReport, Touchpad};
pub use trigger::{Trigger, TriggerEffect, TriggerMode};

/// Dirty tracking shared by every output component.
pub trait OutputComponent {
    /// Whether anything is waiting to be sent
    fn is_dirty(&self) -> bool;

    /// Mark every field dirty so the next report resends the full state.
    fn force_update(&mut self);
}

/// Everything decoded from input reports.
#[derive(Debug, Default)]
pub struct Inputs {
    pub cross: Button,
    pub circle: Button,
    pub square: Button,
    pub triangle: Button,
    pub dpad: Dpad,
    pub share: Button,
    pub options: Button,
    pub ps: Button,
    pub mic_button: Button,
    /// L1
    pub left_bumper: Button,
    /// R1
    pub right_bumper: Button,
    /// L2 analog position
    pub left_trigger: Trigger,
    /// R2 analog position
    pub right_trigger: Trigger,
    pub left_stick: Thumbstick,
    pub right_stick: Thumbstick,
    pub touchpad: Touchpad,
    pub gyroscope: Gyroscope,
    pub battery: Battery,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Everything sent through output reports.
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    /// L2 resistance
    pub left_trigger: TriggerEffect,
    /// R2 resistance
    pub right_trigger: TriggerEffect,
    pub left_rumble: RumbleMotor,
    pub right_rumble: RumbleMotor,
    pub player_led: PlayerLed,
    pub mic_led: MicLed,
    pub touchpad_led: TouchpadLed,
    pub speaker: Speaker,
    pub microphone: Microphone,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    fn components(&self) -> [&dyn OutputComponent; 9] {
        [
            &self.left_trigger,
            &self.right_trigger,
            &self.left_rumble,
            &self.right_rumble,
            &self.player_led,
            &self.mic_led,
            &self.touchpad_led,
            &self.speaker,
            &self.microphone,
        ]
    }

    /// Whether any output component has a pending change.
    pub fn is_dirty(&self) -> bool {
        self.components().iter().any(|c| c.is_dirty())
    }

    /// Mark every output dirty. Used to resynchronise after a reconnect.
    pub fn force_update(&mut self) {
        self.left_trigger.force_update();
        self.right_trigger.force_update();
        self.left_rumble.force_update();
        self.right_rumble.force_update();
        self.player_led.force_update();
        self.mic_led.force_update();
        self.touchpad_led.force_update();
        self.speaker.force_update();
        self.microphone.force_update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outputs_start_clean() {
        let outputs = Outputs::new();
        assert!(!outputs.is_dirty());
    }

    #[test]
    fn test_any_setter_dirties_outputs() {
        let mut outputs = Outputs::new();
        outputs.right_rumble.set_intensity(10);
        assert!(outputs.is_dirty());
    }

    #[test]
    fn test_force_update_dirties_everything() {
        let mut outputs = Outputs::new();
        outputs.force_update();
        assert!(outputs.components().iter().all(|c| c.is_dirty()));
    }

    #[test]
    fn test_inputs_initial_state() {
        let inputs = Inputs::new();
        assert!(!inputs.cross.pressed());
        assert_eq!(inputs.dpad.raw(), 8);
        assert_eq!(inputs.left_stick.position(), (0, 0));
        assert_eq!(inputs.touchpad.point_1.position(), (-1, -1));
        assert_eq!(inputs.battery.state(), BatteryState::Unknown);
    }
}
