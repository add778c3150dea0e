//! Rumble motor.

use super::OutputComponent;

/// One of the two rumble motors. Intensity 0 stops the motor.
#[derive(Debug, Clone, Default)]
pub struct RumbleMotor {
    intensity: u8,
    dirty: bool,
}

impl RumbleMotor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: u8) {
        if self.intensity != intensity {
            self.intensity = intensity;
            self.dirty = true;
        }
    }

    pub(crate) fn take_report(&mut self) -> Option<u8> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.intensity)
    }
}

impl OutputComponent for RumbleMotor {
    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn force_update(&mut self) {
        self.dirty = true;
    }
}
