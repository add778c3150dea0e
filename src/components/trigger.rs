//! # Triggers
//!
//! L2/R2 have two independent halves: the analog position read from the
//! input report ([`Trigger`]) and the adaptive resistance written through the
//! output report ([`TriggerEffect`]).
//!
//! A resistance profile is four bytes on the wire: mode, section start,
//! section end, force.

use std::sync::atomic::{AtomicU8, Ordering};

use super::OutputComponent;
use crate::event::Callback;
use crate::report::protocol::TRIGGER_EFFECT_LENGTH;

/// Analog trigger position (0 released, 255 fully pressed).
#[derive(Debug, Default)]
pub struct Trigger {
    value: AtomicU8,
    on_change: Callback<u8>,
}

impl Trigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> u8 {
        self.value.load(Ordering::Acquire)
    }

    /// Fired with the new value whenever it changes.
    pub fn on_change(&self) -> &Callback<u8> {
        &self.on_change
    }

    pub(crate) fn update(&self, value: u8) {
        if self.value.swap(value, Ordering::AcqRel) != value {
            self.on_change.fire(value);
        }
    }
}

/// Resistance mode of a trigger motor.
///
/// The `A`/`B` variants add extra bits the firmware uses to alter the
/// resistance curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TriggerMode {
    #[default]
    Off = 0x00,
    Rigid = 0x01,
    Pulse = 0x02,
    RigidA = 0x01 | 0x20,
    RigidB = 0x01 | 0x04,
    RigidAB = 0x01 | 0x20 | 0x04,
    PulseA = 0x02 | 0x20,
    PulseB = 0x02 | 0x04,
    PulseAB = 0x02 | 0x20 | 0x04,
    Calibration = 0xFC,
}

/// Dirty-tracked resistance profile for one trigger.
#[derive(Debug, Clone, Default)]
pub struct TriggerEffect {
    mode: TriggerMode,
    start: u8,
    end: u8,
    force: u8,
    dirty: bool,
}

impl TriggerEffect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    pub fn force(&self) -> u8 {
        self.force
    }

    /// Active section of travel as `(start, end)`
    pub fn section(&self) -> (u8, u8) {
        (self.start, self.end)
    }

    pub fn set_mode(&mut self, mode: TriggerMode) {
        if self.mode != mode {
            self.mode = mode;
            self.dirty = true;
        }
    }

    pub fn set_force(&mut self, force: u8) {
        if self.force != force {
            self.force = force;
            self.dirty = true;
        }
    }

    pub fn set_section(&mut self, start: u8, end: u8) {
        if (self.start, self.end) != (start, end) {
            self.start = start;
            self.end = end;
            self.dirty = true;
        }
    }

    /// Set every field of the profile at once.
    pub fn set_profile(&mut self, mode: TriggerMode, force: u8, start: u8, end: u8) {
        self.set_mode(mode);
        self.set_force(force);
        self.set_section(start, end);
    }

    /// Release all resistance.
    pub fn off(&mut self) {
        self.set_profile(TriggerMode::Off, 0, 0, 0);
    }

    /// Wire payload if dirty; clears the dirty flag.
    pub(crate) fn take_report(&mut self) -> Option<[u8; TRIGGER_EFFECT_LENGTH]> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some([self.mode as u8, self.start, self.end, self.force])
    }
}

impl OutputComponent for TriggerEffect {
    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn force_update(&mut self) {
        self.dirty = true;
    }
}
