//! Gyroscope readings.

use std::sync::atomic::{AtomicI16, Ordering};

/// Raw angular rates, overwritten on every input report. No events.
#[derive(Debug, Default)]
pub struct Gyroscope {
    roll: AtomicI16,
    pitch: AtomicI16,
    yaw: AtomicI16,
}

impl Gyroscope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roll(&self) -> i16 {
        self.roll.load(Ordering::Relaxed)
    }

    pub fn pitch(&self) -> i16 {
        self.pitch.load(Ordering::Relaxed)
    }

    pub fn yaw(&self) -> i16 {
        self.yaw.load(Ordering::Relaxed)
    }

    /// `(roll, pitch, yaw)`
    pub fn orientation(&self) -> (i16, i16, i16) {
        (self.roll(), self.pitch(), self.yaw())
    }

    pub(crate) fn update(&self, roll: i16, pitch: i16, yaw: i16) {
        self.roll.store(roll, Ordering::Relaxed);
        self.pitch.store(pitch, Ordering::Relaxed);
        self.yaw.store(yaw, Ordering::Relaxed);
    }
}
