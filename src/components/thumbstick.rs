//! Analog thumbstick with its click button.

use parking_lot::Mutex;

use super::button::Button;
use crate::event::Callback;

/// Raw axis value that maps to 0
pub const STICK_CENTER: u8 = 127;

/// Analog stick. Positions are `raw - 127`, so each axis spans -127..=128.
#[derive(Debug)]
pub struct Thumbstick {
    pub button: Button,
    raw: Mutex<(u8, u8)>,
    on_move: Callback<(i16, i16)>,
}

impl Default for Thumbstick {
    fn default() -> Self {
        Self {
            button: Button::new(),
            raw: Mutex::new((STICK_CENTER, STICK_CENTER)),
            on_move: Callback::new(),
        }
    }
}

impl Thumbstick {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw axis bytes as reported (0-255)
    pub fn raw(&self) -> (u8, u8) {
        *self.raw.lock()
    }

    /// Current `(x, y)` position
    pub fn position(&self) -> (i16, i16) {
        let (x, y) = self.raw();
        (centered(x), centered(y))
    }

    pub fn x(&self) -> i16 {
        self.position().0
    }

    pub fn y(&self) -> i16 {
        self.position().1
    }

    /// Whether the stick is clicked in
    pub fn pressed(&self) -> bool {
        self.button.pressed()
    }

    /// Fired with the new position whenever it changes.
    pub fn on_move(&self) -> &Callback<(i16, i16)> {
        &self.on_move
    }

    pub(crate) fn update(&self, pressed: bool, raw_x: u8, raw_y: u8) {
        self.button.update(pressed);

        let moved = {
            let mut raw = self.raw.lock();
            if *raw == (raw_x, raw_y) {
                false
            } else {
                *raw = (raw_x, raw_y);
                true
            }
        };
        if moved {
            self.on_move.fire((centered(raw_x), centered(raw_y)));
        }
    }
}

fn centered(raw: u8) -> i16 {
    raw as i16 - STICK_CENTER as i16
}
