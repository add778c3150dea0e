//! # D-Pad
//!
//! The controller reports the d-pad as a single code in the low nibble of the
//! symbol button byte:
//!
//! | Code | Direction    |
//! |------|--------------|
//! | 0    | Up           |
//! | 1    | Up + Right   |
//! | 2    | Right        |
//! | 3    | Right + Down |
//! | 4    | Down         |
//! | 5    | Down + Left  |
//! | 6    | Left         |
//! | 7    | Left + Up    |
//! | 8    | None         |
//!
//! Codes 9-15 are never sent by valid hardware and decode as none.

use bitflags::bitflags;
use std::sync::atomic::{AtomicU8, Ordering};

use super::button::Button;
use crate::event::Callback;

/// Code reported when no direction is held
pub const DPAD_CODE_NONE: u8 = 8;

bitflags! {
    /// Directions currently held on the d-pad. Empty means released.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DpadDirection: u8 {
        const UP = 0x01;
        const DOWN = 0x02;
        const LEFT = 0x04;
        const RIGHT = 0x08;
    }
}

impl DpadDirection {
    /// Map a raw d-pad code to its directions.
    ///
    /// # Examples
    ///
    /// ```
    /// use dualsense_link::components::dpad::DpadDirection;
    ///
    /// assert_eq!(DpadDirection::from_code(1), DpadDirection::UP | DpadDirection::RIGHT);
    /// assert!(DpadDirection::from_code(8).is_empty());
    /// ```
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => DpadDirection::UP,
            1 => DpadDirection::UP | DpadDirection::RIGHT,
            2 => DpadDirection::RIGHT,
            3 => DpadDirection::RIGHT | DpadDirection::DOWN,
            4 => DpadDirection::DOWN,
            5 => DpadDirection::DOWN | DpadDirection::LEFT,
            6 => DpadDirection::LEFT,
            7 => DpadDirection::LEFT | DpadDirection::UP,
            _ => DpadDirection::empty(),
        }
    }

    pub fn up(self) -> bool {
        self.contains(DpadDirection::UP)
    }

    pub fn down(self) -> bool {
        self.contains(DpadDirection::DOWN)
    }

    pub fn left(self) -> bool {
        self.contains(DpadDirection::LEFT)
    }

    pub fn right(self) -> bool {
        self.contains(DpadDirection::RIGHT)
    }
}

/// D-pad state machine with one [`Button`] per direction.
#[derive(Debug)]
pub struct Dpad {
    raw: AtomicU8,
    pub up: Button,
    pub down: Button,
    pub left: Button,
    pub right: Button,
    on_direction: Callback<DpadDirection>,
}

impl Default for Dpad {
    fn default() -> Self {
        Self {
            raw: AtomicU8::new(DPAD_CODE_NONE),
            up: Button::new(),
            down: Button::new(),
            left: Button::new(),
            right: Button::new(),
            on_direction: Callback::new(),
        }
    }
}

impl Dpad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last raw code read from the controller
    pub fn raw(&self) -> u8 {
        self.raw.load(Ordering::Acquire)
    }

    /// Directions currently held
    pub fn direction(&self) -> DpadDirection {
        DpadDirection::from_code(self.raw())
    }

    /// Fired whenever the decoded direction changes.
    pub fn on_direction(&self) -> &Callback<DpadDirection> {
        &self.on_direction
    }

    pub(crate) fn update(&self, code: u8) {
        let previous = DpadDirection::from_code(self.raw.swap(code, Ordering::AcqRel));
        let direction = DpadDirection::from_code(code);
        if previous == direction {
            return;
        }
        self.on_direction.fire(direction);

        self.up.update(direction.up());
        self.down.update(direction.down());
        self.left.update(direction.left());
        self.right.update(direction.right());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_direction_table() {
        // (code, up, down, left, right)
        let table = [
            (0, true, false, false, false),
            (1, true, false, false, true),
            (2, false, false, false, true),
            (3, false, true, false, true),
            (4, false, true, false, false),
            (5, false, true, true, false),
            (6, false, false, true, false),
            (7, true, false, true, false),
            (8, false, false, false, false),
        ];

        for (code, up, down, left, right) in table {
            let d = DpadDirection::from_code(code);
            assert_eq!(
                (d.up(), d.down(), d.left(), d.right()),
                (up, down, left, right),
                "code {}",
                code
            );
        }
    }

    #[test]
    fn test_starts_released() {
        let dpad = Dpad::new();
        assert_eq!(dpad.raw(), DPAD_CODE_NONE);
        assert!(dpad.direction().is_empty());
    }

    #[test]
    fn test_update_drives_direction_buttons() {
        let dpad = Dpad::new();

        dpad.update(1);
        assert!(dpad.up.pressed());
        assert!(dpad.right.pressed());
        assert!(!dpad.down.pressed());

        dpad.update(2);
        assert!(!dpad.up.pressed());
        assert!(dpad.right.pressed());

        dpad.update(DPAD_CODE_NONE);
        assert!(!dpad.right.pressed());
    }

    #[test]
    fn test_on_direction_fires_on_change_only() {
        let dpad = Dpad::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        dpad.on_direction().register(move |d| sink.lock().push(d));

        dpad.update(4);
        dpad.update(4);
        dpad.update(8);

        assert_eq!(
            *seen.lock(),
            vec![DpadDirection::DOWN, DpadDirection::empty()]
        );
    }

    #[test]
    fn test_unknown_codes_do_not_fire() {
        let dpad = Dpad::new();
        let fired = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&fired);
        dpad.on_direction().register(move |_| *sink.lock() += 1);

        for code in 9..=15 {
            dpad.update(code);
        }
        dpad.update(DPAD_CODE_NONE);

        assert_eq!(*fired.lock(), 0);
        assert_eq!(dpad.raw(), DPAD_CODE_NONE);
        assert!(dpad.direction().is_empty());
    }
}
