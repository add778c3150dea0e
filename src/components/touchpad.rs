//! # Touchpad
//!
//! The touch surface is a clickable button with two independent touch slots.
//! Each slot reports a finger id, whether a finger is down, and a 12-bit x/y
//! position (roughly 0-1919 by 0-1079).

use parking_lot::Mutex;

use super::button::Button;
use crate::event::Callback;

/// One touch slot as decoded from an input report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchReport {
    /// Finger id (7 bits), increments with every new touch
    pub id: u8,
    /// Whether a finger is on the surface
    pub active: bool,
    pub x: u16,
    pub y: u16,
}

#[derive(Debug, Clone, Copy)]
struct TouchState {
    id: Option<u8>,
    active: bool,
    position: (i16, i16),
}

impl Default for TouchState {
    fn default() -> Self {
        Self {
            id: None,
            active: false,
            position: (-1, -1),
        }
    }
}

/// One finger slot of the touchpad.
///
/// Before the first report the slot is inactive, has no id and sits at
/// `(-1, -1)`.
#[derive(Debug, Default)]
pub struct TouchPoint {
    state: Mutex<TouchState>,
    on_touch: Callback<(u8, bool)>,
    on_move: Callback<(i16, i16)>,
}

impl TouchPoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the finger last seen in this slot
    pub fn id(&self) -> Option<u8> {
        self.state.lock().id
    }

    /// Whether a finger is currently touching
    pub fn active(&self) -> bool {
        self.state.lock().active
    }

    /// Last reported `(x, y)`
    pub fn position(&self) -> (i16, i16) {
        self.state.lock().position
    }

    /// Position while a finger is down
    pub fn active_position(&self) -> Option<(i16, i16)> {
        let state = self.state.lock();
        state.active.then_some(state.position)
    }

    /// Fired with `(id, active)` when a finger lands or lifts.
    pub fn on_touch(&self) -> &Callback<(u8, bool)> {
        &self.on_touch
    }

    /// Fired with the new `(x, y)` when the position changes.
    pub fn on_move(&self) -> &Callback<(i16, i16)> {
        &self.on_move
    }

    pub(crate) fn update(&self, report: TouchReport) {
        let position = (report.x as i16, report.y as i16);
        let (touched, moved) = {
            let mut state = self.state.lock();
            state.id = Some(report.id);

            let touched = state.active != report.active;
            state.active = report.active;

            let moved = state.position != position;
            state.position = position;
            (touched, moved)
        };

        if touched {
            self.on_touch.fire((report.id, report.active));
        }
        if moved {
            self.on_move.fire(position);
        }
    }
}

/// Touch surface: click button plus two touch slots.
#[derive(Debug, Default)]
pub struct Touchpad {
    pub button: Button,
    pub point_1: TouchPoint,
    pub point_2: TouchPoint,
}

impl Touchpad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the surface is clicked down
    pub fn pressed(&self) -> bool {
        self.button.pressed()
    }

    pub(crate) fn update(&self, clicked: bool, point_1: TouchReport, point_2: TouchReport) {
        self.button.update(clicked);
        self.point_1.update(point_1);
        self.point_2.update(point_2);
    }
}
