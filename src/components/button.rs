//! Digital button state machine.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::event::Callback;

/// A single digital button.
///
/// `on_press` fires once per released→pressed transition, `on_state` fires on
/// every transition with the new state. Repeating the current state fires
/// nothing.
#[derive(Debug, Default)]
pub struct Button {
    pressed: AtomicBool,
    on_press: Callback<()>,
    on_state: Callback<bool>,
}

impl Button {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pressed state
    pub fn pressed(&self) -> bool {
        self.pressed.load(Ordering::Acquire)
    }

    /// Fired once each time the button goes down.
    pub fn on_press(&self) -> &Callback<()> {
        &self.on_press
    }

    /// Fired with the new state on press and on release.
    pub fn on_state(&self) -> &Callback<bool> {
        &self.on_state
    }

    /// Apply the state read from the controller. Returns `true` on a transition.
    pub(crate) fn update(&self, state: bool) -> bool {
        if self.pressed.swap(state, Ordering::AcqRel) == state {
            return false;
        }
        if state {
            self.on_press.fire(());
        }
        self.on_state.fire(state);
        true
    }
}
