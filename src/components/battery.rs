//! # Battery
//!
//! Decoded from the status byte of every input report: the low nibble is the
//! charge level in tenths, the high nibble indexes the charge state table.

use parking_lot::Mutex;

use crate::event::Callback;

/// Charge state reported by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BatteryState {
    Discharging,
    Full,
    Charging,
    IncorrectVoltage,
    TemperatureError,
    Error,
    #[default]
    Unknown,
}

const STATE_TABLE: [BatteryState; 16] = [
    BatteryState::Discharging,
    BatteryState::Full,
    BatteryState::Charging,
    BatteryState::Unknown,
    BatteryState::Unknown,
    BatteryState::Unknown,
    BatteryState::Unknown,
    BatteryState::Unknown,
    BatteryState::Unknown,
    BatteryState::Unknown,
    BatteryState::IncorrectVoltage,
    BatteryState::TemperatureError,
    BatteryState::Unknown,
    BatteryState::Unknown,
    BatteryState::Unknown,
    BatteryState::Error,
];

impl BatteryState {
    /// Look up the high nibble of the status byte.
    pub fn from_nibble(nibble: u8) -> Self {
        STATE_TABLE[(nibble & 0x0f) as usize]
    }
}

impl std::fmt::Display for BatteryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            BatteryState::Discharging => "discharging",
            BatteryState::Full => "full",
            BatteryState::Charging => "charging",
            BatteryState::IncorrectVoltage => "bad voltage",
            BatteryState::TemperatureError => "temp error",
            BatteryState::Error => "error",
            BatteryState::Unknown => "?",
        };
        f.write_str(text)
    }
}

/// Charge percentage from the low nibble of the status byte.
///
/// The controller reports tenths; the midpoint of the bucket is used and
/// capped at 100.
pub fn battery_percent(nibble: u8) -> u8 {
    ((nibble & 0x0f) * 10 + 5).min(100)
}

#[derive(Debug, Clone, Copy, Default)]
struct BatteryStatus {
    percent: u8,
    state: BatteryState,
}

/// Battery level and charge state.
#[derive(Debug, Default)]
pub struct Battery {
    status: Mutex<BatteryStatus>,
    on_percent: Callback<u8>,
    on_state: Callback<BatteryState>,
}

impl Battery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn percent(&self) -> u8 {
        self.status.lock().percent
    }

    pub fn state(&self) -> BatteryState {
        self.status.lock().state
    }

    pub fn charging(&self) -> bool {
        self.state() == BatteryState::Charging
    }

    /// Fired with the new percentage when it changes.
    pub fn on_percent(&self) -> &Callback<u8> {
        &self.on_percent
    }

    /// Fired with the new charge state when it changes.
    pub fn on_state(&self) -> &Callback<BatteryState> {
        &self.on_state
    }

    /// Apply a raw status byte.
    pub(crate) fn update(&self, status: u8) {
        let percent = battery_percent(status & 0x0f);
        let state = BatteryState::from_nibble(status >> 4);

        let (percent_changed, state_changed) = {
            let mut current = self.status.lock();
            let changed = (current.percent != percent, current.state != state);
            *current = BatteryStatus { percent, state };
            changed
        };

        if percent_changed {
            self.on_percent.fire(percent);
        }
        if state_changed {
            self.on_state.fire(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_percent_formula() {
        assert_eq!(battery_percent(0), 5);
        assert_eq!(battery_percent(4), 45);
        assert_eq!(battery_percent(9), 95);
        assert_eq!(battery_percent(10), 100);
        assert_eq!(battery_percent(15), 100);
    }

    #[test]
    fn test_state_table() {
        assert_eq!(BatteryState::from_nibble(0x0), BatteryState::Discharging);
        assert_eq!(BatteryState::from_nibble(0x1), BatteryState::Full);
        assert_eq!(BatteryState::from_nibble(0x2), BatteryState::Charging);
        assert_eq!(BatteryState::from_nibble(0xa), BatteryState::IncorrectVoltage);
        assert_eq!(BatteryState::from_nibble(0xb), BatteryState::TemperatureError);
        assert_eq!(BatteryState::from_nibble(0xf), BatteryState::Error);

        for nibble in [0x3, 0x4, 0x5, 0x6, 0x7, 0x8, 0x9, 0xc, 0xd, 0xe] {
            assert_eq!(BatteryState::from_nibble(nibble), BatteryState::Unknown);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(BatteryState::IncorrectVoltage.to_string(), "bad voltage");
        assert_eq!(BatteryState::Unknown.to_string(), "?");
    }

    #[test]
    fn test_update_decodes_status_byte() {
        let battery = Battery::new();
        battery.update(0x27);
        assert_eq!(battery.percent(), 75);
        assert_eq!(battery.state(), BatteryState::Charging);
        assert!(battery.charging());
    }

    #[test]
    fn test_events_fire_on_change_only() {
        let battery = Battery::new();
        let percent_events = Arc::new(AtomicUsize::new(0));
        let state_events = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&percent_events);
        battery.on_percent().register(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&state_events);
        battery.on_state().register(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        battery.update(0x05);
        battery.update(0x05);
        battery.update(0x06);
        battery.update(0x16);

        assert_eq!(percent_events.load(Ordering::SeqCst), 2);
        assert_eq!(state_events.load(Ordering::SeqCst), 2);
    }
}
