//! # Audio
//!
//! Speaker and microphone settings. Volumes each have their own byte in the
//! output report, but routing (byte 8) and mute (byte 10) are shared bit
//! fields: the encoder always writes both owners' bits together.

use super::OutputComponent;
use crate::report::protocol::{AudioEnableFlags, AudioMuteFlags};

/// Internal speaker and headset output.
#[derive(Debug, Clone, Default)]
pub struct Speaker {
    volume: u8,
    headset_volume: u8,
    enabled: bool,
    muted: bool,
    volume_dirty: bool,
    headset_volume_dirty: bool,
    routing_dirty: bool,
    mute_dirty: bool,
}

impl Speaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Internal speaker volume
    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn headset_volume(&self) -> u8 {
        self.headset_volume
    }

    /// Whether audio is routed to the internal speaker
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn set_volume(&mut self, volume: u8) {
        if self.volume != volume {
            self.volume = volume;
            self.volume_dirty = true;
        }
    }

    pub fn set_headset_volume(&mut self, volume: u8) {
        if self.headset_volume != volume {
            self.headset_volume = volume;
            self.headset_volume_dirty = true;
        }
    }

    /// Route audio to the internal speaker instead of the headset jack.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.routing_dirty = true;
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        if self.muted != muted {
            self.muted = muted;
            self.mute_dirty = true;
        }
    }

    pub(crate) fn routing_bits(&self) -> AudioEnableFlags {
        if self.enabled {
            AudioEnableFlags::INTERNAL_SPEAKER | AudioEnableFlags::DISABLE_HEADPHONES
        } else {
            AudioEnableFlags::empty()
        }
    }

    pub(crate) fn mute_bits(&self) -> AudioMuteFlags {
        if self.muted {
            AudioMuteFlags::INTERNAL_SPEAKER | AudioMuteFlags::HEADSET
        } else {
            AudioMuteFlags::empty()
        }
    }

    pub(crate) fn take_volume(&mut self) -> Option<u8> {
        std::mem::take(&mut self.volume_dirty).then_some(self.volume)
    }

    pub(crate) fn take_headset_volume(&mut self) -> Option<u8> {
        std::mem::take(&mut self.headset_volume_dirty).then_some(self.headset_volume)
    }

    pub(crate) fn take_routing(&mut self) -> bool {
        std::mem::take(&mut self.routing_dirty)
    }

    pub(crate) fn take_mute(&mut self) -> bool {
        std::mem::take(&mut self.mute_dirty)
    }
}

impl OutputComponent for Speaker {
    fn is_dirty(&self) -> bool {
        self.volume_dirty || self.headset_volume_dirty || self.routing_dirty || self.mute_dirty
    }

    fn force_update(&mut self) {
        self.volume_dirty = true;
        self.headset_volume_dirty = true;
        self.routing_dirty = true;
        self.mute_dirty = true;
    }
}

/// Built-in microphone (also covers a headset microphone).
#[derive(Debug, Clone, Default)]
pub struct Microphone {
    volume: u8,
    enabled: bool,
    muted: bool,
    volume_dirty: bool,
    routing_dirty: bool,
    mute_dirty: bool,
}

impl Microphone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn set_volume(&mut self, volume: u8) {
        if self.volume != volume {
            self.volume = volume;
            self.volume_dirty = true;
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.routing_dirty = true;
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        if self.muted != muted {
            self.muted = muted;
            self.mute_dirty = true;
        }
    }

    /// Flip the mute state and return the new value.
    pub fn toggle_muted(&mut self) -> bool {
        self.set_muted(!self.muted);
        self.muted
    }

    pub(crate) fn routing_bits(&self) -> AudioEnableFlags {
        if self.enabled {
            AudioEnableFlags::MICROPHONE
        } else {
            AudioEnableFlags::empty()
        }
    }

    pub(crate) fn mute_bits(&self) -> AudioMuteFlags {
        if self.muted {
            AudioMuteFlags::MICROPHONE
        } else {
            AudioMuteFlags::empty()
        }
    }

    pub(crate) fn take_volume(&mut self) -> Option<u8> {
        std::mem::take(&mut self.volume_dirty).then_some(self.volume)
    }

    pub(crate) fn take_routing(&mut self) -> bool {
        std::mem::take(&mut self.routing_dirty)
    }

    pub(crate) fn take_mute(&mut self) -> bool {
        std::mem::take(&mut self.mute_dirty)
    }
}

impl OutputComponent for Microphone {
    fn is_dirty(&self) -> bool {
        self.volume_dirty || self.routing_dirty || self.mute_dirty
    }

    fn force_update(&mut self) {
        self.volume_dirty = true;
        self.routing_dirty = true;
        self.mute_dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_fields_are_tracked_separately() {
        let mut speaker = Speaker::new();
        speaker.set_volume(80);

        assert_eq!(speaker.take_headset_volume(), None);
        assert!(!speaker.take_routing());
        assert_eq!(speaker.take_volume(), Some(80));
        assert!(!speaker.is_dirty());
    }

    #[test]
    fn test_speaker_bits() {
        let mut speaker = Speaker::new();
        assert!(speaker.routing_bits().is_empty());

        speaker.set_enabled(true);
        speaker.set_muted(true);
        assert_eq!(speaker.routing_bits().bits(), 0x30);
        assert_eq!(speaker.mute_bits().bits(), 0x60);
    }

    #[test]
    fn test_microphone_toggle() {
        let mut mic = Microphone::new();
        assert!(mic.toggle_muted());
        assert!(mic.take_mute());
        assert_eq!(mic.mute_bits(), AudioMuteFlags::MICROPHONE);
        assert!(!mic.toggle_muted());
        assert!(mic.mute_bits().is_empty());
    }

    #[test]
    fn test_unchanged_setters_stay_clean() {
        let mut mic = Microphone::new();
        mic.set_volume(0);
        mic.set_enabled(false);
        mic.set_muted(false);
        assert!(!mic.is_dirty());
    }

    #[test]
    fn test_force_update_marks_every_field() {
        let mut speaker = Speaker::new();
        speaker.force_update();
        assert_eq!(speaker.take_volume(), Some(0));
        assert_eq!(speaker.take_headset_volume(), Some(0));
        assert!(speaker.take_routing());
        assert!(speaker.take_mute());
    }
}
