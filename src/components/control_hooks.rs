//! Maps the optional page controls onto playback operations.
//!
//! Every control is optional. The binding table is built once from the
//! config, and a control that is switched off simply never binds.

use crate::audio_manager::PlaybackController;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which controls the page renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlHooks {
    pub volume_slider: bool,
    pub volume_icon: bool,
    pub rewind: bool,
    pub play_pause: bool,
    pub skip: bool,
    pub song_selector: bool,
}

impl Default for ControlHooks {
    fn default() -> Self {
        Self {
            volume_slider: true,
            volume_icon: true,
            rewind: true,
            play_pause: true,
            skip: true,
            song_selector: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlHook {
    VolumeSlider,
    VolumeIcon,
    Rewind,
    PlayPause,
    Skip,
    SongSelector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEffect {
    SetVolume,
    ToggleMute,
    Restart,
    TogglePlayPause,
    Advance,
    SelectTrack,
}

/// Render order of the controls and the operation each one triggers.
pub const CONTROL_TABLE: [(ControlHook, ControlEffect); 6] = [
    (ControlHook::Rewind, ControlEffect::Restart),
    (ControlHook::PlayPause, ControlEffect::TogglePlayPause),
    (ControlHook::Skip, ControlEffect::Advance),
    (ControlHook::VolumeIcon, ControlEffect::ToggleMute),
    (ControlHook::VolumeSlider, ControlEffect::SetVolume),
    (ControlHook::SongSelector, ControlEffect::SelectTrack),
];

impl ControlHooks {
    pub fn is_present(&self, hook: ControlHook) -> bool {
        match hook {
            ControlHook::VolumeSlider => self.volume_slider,
            ControlHook::VolumeIcon => self.volume_icon,
            ControlHook::Rewind => self.rewind,
            ControlHook::PlayPause => self.play_pause,
            ControlHook::Skip => self.skip,
            ControlHook::SongSelector => self.song_selector,
        }
    }

    /// The bindings for the controls that are present, in render order.
    pub fn bindings(&self) -> Vec<(ControlHook, ControlEffect)> {
        CONTROL_TABLE
            .iter()
            .copied()
            .filter(|(hook, _)| self.is_present(*hook))
            .collect()
    }
}

/// Raw value coming from a control's DOM event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlInput<'a> {
    Click,
    /// Slider position on the 0-100 scale.
    Slider(&'a str),
    /// Selected option value, a track index or "" for the placeholder.
    Choice(&'a str),
}

/// Runs `effect` against the controller.
///
/// Returns the volume the slider should now show when the effect changes it
/// immediately (muting); debounced slider input returns `None`.
pub fn apply_control(
    controller: &PlaybackController,
    effect: ControlEffect,
    input: ControlInput<'_>,
) -> Option<f64> {
    match effect {
        ControlEffect::SetVolume => {
            let ControlInput::Slider(raw) = input else {
                return None;
            };
            match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => {
                    controller.set_volume_debounced(value / 100.0);
                }
                _ => debug!("Ignoring slider value {raw:?}"),
            }
            None
        }
        ControlEffect::ToggleMute => Some(controller.toggle_mute()),
        ControlEffect::Restart => {
            controller.restart();
            None
        }
        ControlEffect::TogglePlayPause => {
            controller.toggle_play_pause();
            None
        }
        ControlEffect::Advance => {
            controller.advance();
            None
        }
        ControlEffect::SelectTrack => {
            let ControlInput::Choice(raw) = input else {
                return None;
            };
            if raw.is_empty() {
                return None;
            }
            match raw.parse::<usize>() {
                Ok(index) => {
                    controller.select_track(index);
                }
                Err(_) => debug!("Ignoring song selection {raw:?}"),
            }
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeLevel {
    Muted,
    Low,
    Full,
}

impl VolumeLevel {
    pub fn from_volume(volume: f64) -> Self {
        if volume <= 0.0 {
            VolumeLevel::Muted
        } else if volume < 0.5 {
            VolumeLevel::Low
        } else {
            VolumeLevel::Full
        }
    }

    pub fn icon_name(self) -> &'static str {
        match self {
            VolumeLevel::Muted => "volume-x",
            VolumeLevel::Low => "volume-low",
            VolumeLevel::Full => "volume",
        }
    }
}

/// Engine volume as a slider position.
pub fn slider_value(volume: f64) -> u32 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u32
}
