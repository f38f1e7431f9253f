//! Widget configuration: the playlist, playback defaults, prompt timings and
//! the set of optional controls a page exposes.

use crate::audio_manager::GestureKind;
use crate::components::ControlHooks;
use crate::error::MusicError;
use serde::{Deserialize, Serialize};

/// Id of the optional `<script type="application/json">` element carrying page config.
pub const PAGE_CONFIG_ELEMENT_ID: &str = "shared-music-config";

/// One playlist entry as written in config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    pub name: String,
    pub file: String,
}

impl TrackConfig {
    fn new(name: &str, file: &str) -> Self {
        Self {
            name: name.to_string(),
            file: file.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    pub tracks: Vec<TrackConfig>,
    pub shuffle: bool,
    /// Loop the current track forever instead of advancing through the playlist.
    pub loop_track: bool,
    pub default_volume: f64,
    pub prompt_message: String,
    pub prompt_duration_ms: u32,
    pub reprompt_delay_ms: u32,
    pub volume_debounce_ms: u32,
    pub gestures: Vec<GestureKind>,
    pub hooks: ControlHooks,
    pub publish_globals: bool,
}

fn default_tracks() -> Vec<TrackConfig> {
    vec![
        TrackConfig::new("Feel The Funk", "music/FeelTheFunk.mp4"),
        TrackConfig::new("I Wanna Kno", "music/IWannaKno.mp4"),
        TrackConfig::new("In The Pocket", "music/InThePocket.mp4"),
        TrackConfig::new("Light Switch", "music/LightSwitch.mp4"),
        TrackConfig::new("Morning Glow", "music/MorningGlow.mp4"),
    ]
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            tracks: default_tracks(),
            shuffle: true,
            loop_track: false,
            default_volume: 0.3,
            prompt_message: "🎵 Click anywhere to enable music".to_string(),
            prompt_duration_ms: 10_000,
            reprompt_delay_ms: 1_000,
            volume_debounce_ms: 10,
            gestures: GestureKind::DEFAULT_SET.to_vec(),
            hooks: ControlHooks::default(),
            publish_globals: true,
        }
    }
}

impl MusicConfig {
    pub fn from_json(raw: &str) -> Result<Self, MusicError> {
        let config: MusicConfig = serde_json::from_str(raw)?;
        config.validated()
    }

    /// Rejects an empty playlist and normalizes the default volume.
    pub fn validated(mut self) -> Result<Self, MusicError> {
        if self.tracks.is_empty() {
            return Err(MusicError::EmptyPlaylist);
        }
        self.default_volume = normalize_volume(self.default_volume);
        Ok(self)
    }
}

fn normalize_volume(value: f64) -> f64 {
    if !value.is_finite() {
        return MusicConfig::default().default_volume;
    }
    value.clamp(0.0, 1.0)
}
