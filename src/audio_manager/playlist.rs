//! Playlist store: the fixed track list plus the optional shuffle order.

use crate::config::MusicConfig;
use crate::error::MusicError;
use rand::seq::SliceRandom;
use rand::Rng;

/// A playable asset. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    name: String,
    locator: String,
}

impl Track {
    pub fn new(name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locator: locator.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path or URI handed to the media element.
    pub fn locator(&self) -> &str {
        &self.locator
    }
}

/// Ordered tracks with a permutation used while shuffle mode is on.
///
/// `order` is always a permutation of `0..tracks.len()`; with shuffle off it
/// stays the identity.
#[derive(Debug, Clone)]
pub struct Playlist {
    tracks: Vec<Track>,
    order: Vec<usize>,
    shuffle: bool,
    reshuffles: u64,
}

impl Playlist {
    pub fn new<R: Rng + ?Sized>(
        tracks: Vec<Track>,
        shuffle: bool,
        rng: &mut R,
    ) -> Result<Self, MusicError> {
        if tracks.is_empty() {
            return Err(MusicError::EmptyPlaylist);
        }
        let mut order: Vec<usize> = (0..tracks.len()).collect();
        if shuffle {
            order.shuffle(rng);
        }
        Ok(Self {
            tracks,
            order,
            shuffle,
            reshuffles: 0,
        })
    }

    pub fn from_config<R: Rng + ?Sized>(config: &MusicConfig, rng: &mut R) -> Result<Self, MusicError> {
        let tracks = config
            .tracks
            .iter()
            .map(|t| Track::new(t.name.clone(), t.file.clone()))
            .collect();
        Self::new(tracks, config.shuffle, rng)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Maps a logical position to a track index through the shuffle order.
    pub fn effective_index(&self, position: usize) -> usize {
        if self.shuffle {
            self.order[position]
        } else {
            position
        }
    }

    pub fn track_at(&self, position: usize) -> &Track {
        &self.tracks[self.effective_index(position)]
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Inverse of [`Playlist::effective_index`].
    pub fn position_of(&self, track_index: usize) -> Option<usize> {
        if track_index >= self.tracks.len() {
            return None;
        }
        if self.shuffle {
            self.order.iter().position(|&i| i == track_index)
        } else {
            Some(track_index)
        }
    }

    /// Draws a fresh uniform permutation. Only meaningful in shuffle mode.
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.order.shuffle(rng);
        self.reshuffles += 1;
    }

    /// How many times the order has been redrawn since creation.
    pub fn reshuffle_count(&self) -> u64 {
        self.reshuffles
    }

    /// Track names in effective play order, for logging.
    pub fn order_names(&self) -> Vec<&str> {
        (0..self.tracks.len())
            .map(|position| self.track_at(position).name())
            .collect()
    }
}
