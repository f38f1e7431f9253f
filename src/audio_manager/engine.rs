//! Playback engine: a thin, clamped facade over the one media handle the
//! process owns.

use super::playlist::Track;
use crate::error::MusicError;
use futures_util::future::LocalBoxFuture;
use std::cell::Cell;
use std::rc::Rc;
use tracing::info;

pub type PlayFuture = LocalBoxFuture<'static, Result<(), MusicError>>;

/// Raw media element operations. The browser implementation wraps the page's
/// `<audio>` element; tests use a scripted fake.
pub trait MediaBackend {
    fn set_source(&self, locator: &str);
    /// Starts or resumes playback. The outcome arrives asynchronously.
    fn play(&self) -> PlayFuture;
    fn pause(&self);
    fn set_current_time(&self, seconds: f64);
    fn volume(&self) -> f64;
    fn set_volume(&self, volume: f64);
    fn paused(&self) -> bool;
    fn set_loop(&self, looping: bool);
    /// Replaces the natural-end handler.
    fn on_ended(&self, handler: Rc<dyn Fn()>);
}

pub struct PlaybackEngine {
    backend: Box<dyn MediaBackend>,
    looping: Rc<Cell<bool>>,
}

impl PlaybackEngine {
    pub fn new(backend: Box<dyn MediaBackend>) -> Self {
        Self {
            backend,
            looping: Rc::new(Cell::new(false)),
        }
    }

    /// Points the handle at `track`. Never starts playback by itself.
    pub fn load(&self, track: &Track) {
        info!("Loading track: {} ({})", track.name(), track.locator());
        self.backend.set_source(track.locator());
    }

    pub fn play(&self) -> PlayFuture {
        self.backend.play()
    }

    pub fn pause(&self) {
        self.backend.pause();
    }

    pub fn seek_to_start(&self) {
        self.backend.set_current_time(0.0);
    }

    /// Applies `volume` clamped to `[0, 1]` and returns what was applied.
    /// Non-finite input leaves the volume untouched.
    pub fn set_volume(&self, volume: f64) -> f64 {
        if volume.is_finite() {
            self.backend.set_volume(volume.clamp(0.0, 1.0));
        }
        self.volume()
    }

    pub fn volume(&self) -> f64 {
        self.backend.volume()
    }

    pub fn is_paused(&self) -> bool {
        self.backend.paused()
    }

    /// In loop mode the media element restarts the track natively and no
    /// end-of-track signal is delivered.
    pub fn set_looping(&self, looping: bool) {
        self.looping.set(looping);
        self.backend.set_loop(looping);
    }

    pub fn is_looping(&self) -> bool {
        self.looping.get()
    }

    pub fn on_track_ended(&self, handler: Rc<dyn Fn()>) {
        let looping = self.looping.clone();
        self.backend.on_ended(Rc::new(move || {
            if !looping.get() {
                handler();
            }
        }));
    }
}
