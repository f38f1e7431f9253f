//! Playback controller: the state machine over the shared music system.
//!
//! Every `play()` outcome is consumed in a task on the host loop. Rejections
//! are logged and folded into state; none of them reach the caller.

use super::engine::PlayFuture;
use super::gate::InteractionGate;
use super::host::{GestureKind, Registration};
use super::system::{MusicSystem, PlaybackSnapshot, PlaybackState, PlayerStatus};
use crate::config::MusicConfig;
use crate::error::MusicError;
use futures_util::FutureExt;
use std::rc::{Rc, Weak};
use tracing::{debug, info, warn};

/// How long a toggle is ignored after a press opened the gate and started
/// playback; the press's own click lands on the play button within it.
const CLICK_GRACE_MS: u32 = 1_000;

#[derive(Clone)]
pub struct PlaybackController {
    system: Rc<MusicSystem>,
}

impl PartialEq for PlaybackController {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.system, &other.system)
    }
}

impl PlaybackController {
    /// Attaches a controller to the shared system.
    ///
    /// The first controller in the process loads the first track and tries to
    /// autoplay. Later ones only re-arm the interaction gate when playback is
    /// still waiting for a gesture.
    pub fn attach(system: Rc<MusicSystem>) -> Self {
        let controller = Self { system };
        let first = {
            let mut state = controller.system.state.borrow_mut();
            let first = !state.initialized;
            state.initialized = true;
            first
        };
        if first {
            controller.initialize();
        } else {
            controller.reattach();
        }
        controller
    }

    /// A handle onto `system` without the attach side effects.
    pub(super) fn view(system: Rc<MusicSystem>) -> Self {
        Self { system }
    }

    fn from_weak(system: &Weak<MusicSystem>) -> Option<Self> {
        system.upgrade().map(Self::view)
    }

    fn initialize(&self) {
        let system = Rc::downgrade(&self.system);
        self.system.engine.on_track_ended(Rc::new(move || {
            if let Some(controller) = Self::from_weak(&system) {
                controller.on_track_ended();
            }
        }));
        self.load_current();
        self.attempt_autoplay();
    }

    fn reattach(&self) {
        let engine_playing = !self.system.engine.is_paused();
        let (granted, status) = {
            let state = self.system.state.borrow();
            (state.interaction_granted, state.status)
        };
        if granted {
            return;
        }
        if engine_playing {
            // Audio kept running from an earlier view.
            self.update(|state| {
                state.interaction_granted = true;
                state.autoplay_blocked = false;
                state.status = PlayerStatus::Playing;
            });
            return;
        }
        if status == PlayerStatus::Blocked {
            self.arm_gate();
            self.schedule_reprompt();
        }
    }

    pub fn config(&self) -> &MusicConfig {
        self.system.config()
    }

    pub fn state(&self) -> PlaybackState {
        self.system.state()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.system.snapshot()
    }

    pub fn status(&self) -> PlayerStatus {
        self.system.state.borrow().status
    }

    pub fn track_names(&self) -> Vec<String> {
        self.system.track_names()
    }

    pub fn subscribe(&self, listener: impl Fn(&PlaybackSnapshot) + 'static) -> Registration {
        self.system.subscribe(listener)
    }

    /// Moves to the next position, reshuffling on a forward wrap in shuffle mode.
    pub fn advance(&self) {
        let track_count = self.system.playlist.borrow().track_count();
        let wrapped = {
            let mut state = self.system.state.borrow_mut();
            state.current_position = (state.current_position + 1) % track_count;
            state.current_position == 0
        };
        if wrapped && self.system.playlist.borrow().is_shuffled() {
            let mut playlist = self.system.playlist.borrow_mut();
            playlist.reshuffle(&mut *self.system.rng.borrow_mut());
            info!("Reshuffled playlist: {:?}", playlist.order_names());
        }
        self.load_current();
        self.resume_if_granted();
    }

    /// Moves to the previous position. Never reshuffles.
    pub fn retreat(&self) {
        let track_count = self.system.playlist.borrow().track_count();
        {
            let mut state = self.system.state.borrow_mut();
            state.current_position = (state.current_position + track_count - 1) % track_count;
        }
        self.load_current();
        self.resume_if_granted();
    }

    /// Jumps to the track with index `track_index` in the playlist. Out of
    /// range indices are ignored. Returns whether a track was selected.
    pub fn select_track(&self, track_index: usize) -> bool {
        let position = self.system.playlist.borrow().position_of(track_index);
        let Some(position) = position else {
            debug!("Ignoring selection of track {track_index}: out of range");
            return false;
        };
        self.system.state.borrow_mut().current_position = position;
        self.load_current();
        self.resume_if_granted();
        true
    }

    pub fn restart(&self) {
        self.system.engine.seek_to_start();
        self.resume_if_granted();
    }

    pub fn toggle_play_pause(&self) {
        let in_grace = self.system.click_grace.take().is_some();
        if in_grace && !self.system.engine.is_paused() {
            debug!("Ignoring play/pause from the press that started playback");
            return;
        }
        let granted = self.system.state.borrow().interaction_granted;
        if self.system.engine.is_paused() && granted {
            self.play_granted();
        } else {
            self.system.engine.pause();
            self.update(|state| state.status = PlayerStatus::Paused);
        }
    }

    /// Records the user gesture that authorizes audio. Idempotent.
    pub fn grant_interaction(&self) {
        {
            let mut state = self.system.state.borrow_mut();
            if state.interaction_granted {
                return;
            }
            state.interaction_granted = true;
            state.autoplay_blocked = false;
        }
        info!("User interaction granted, starting music");
        drop(self.system.reprompt.take());
        drop(self.system.gate.take());
        self.dismiss_prompt();
        self.play_granted();
    }

    /// Applies a volume in `[0, 1]` and returns what the engine now reports.
    pub fn set_volume(&self, volume: f64) -> f64 {
        if !volume.is_finite() {
            warn!("Ignoring non-finite volume {volume}");
            return self.volume();
        }
        let applied = self.system.engine.set_volume(volume);
        self.update(|state| state.volume = applied);
        applied
    }

    /// Like [`PlaybackController::set_volume`] but waits for the configured
    /// debounce interval; a newer value cancels the pending one.
    pub fn set_volume_debounced(&self, volume: f64) {
        let delay = self.system.config.volume_debounce_ms;
        if delay == 0 {
            self.set_volume(volume);
            return;
        }
        let system = Rc::downgrade(&self.system);
        let timer = self.system.host.set_timeout(
            delay,
            Box::new(move || {
                if let Some(controller) = Self::from_weak(&system) {
                    controller.set_volume(volume);
                }
            }),
        );
        drop(self.system.pending_volume.replace(Some(timer)));
    }

    pub fn volume(&self) -> f64 {
        self.system.engine.volume()
    }

    /// Mutes, or restores the volume from before the last mute (falling back
    /// to the configured default). Returns the new volume.
    pub fn toggle_mute(&self) -> f64 {
        let current = self.volume();
        let target = if current > 0.0 {
            self.system.state.borrow_mut().restore_volume = Some(current);
            0.0
        } else {
            let restore = self.system.state.borrow_mut().restore_volume.take();
            restore.unwrap_or(self.system.config.default_volume)
        };
        self.set_volume(target)
    }

    fn on_track_ended(&self) {
        if self.system.engine.is_looping() {
            return;
        }
        self.advance();
    }

    fn load_current(&self) {
        let track = {
            let state = self.system.state.borrow();
            self.system.playlist.borrow().track_at(state.current_position).clone()
        };
        self.system.engine.load(&track);
        self.update(|state| {
            state.status = if state.autoplay_blocked {
                PlayerStatus::Blocked
            } else {
                PlayerStatus::Loaded
            };
        });
    }

    fn resume_if_granted(&self) {
        if self.system.state.borrow().interaction_granted {
            self.play_granted();
        } else {
            self.system.notify();
        }
    }

    fn attempt_autoplay(&self) {
        let outcome = self.system.engine.play();
        let controller = self.clone();
        self.spawn_outcome(outcome, move |result| controller.on_autoplay_outcome(result));
    }

    fn on_autoplay_outcome(&self, result: Result<(), MusicError>) {
        let granted = self.system.state.borrow().interaction_granted;
        match result {
            Ok(()) => {
                info!("Autoplay started");
                self.update(|state| {
                    state.interaction_granted = true;
                    state.autoplay_blocked = false;
                });
                self.sync_status();
            }
            Err(err) if granted => {
                debug!("Autoplay attempt superseded after interaction: {err}");
                self.sync_status();
            }
            Err(err) if !err.is_expected() => {
                // Nothing a gesture could fix; leave playback stopped.
                warn!("Autoplay failed: {err}");
                self.sync_status();
            }
            Err(err) => {
                debug!("Autoplay blocked: {err}");
                self.update(|state| {
                    state.autoplay_blocked = true;
                    state.status = PlayerStatus::Blocked;
                });
                self.show_prompt();
                self.arm_gate();
            }
        }
    }

    /// Plays after a grant. Failures never move back to `Blocked`.
    fn play_granted(&self) {
        let outcome = self.system.engine.play();
        self.sync_status();
        let controller = self.clone();
        self.spawn_outcome(outcome, move |result| {
            if let Err(err) = result {
                if err.is_expected() {
                    debug!("Playback error: {err}");
                } else {
                    warn!("Playback error: {err}");
                }
            }
            controller.sync_status();
        });
    }

    fn spawn_outcome(
        &self,
        outcome: PlayFuture,
        on_outcome: impl FnOnce(Result<(), MusicError>) + 'static,
    ) {
        self.system.host.spawn(
            async move {
                let result = outcome.await;
                on_outcome(result);
            }
            .boxed_local(),
        );
    }

    fn sync_status(&self) {
        let paused = self.system.engine.is_paused();
        self.update(|state| {
            state.status = if paused {
                PlayerStatus::Paused
            } else {
                PlayerStatus::Playing
            };
        });
    }

    fn update(&self, change: impl FnOnce(&mut PlaybackState)) {
        change(&mut self.system.state.borrow_mut());
        self.system.notify();
    }

    fn arm_gate(&self) {
        if self.system.state.borrow().interaction_granted {
            return;
        }
        let system = Rc::downgrade(&self.system);
        let gate = InteractionGate::arm(
            self.system.host.as_ref(),
            &self.system.config.gestures,
            move |gesture| {
                if let Some(controller) = Self::from_weak(&system) {
                    controller.grant_from_gesture(gesture);
                }
            },
        );
        drop(self.system.gate.replace(Some(gate)));
    }

    fn grant_from_gesture(&self, gesture: GestureKind) {
        self.grant_interaction();
        if !gesture.precedes_click() {
            return;
        }
        let system = Rc::downgrade(&self.system);
        let timer = self.system.host.set_timeout(
            CLICK_GRACE_MS,
            Box::new(move || {
                if let Some(system) = system.upgrade() {
                    drop(system.click_grace.take());
                }
            }),
        );
        drop(self.system.click_grace.replace(Some(timer)));
    }

    fn schedule_reprompt(&self) {
        let system = Rc::downgrade(&self.system);
        let timer = self.system.host.set_timeout(
            self.system.config.reprompt_delay_ms,
            Box::new(move || {
                let Some(controller) = Self::from_weak(&system) else {
                    return;
                };
                let granted = controller.system.state.borrow().interaction_granted;
                if !granted && controller.system.engine.is_paused() {
                    controller.show_prompt();
                }
            }),
        );
        drop(self.system.reprompt.replace(Some(timer)));
    }

    fn show_prompt(&self) {
        let on_click: Rc<dyn Fn()> = {
            let system = Rc::downgrade(&self.system);
            Rc::new(move || {
                if let Some(controller) = Self::from_weak(&system) {
                    controller.grant_interaction();
                }
            })
        };
        let on_expire: Box<dyn FnOnce()> = {
            let system = Rc::downgrade(&self.system);
            Box::new(move || {
                if let Some(controller) = Self::from_weak(&system) {
                    controller.dismiss_prompt();
                }
            })
        };
        let shown = self.system.prompt.borrow_mut().show(
            self.system.host.as_ref(),
            &self.system.config.prompt_message,
            self.system.config.prompt_duration_ms,
            on_click,
            on_expire,
        );
        if shown {
            debug!("Showing music prompt");
            self.system.notify();
        }
    }

    fn dismiss_prompt(&self) {
        let dismissed = self
            .system
            .prompt
            .borrow_mut()
            .dismiss(self.system.host.as_ref());
        if dismissed {
            debug!("Dismissed music prompt");
            self.system.notify();
        }
    }
}
