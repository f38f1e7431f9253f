//! Process-wide music context.
//!
//! One `MusicSystem` exists per page process. It owns the playlist, the single
//! media handle and the shared playback state; controllers are cheap views
//! onto it, so re-mounting UI never restarts or duplicates playback.

use super::engine::{MediaBackend, PlaybackEngine};
use super::gate::InteractionGate;
use super::host::{Host, Registration};
use super::playlist::Playlist;
use super::prompt::MusicPrompt;
use crate::config::MusicConfig;
use crate::error::MusicError;
use once_cell::unsync::OnceCell;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerStatus {
    /// Nothing loaded yet.
    #[default]
    Idle,
    /// A track is loaded but not started.
    Loaded,
    Playing,
    Paused,
    /// Autoplay was refused; waiting for a user gesture.
    Blocked,
}

/// Shared playback state. Only the controller mutates it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackState {
    pub status: PlayerStatus,
    /// Index into the effective (shuffled or identity) order.
    pub current_position: usize,
    pub interaction_granted: bool,
    pub autoplay_blocked: bool,
    pub volume: f64,
    /// Volume to restore when un-muting.
    pub restore_volume: Option<f64>,
    pub initialized: bool,
}

/// Read-only view handed to UI subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub status: PlayerStatus,
    pub position: usize,
    pub track_index: usize,
    pub track_name: String,
    pub volume: f64,
    pub interaction_granted: bool,
    pub autoplay_blocked: bool,
    pub prompt_visible: bool,
}

type Subscriber = Rc<dyn Fn(&PlaybackSnapshot)>;

pub struct MusicSystem {
    pub(super) config: MusicConfig,
    pub(super) engine: PlaybackEngine,
    pub(super) host: Rc<dyn Host>,
    pub(super) state: RefCell<PlaybackState>,
    pub(super) playlist: RefCell<Playlist>,
    pub(super) rng: RefCell<StdRng>,
    pub(super) gate: RefCell<Option<InteractionGate>>,
    pub(super) prompt: RefCell<MusicPrompt>,
    pub(super) reprompt: RefCell<Option<Registration>>,
    pub(super) pending_volume: RefCell<Option<Registration>>,
    /// Open while the press that granted interaction may still deliver its click.
    pub(super) click_grace: RefCell<Option<Registration>>,
    subscribers: RefCell<Vec<(u64, Subscriber)>>,
    next_subscriber: Cell<u64>,
}

thread_local! {
    static GLOBAL_SYSTEM: OnceCell<Rc<MusicSystem>> = const { OnceCell::new() };
}

impl MusicSystem {
    pub fn new(
        config: MusicConfig,
        backend: Box<dyn MediaBackend>,
        host: Rc<dyn Host>,
    ) -> Result<Rc<Self>, MusicError> {
        Self::with_rng(config, backend, host, StdRng::from_entropy())
    }

    pub fn with_rng(
        config: MusicConfig,
        backend: Box<dyn MediaBackend>,
        host: Rc<dyn Host>,
        mut rng: StdRng,
    ) -> Result<Rc<Self>, MusicError> {
        let config = config.validated()?;
        let playlist = Playlist::from_config(&config, &mut rng)?;
        if playlist.is_shuffled() {
            info!(
                "Music system initialized with shuffled order: {:?}",
                playlist.order_names()
            );
        } else {
            info!("Music system initialized with {} tracks", playlist.track_count());
        }

        let engine = PlaybackEngine::new(backend);
        engine.set_looping(config.loop_track);
        let volume = engine.set_volume(config.default_volume);

        Ok(Rc::new(Self {
            config,
            engine,
            host,
            state: RefCell::new(PlaybackState {
                volume,
                ..PlaybackState::default()
            }),
            playlist: RefCell::new(playlist),
            rng: RefCell::new(rng),
            gate: RefCell::new(None),
            prompt: RefCell::new(MusicPrompt::default()),
            reprompt: RefCell::new(None),
            pending_volume: RefCell::new(None),
            click_grace: RefCell::new(None),
            subscribers: RefCell::new(Vec::new()),
            next_subscriber: Cell::new(0),
        }))
    }

    /// Returns the process-wide system, building it with `init` on first use.
    /// Later calls reuse the existing instance and never run `init`.
    pub fn global_or_init(
        init: impl FnOnce() -> Result<Rc<MusicSystem>, MusicError>,
    ) -> Result<Rc<MusicSystem>, MusicError> {
        GLOBAL_SYSTEM.with(|cell| cell.get_or_try_init(init).cloned())
    }

    /// The page's music system, created from the page config on first use.
    #[cfg(target_arch = "wasm32")]
    pub fn global() -> Option<Rc<MusicSystem>> {
        match Self::global_or_init(super::web::build_page_system) {
            Ok(system) => Some(system),
            Err(err) => {
                tracing::warn!("Background music unavailable: {err}");
                None
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn global() -> Option<Rc<MusicSystem>> {
        GLOBAL_SYSTEM.with(|cell| cell.get().cloned())
    }

    pub fn config(&self) -> &MusicConfig {
        &self.config
    }

    pub fn state(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    pub fn track_names(&self) -> Vec<String> {
        self.playlist
            .borrow()
            .tracks()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    pub fn reshuffle_count(&self) -> u64 {
        self.playlist.borrow().reshuffle_count()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let state = self.state.borrow();
        let playlist = self.playlist.borrow();
        let track_index = playlist.effective_index(state.current_position);
        PlaybackSnapshot {
            status: state.status,
            position: state.current_position,
            track_index,
            track_name: playlist
                .track(track_index)
                .map(|t| t.name().to_string())
                .unwrap_or_default(),
            volume: state.volume,
            interaction_granted: state.interaction_granted,
            autoplay_blocked: state.autoplay_blocked,
            prompt_visible: self.prompt.borrow().is_visible(),
        }
    }

    /// Calls `listener` with a fresh snapshot after every state change until
    /// the returned registration is dropped.
    pub fn subscribe(self: &Rc<Self>, listener: impl Fn(&PlaybackSnapshot) + 'static) -> Registration {
        let id = self.next_subscriber.get();
        self.next_subscriber.set(id + 1);
        self.subscribers.borrow_mut().push((id, Rc::new(listener)));
        let system = Rc::downgrade(self);
        Registration::new(move || {
            if let Some(system) = system.upgrade() {
                system.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
            }
        })
    }

    pub(super) fn notify(&self) {
        let snapshot = self.snapshot();
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, s)| s.clone())
            .collect();
        for subscriber in subscribers {
            subscriber(&snapshot);
        }
    }
}
