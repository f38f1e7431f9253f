//! Seam between the playback core and the page's event loop.
//!
//! Everything here runs on the single UI thread: tasks are spawned onto the
//! host loop, timers and listeners fire as separate turns of that loop, and a
//! handler always runs to completion before the next one starts.

use crate::error::MusicError;
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

pub type LocalTask = LocalBoxFuture<'static, ()>;

/// User gestures that count as permission to start audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    PointerDown,
    KeyDown,
    TouchStart,
    Scroll,
}

impl GestureKind {
    pub const DEFAULT_SET: [GestureKind; 4] = [
        GestureKind::PointerDown,
        GestureKind::KeyDown,
        GestureKind::TouchStart,
        GestureKind::Scroll,
    ];

    /// DOM event type the gesture listens for.
    pub fn event_name(self) -> &'static str {
        match self {
            GestureKind::PointerDown => "pointerdown",
            GestureKind::KeyDown => "keydown",
            GestureKind::TouchStart => "touchstart",
            GestureKind::Scroll => "scroll",
        }
    }

    /// Press gestures that are followed by a `click` on the same target.
    pub fn precedes_click(self) -> bool {
        matches!(self, GestureKind::PointerDown | GestureKind::TouchStart)
    }
}

/// Handle to something attached to the host (timer, listener, subscriber).
/// Dropping it detaches; the detach closure runs at most once.
#[must_use = "dropping a Registration detaches it immediately"]
pub struct Registration {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Registration {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A registration with nothing to undo.
    pub fn detached() -> Self {
        Self { detach: None }
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// The page runtime as seen by the playback core.
pub trait Host {
    /// Runs `task` on the host loop; never polls it inline.
    fn spawn(&self, task: LocalTask);

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Registration;

    /// Listens for `gesture` anywhere on the page until the registration drops.
    fn listen(&self, gesture: GestureKind, handler: Rc<dyn Fn()>)
        -> Result<Registration, MusicError>;

    /// Puts the "enable music" prompt on screen. `on_click` fires when the
    /// prompt itself is clicked.
    fn show_prompt(&self, message: &str, on_click: Rc<dyn Fn()>) -> Result<(), MusicError>;

    fn hide_prompt(&self);
}
