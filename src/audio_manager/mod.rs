//! Audio Manager - owns the page's background music outside of the component
//! render cycle, so re-rendering or navigating never restarts playback.

mod controller;
mod engine;
mod gate;
mod host;
mod playlist;
mod prompt;
mod system;
#[cfg(test)]
pub(crate) mod testing;
#[cfg(target_arch = "wasm32")]
mod web;

pub use controller::PlaybackController;
pub use engine::MediaBackend;
pub use host::{GestureKind, Host, Registration};
pub use system::{MusicSystem, PlaybackSnapshot, PlaybackState, PlayerStatus};
