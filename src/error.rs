use thiserror::Error;

/// Everything that can go wrong between the widget and the host page.
///
/// Playback failures are expected and recoverable: the controller logs them
/// and folds them into its state instead of handing them to callers.
#[derive(Debug, Error)]
pub enum MusicError {
    /// The browser refused to start audio without a prior user gesture.
    #[error("playback blocked by the autoplay policy")]
    PlaybackBlocked,

    /// A pending play was superseded by a new load or a pause.
    #[error("playback interrupted before it started")]
    PlaybackInterrupted,

    #[error("failed to load audio resource: {0}")]
    ResourceLoad(String),

    #[error("UI element not present: {0}")]
    MissingUiElement(String),

    #[error("playlist has no tracks")]
    EmptyPlaylist,

    #[error("invalid music config: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("host runtime error: {0}")]
    Host(String),
}

impl MusicError {
    /// Autoplay refusals and superseded plays are part of normal operation.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            MusicError::PlaybackBlocked | MusicError::PlaybackInterrupted
        )
    }
}
