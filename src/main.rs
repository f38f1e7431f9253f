use dioxus::prelude::*;

mod audio_manager;
mod components;
mod config;
mod error;

use audio_manager::{MusicSystem, PlaybackController};
use components::Route;

const MUSIC_CSS: Asset = asset!("/assets/styling/music.css");

fn main() {
    let level = if cfg!(debug_assertions) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // A logger installed by the host page wins; keep going without ours.
    let _ = dioxus::logger::init(level);

    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    // Start the music once for the whole session, before any page mounts.
    use_hook(|| MusicSystem::global().map(PlaybackController::attach));

    rsx! {
        document::Meta { name: "theme-color", content: "#a38449" }
        document::Title { "Shared Music" }
        document::Stylesheet { href: MUSIC_CSS }

        Router::<Route> {}
    }
}
