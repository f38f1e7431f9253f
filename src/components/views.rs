use crate::components::MusicControls;
use dioxus::prelude::*;

#[component]
pub fn Home() -> Element {
    rsx! {
        section { class: "page",
            h1 { "Shared Music" }
            p { "Background music keeps playing while you move between pages." }
            MusicControls {}
        }
    }
}

#[component]
pub fn About() -> Element {
    rsx! {
        section { class: "page",
            h1 { "About" }
            p { "Tracks, controls and the autoplay prompt are configured per page." }
            MusicControls {}
        }
    }
}
