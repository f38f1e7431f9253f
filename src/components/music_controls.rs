use crate::audio_manager::{MusicSystem, PlaybackController, PlaybackSnapshot, PlayerStatus};
use crate::components::{
    apply_control, slider_value, ControlEffect, ControlHook, ControlInput, Icon, VolumeLevel,
};
use dioxus::core::{Runtime, RuntimeGuard};
use dioxus::prelude::*;
use std::rc::Rc;

/// Page-level music controls.
///
/// Mounting attaches to the shared music system, so every page can carry its
/// own controls without restarting playback. Controls switched off in the
/// config are not rendered.
#[component]
pub fn MusicControls() -> Element {
    let controller = use_hook(|| MusicSystem::global().map(PlaybackController::attach));
    let snapshot = use_signal({
        let controller = controller.clone();
        move || controller.as_ref().map(PlaybackController::snapshot)
    });

    // Keep the snapshot current; the registration lives as long as the hook.
    let _subscription = use_hook({
        let controller = controller.clone();
        move || {
            controller.map(|controller| {
                let runtime = Runtime::current();
                Rc::new(controller.subscribe(move |next: &PlaybackSnapshot| {
                    let _guard = RuntimeGuard::new(runtime.clone());
                    let mut snapshot = snapshot;
                    snapshot.set(Some(next.clone()));
                }))
            })
        }
    });

    let (Some(controller), Some(current)) = (controller, snapshot()) else {
        return rsx! {};
    };
    let bindings = controller.config().hooks.bindings();
    let track_names = controller.track_names();

    rsx! {
        div { class: "music-controls",
            for (hook , effect) in bindings {
                MusicControl {
                    key: "{hook:?}",
                    controller: controller.clone(),
                    hook,
                    effect,
                    snapshot: current.clone(),
                    track_names: track_names.clone(),
                }
            }
            if current.status == PlayerStatus::Playing {
                span { class: "music-now-playing", title: "Now playing",
                    Icon { name: "music".to_string(), class: "music-icon".to_string() }
                    "{current.track_name}"
                }
            }
        }
    }
}

#[component]
fn MusicControl(
    controller: PlaybackController,
    hook: ControlHook,
    effect: ControlEffect,
    snapshot: PlaybackSnapshot,
    track_names: Vec<String>,
) -> Element {
    let on_click = {
        let controller = controller.clone();
        move |_: MouseEvent| {
            apply_control(&controller, effect, ControlInput::Click);
        }
    };

    match hook {
        ControlHook::VolumeSlider => rsx! {
            input {
                r#type: "range",
                class: "music-volume-slider",
                title: "Volume",
                min: "0",
                max: "100",
                step: "1",
                value: "{slider_value(snapshot.volume)}",
                oninput: move |evt: FormEvent| {
                    apply_control(&controller, effect, ControlInput::Slider(&evt.value()));
                },
            }
        },
        ControlHook::VolumeIcon => {
            let level = VolumeLevel::from_volume(snapshot.volume);
            let title = if level == VolumeLevel::Muted { "Unmute" } else { "Mute" };
            rsx! {
                button {
                    class: "music-button music-volume-icon",
                    title: "{title}",
                    onclick: on_click,
                    Icon { name: level.icon_name().to_string(), class: "music-icon".to_string() }
                }
            }
        }
        ControlHook::Rewind => rsx! {
            button {
                class: "music-button music-rewind",
                title: "Restart track",
                onclick: on_click,
                Icon { name: "rewind".to_string(), class: "music-icon".to_string() }
            }
        },
        ControlHook::PlayPause => {
            let (icon, title) = if snapshot.status == PlayerStatus::Playing {
                ("pause", "Pause")
            } else {
                ("play", "Play")
            };
            rsx! {
                button {
                    class: "music-button music-play-pause",
                    title: "{title}",
                    onclick: on_click,
                    Icon { name: icon.to_string(), class: "music-icon".to_string() }
                }
            }
        }
        ControlHook::Skip => rsx! {
            button {
                class: "music-button music-skip",
                title: "Next track",
                onclick: on_click,
                Icon { name: "skip".to_string(), class: "music-icon".to_string() }
            }
        },
        ControlHook::SongSelector => rsx! {
            select {
                class: "music-song-selector",
                title: "Select song",
                onchange: move |evt: FormEvent| {
                    apply_control(&controller, effect, ControlInput::Choice(&evt.value()));
                },
                option { value: "", "Select Song" }
                for (index , name) in track_names.iter().enumerate() {
                    option {
                        key: "{index}",
                        value: "{index}",
                        "{name}"
                    }
                }
            }
        },
    }
}
