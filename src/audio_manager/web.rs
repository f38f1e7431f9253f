//! Browser implementations of the media backend and the host loop.

use super::controller::PlaybackController;
use super::engine::{MediaBackend, PlayFuture};
use super::host::{GestureKind, Host, LocalTask, Registration};
use super::system::MusicSystem;
use crate::config::{MusicConfig, PAGE_CONFIG_ELEMENT_ID};
use crate::error::MusicError;
use futures_util::future::{self, FutureExt};
use gloo_timers::callback::Timeout;
use js_sys::Reflect;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{window, AddEventListenerOptions, Document, HtmlAudioElement, HtmlElement};

const AUDIO_ELEMENT_ID: &str = "shared-music-audio";
const PROMPT_ELEMENT_ID: &str = "music-prompt";
const GLOBAL_NAMESPACE: &str = "sharedMusic";

/// Initialize the global audio element once.
pub fn get_or_create_audio_element() -> Option<HtmlAudioElement> {
    let document = window()?.document()?;

    if let Some(existing) = document.get_element_by_id(AUDIO_ELEMENT_ID) {
        return existing.dyn_into::<HtmlAudioElement>().ok();
    }

    let audio: HtmlAudioElement = document.create_element("audio").ok()?.dyn_into().ok()?;
    audio.set_id(AUDIO_ELEMENT_ID);
    audio.set_attribute("preload", "auto").ok()?;
    document.body()?.append_child(&audio).ok()?;

    Some(audio)
}

fn js_error(err: JsValue) -> MusicError {
    MusicError::Host(format!("{err:?}"))
}

/// Closures can't be freed while the browser is still inside them, so
/// release them on the next turn of the event loop.
fn defer_drop<T: 'static>(value: T) {
    wasm_bindgen_futures::spawn_local(async move {
        gloo_timers::future::TimeoutFuture::new(0).await;
        drop(value);
    });
}

fn classify_play_error(err: &JsValue) -> MusicError {
    let field = |key: &str| {
        Reflect::get(err, &key.into())
            .ok()
            .and_then(|value| value.as_string())
            .unwrap_or_default()
    };
    let name = field("name");
    let message = field("message");
    match name.as_str() {
        "NotAllowedError" => MusicError::PlaybackBlocked,
        "AbortError" => MusicError::PlaybackInterrupted,
        "NotSupportedError" => MusicError::ResourceLoad(message),
        _ => MusicError::Host(format!("{name}: {message}")),
    }
}

fn media_error_message(audio: &HtmlAudioElement) -> Option<String> {
    let audio_js = JsValue::from(audio.clone());
    let error_js = Reflect::get(&audio_js, &"error".into()).ok()?;
    if error_js.is_null() || error_js.is_undefined() {
        return None;
    }
    let code = Reflect::get(&error_js, &"code".into())
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0) as u16;
    Some(
        match code {
            1 => "playback was aborted before the audio loaded",
            2 => "network error while loading the track",
            3 => "the track could not be decoded",
            4 => "no supported source was found",
            _ => "unable to load this audio source",
        }
        .to_string(),
    )
}

/// The page's single `<audio>` element.
pub struct HtmlAudioBackend {
    audio: HtmlAudioElement,
    ended: RefCell<Option<Closure<dyn FnMut()>>>,
    _load_error: Closure<dyn FnMut()>,
}

impl HtmlAudioBackend {
    /// Wraps the existing audio element, creating it only if the page has none.
    pub fn attach() -> Result<Self, MusicError> {
        let audio = get_or_create_audio_element()
            .ok_or_else(|| MusicError::MissingUiElement(AUDIO_ELEMENT_ID.to_string()))?;

        let audio_for_error = audio.clone();
        let load_error = Closure::<dyn FnMut()>::new(move || {
            let message = media_error_message(&audio_for_error)
                .unwrap_or_else(|| "unknown media error".to_string());
            let err = MusicError::ResourceLoad(format!("{} ({message})", audio_for_error.src()));
            warn!("{err}");
        });
        audio.set_onerror(Some(load_error.as_ref().unchecked_ref()));

        Ok(Self {
            audio,
            ended: RefCell::new(None),
            _load_error: load_error,
        })
    }
}

impl MediaBackend for HtmlAudioBackend {
    fn set_source(&self, locator: &str) {
        self.audio.set_src(locator);
    }

    fn play(&self) -> PlayFuture {
        match self.audio.play() {
            Ok(promise) => async move {
                wasm_bindgen_futures::JsFuture::from(promise)
                    .await
                    .map(|_| ())
                    .map_err(|err| classify_play_error(&err))
            }
            .boxed_local(),
            Err(err) => future::ready(Err(classify_play_error(&err))).boxed_local(),
        }
    }

    fn pause(&self) {
        if let Err(err) = self.audio.pause() {
            debug!("Pause failed: {err:?}");
        }
    }

    fn set_current_time(&self, seconds: f64) {
        self.audio.set_current_time(seconds);
    }

    fn volume(&self) -> f64 {
        self.audio.volume()
    }

    fn set_volume(&self, volume: f64) {
        self.audio.set_volume(volume);
    }

    fn paused(&self) -> bool {
        self.audio.paused()
    }

    fn set_loop(&self, looping: bool) {
        self.audio.set_loop(looping);
    }

    fn on_ended(&self, handler: Rc<dyn Fn()>) {
        let closure = Closure::<dyn FnMut()>::new(move || handler());
        self.audio.set_onended(Some(closure.as_ref().unchecked_ref()));
        if let Some(previous) = self.ended.replace(Some(closure)) {
            defer_drop(previous);
        }
    }
}

struct PromptElement {
    element: HtmlElement,
    on_click: Closure<dyn FnMut()>,
}

/// Event loop, timers and DOM surfaces of the current document.
pub struct WebHost {
    document: Document,
    prompt: RefCell<Option<PromptElement>>,
}

impl WebHost {
    pub fn new() -> Result<Self, MusicError> {
        let document = window()
            .and_then(|w| w.document())
            .ok_or_else(|| MusicError::MissingUiElement("document".to_string()))?;
        Ok(Self {
            document,
            prompt: RefCell::new(None),
        })
    }
}

impl Host for WebHost {
    fn spawn(&self, task: LocalTask) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Registration {
        let timeout = Timeout::new(delay_ms, callback);
        Registration::new(move || defer_drop(timeout.cancel()))
    }

    fn listen(
        &self,
        gesture: GestureKind,
        handler: Rc<dyn Fn()>,
    ) -> Result<Registration, MusicError> {
        let event = gesture.event_name();
        let callback = Closure::<dyn FnMut()>::new(move || handler());
        let options = AddEventListenerOptions::new();
        options.set_once(true);
        options.set_passive(true);
        self.document
            .add_event_listener_with_callback_and_add_event_listener_options(
                event,
                callback.as_ref().unchecked_ref(),
                &options,
            )
            .map_err(js_error)?;

        let document = self.document.clone();
        Ok(Registration::new(move || {
            let _ = document
                .remove_event_listener_with_callback(event, callback.as_ref().unchecked_ref());
            defer_drop(callback);
        }))
    }

    fn show_prompt(&self, message: &str, on_click: Rc<dyn Fn()>) -> Result<(), MusicError> {
        self.hide_prompt();
        let body = self
            .document
            .body()
            .ok_or_else(|| MusicError::MissingUiElement("body".to_string()))?;
        let element: HtmlElement = self
            .document
            .create_element("div")
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| MusicError::Host("prompt element is not an HtmlElement".to_string()))?;
        element.set_id(PROMPT_ELEMENT_ID);
        element.set_class_name("music-prompt");
        element.set_text_content(Some(message));

        let click = Closure::<dyn FnMut()>::new(move || on_click());
        element.set_onclick(Some(click.as_ref().unchecked_ref()));
        body.append_child(&element).map_err(js_error)?;

        *self.prompt.borrow_mut() = Some(PromptElement {
            element,
            on_click: click,
        });
        Ok(())
    }

    fn hide_prompt(&self) {
        let prompt = self.prompt.borrow_mut().take();
        if let Some(prompt) = prompt {
            prompt.element.set_onclick(None);
            prompt.element.remove();
            defer_drop(prompt.on_click);
        }
    }
}

/// Reads the optional JSON config embedded in the page, falling back to the
/// defaults when it is absent or malformed.
pub fn load_page_config() -> MusicConfig {
    let raw = window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(PAGE_CONFIG_ELEMENT_ID))
        .and_then(|e| e.text_content());
    let Some(raw) = raw else {
        debug!("No page music config, using defaults");
        return MusicConfig::default();
    };
    match MusicConfig::from_json(&raw) {
        Ok(config) => config,
        Err(err) => {
            warn!("Ignoring page music config: {err}");
            MusicConfig::default()
        }
    }
}

/// Exposes `window.sharedMusic.{playNext, rewind, togglePlayPause}`.
fn publish_global_handles(system: &Rc<MusicSystem>) -> Result<(), MusicError> {
    let window = window().ok_or_else(|| MusicError::MissingUiElement("window".to_string()))?;
    if Reflect::has(&window, &GLOBAL_NAMESPACE.into()).unwrap_or(false) {
        return Ok(());
    }

    let handles: [(&str, fn(&PlaybackController)); 3] = [
        ("playNext", PlaybackController::advance),
        ("rewind", PlaybackController::restart),
        ("togglePlayPause", PlaybackController::toggle_play_pause),
    ];
    let namespace = js_sys::Object::new();
    for (name, action) in handles {
        let system = Rc::downgrade(system);
        let callback = Closure::<dyn Fn()>::new(move || {
            if let Some(system) = system.upgrade() {
                action(&PlaybackController::view(system));
            }
        });
        Reflect::set(&namespace, &name.into(), &callback.into_js_value()).map_err(js_error)?;
    }
    Reflect::set(&window, &GLOBAL_NAMESPACE.into(), &namespace).map_err(js_error)?;
    info!("Published window.{GLOBAL_NAMESPACE} handles");
    Ok(())
}

/// Builds the process-wide system for the current page.
pub(super) fn build_page_system() -> Result<Rc<MusicSystem>, MusicError> {
    let config = load_page_config();
    let publish = config.publish_globals;
    let backend = HtmlAudioBackend::attach()?;
    let host = WebHost::new()?;
    let system = MusicSystem::new(config, Box::new(backend), Rc::new(host))?;
    if publish {
        if let Err(err) = publish_global_handles(&system) {
            warn!("Could not publish music handles: {err}");
        }
    }
    Ok(system)
}
