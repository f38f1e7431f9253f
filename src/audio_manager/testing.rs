//! Scripted stand-ins for the media element and the page event loop.

use super::engine::{MediaBackend, PlayFuture};
use super::host::{GestureKind, Host, LocalTask, Registration};
use crate::error::MusicError;
use futures_util::future::{self, FutureExt};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

struct BackendState {
    source: Option<String>,
    loads: Vec<String>,
    paused: bool,
    volume: f64,
    position: f64,
    looping: bool,
    play_calls: usize,
    pause_calls: usize,
    autoplay_blocked: bool,
    failures: VecDeque<MusicError>,
}

/// Behaves like an `<audio>` element under a browser autoplay policy.
#[derive(Clone)]
pub struct FakeBackend {
    state: Rc<RefCell<BackendState>>,
    ended: Rc<RefCell<Option<Rc<dyn Fn()>>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(BackendState {
                source: None,
                loads: Vec::new(),
                paused: true,
                volume: 1.0,
                position: 0.0,
                looping: false,
                play_calls: 0,
                pause_calls: 0,
                autoplay_blocked: false,
                failures: VecDeque::new(),
            })),
            ended: Rc::new(RefCell::new(None)),
        }
    }

    /// Every play is refused until [`FakeBackend::allow_playback`].
    pub fn block_autoplay(&self) {
        self.state.borrow_mut().autoplay_blocked = true;
    }

    pub fn allow_playback(&self) {
        self.state.borrow_mut().autoplay_blocked = false;
    }

    /// The next play call fails with `error`.
    pub fn fail_next_play(&self, error: MusicError) {
        self.state.borrow_mut().failures.push_back(error);
    }

    pub fn source(&self) -> Option<String> {
        self.state.borrow().source.clone()
    }

    pub fn loads(&self) -> Vec<String> {
        self.state.borrow().loads.clone()
    }

    pub fn play_calls(&self) -> usize {
        self.state.borrow().play_calls
    }

    pub fn pause_calls(&self) -> usize {
        self.state.borrow().pause_calls
    }

    pub fn position(&self) -> f64 {
        self.state.borrow().position
    }

    pub fn set_position(&self, seconds: f64) {
        self.state.borrow_mut().position = seconds;
    }

    pub fn looping(&self) -> bool {
        self.state.borrow().looping
    }

    /// Natural end of the current track. A looping element restarts the
    /// track instead of reporting the end.
    pub fn finish_track(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.position = 0.0;
            if state.looping {
                return;
            }
            state.paused = true;
        }
        let handler = self.ended.borrow().clone();
        if let Some(handler) = handler {
            handler();
        }
    }
}

impl MediaBackend for FakeBackend {
    fn set_source(&self, locator: &str) {
        let mut state = self.state.borrow_mut();
        state.source = Some(locator.to_string());
        state.loads.push(locator.to_string());
        state.paused = true;
        state.position = 0.0;
    }

    fn play(&self) -> PlayFuture {
        let mut state = self.state.borrow_mut();
        state.play_calls += 1;
        let outcome = if let Some(error) = state.failures.pop_front() {
            Err(error)
        } else if state.autoplay_blocked {
            Err(MusicError::PlaybackBlocked)
        } else {
            Ok(())
        };
        state.paused = outcome.is_err();
        future::ready(outcome).boxed_local()
    }

    fn pause(&self) {
        let mut state = self.state.borrow_mut();
        state.pause_calls += 1;
        state.paused = true;
    }

    fn set_current_time(&self, seconds: f64) {
        self.state.borrow_mut().position = seconds;
    }

    fn volume(&self) -> f64 {
        self.state.borrow().volume
    }

    fn set_volume(&self, volume: f64) {
        self.state.borrow_mut().volume = volume;
    }

    fn paused(&self) -> bool {
        self.state.borrow().paused
    }

    fn set_loop(&self, looping: bool) {
        self.state.borrow_mut().looping = looping;
    }

    fn on_ended(&self, handler: Rc<dyn Fn()>) {
        *self.ended.borrow_mut() = Some(handler);
    }
}

struct FakeTimer {
    id: u64,
    due_ms: u64,
    callback: Box<dyn FnOnce()>,
}

struct ShownPrompt {
    message: String,
    on_click: Rc<dyn Fn()>,
}

#[derive(Default)]
struct HostState {
    tasks: RefCell<VecDeque<LocalTask>>,
    timers: RefCell<Vec<FakeTimer>>,
    listeners: RefCell<Vec<(u64, GestureKind, Rc<dyn Fn()>)>>,
    prompt: RefCell<Option<ShownPrompt>>,
    prompt_shows: Cell<usize>,
    now_ms: Cell<u64>,
    next_id: Cell<u64>,
}

impl HostState {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

/// Manual event loop: tasks run on [`FakeHost::run_until_stalled`], timers on
/// [`FakeHost::advance`], gestures on [`FakeHost::dispatch`].
#[derive(Clone, Default)]
pub struct FakeHost {
    state: Rc<HostState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_until_stalled(&self) {
        loop {
            let next = self.state.tasks.borrow_mut().pop_front();
            let Some(task) = next else {
                break;
            };
            assert!(
                task.now_or_never().is_some(),
                "fake host tasks must complete without waiting"
            );
        }
    }

    pub fn advance(&self, ms: u64) {
        let target = self.state.now_ms.get() + ms;
        loop {
            let due = {
                let mut timers = self.state.timers.borrow_mut();
                let next = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due_ms <= target)
                    .min_by_key(|(_, t)| (t.due_ms, t.id))
                    .map(|(i, _)| i);
                next.map(|i| timers.remove(i))
            };
            let Some(timer) = due else {
                break;
            };
            self.state.now_ms.set(timer.due_ms);
            (timer.callback)();
            self.run_until_stalled();
        }
        self.state.now_ms.set(target);
    }

    pub fn pending_timers(&self) -> usize {
        self.state.timers.borrow().len()
    }

    pub fn dispatch(&self, gesture: GestureKind) {
        let handlers: Vec<Rc<dyn Fn()>> = self
            .state
            .listeners
            .borrow()
            .iter()
            .filter(|(_, kind, _)| *kind == gesture)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler();
        }
        self.run_until_stalled();
    }

    pub fn listener_count(&self) -> usize {
        self.state.listeners.borrow().len()
    }

    pub fn prompt_visible(&self) -> bool {
        self.state.prompt.borrow().is_some()
    }

    pub fn prompt_message(&self) -> Option<String> {
        self.state.prompt.borrow().as_ref().map(|p| p.message.clone())
    }

    pub fn prompt_shows(&self) -> usize {
        self.state.prompt_shows.get()
    }

    pub fn click_prompt(&self) {
        let on_click = self.state.prompt.borrow().as_ref().map(|p| p.on_click.clone());
        if let Some(on_click) = on_click {
            on_click();
        }
        self.run_until_stalled();
    }
}

impl Host for FakeHost {
    fn spawn(&self, task: LocalTask) {
        self.state.tasks.borrow_mut().push_back(task);
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Registration {
        let id = self.state.next_id();
        self.state.timers.borrow_mut().push(FakeTimer {
            id,
            due_ms: self.state.now_ms.get() + u64::from(delay_ms),
            callback,
        });
        let state = Rc::downgrade(&self.state);
        Registration::new(move || {
            if let Some(state) = state.upgrade() {
                state.timers.borrow_mut().retain(|t| t.id != id);
            }
        })
    }

    fn listen(
        &self,
        gesture: GestureKind,
        handler: Rc<dyn Fn()>,
    ) -> Result<Registration, MusicError> {
        let id = self.state.next_id();
        self.state.listeners.borrow_mut().push((id, gesture, handler));
        let state = Rc::downgrade(&self.state);
        Ok(Registration::new(move || {
            if let Some(state) = state.upgrade() {
                state.listeners.borrow_mut().retain(|(lid, _, _)| *lid != id);
            }
        }))
    }

    fn show_prompt(&self, message: &str, on_click: Rc<dyn Fn()>) -> Result<(), MusicError> {
        self.state.prompt_shows.set(self.state.prompt_shows.get() + 1);
        *self.state.prompt.borrow_mut() = Some(ShownPrompt {
            message: message.to_string(),
            on_click,
        });
        Ok(())
    }

    fn hide_prompt(&self) {
        self.state.prompt.borrow_mut().take();
    }
}
