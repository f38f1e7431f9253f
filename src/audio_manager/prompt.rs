//! The transient "click to enable music" prompt.

use super::host::{Host, Registration};
use std::rc::Rc;
use tracing::debug;

/// Tracks whether the prompt is on screen and owns its auto-dismiss timer.
#[derive(Debug, Default)]
pub struct MusicPrompt {
    visible: bool,
    auto_dismiss: Option<Registration>,
}

impl MusicPrompt {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Shows the prompt unless it is already up. Returns whether it was shown.
    pub fn show(
        &mut self,
        host: &dyn Host,
        message: &str,
        duration_ms: u32,
        on_click: Rc<dyn Fn()>,
        on_expire: Box<dyn FnOnce()>,
    ) -> bool {
        if self.visible {
            return false;
        }
        if let Err(err) = host.show_prompt(message, on_click) {
            debug!("Music prompt not shown: {err}");
            return false;
        }
        self.visible = true;
        self.auto_dismiss = Some(host.set_timeout(duration_ms, on_expire));
        true
    }

    /// Hides the prompt and cancels its pending auto-dismiss timer.
    pub fn dismiss(&mut self, host: &dyn Host) -> bool {
        if let Some(timer) = self.auto_dismiss.take() {
            timer.cancel();
        }
        if !self.visible {
            return false;
        }
        host.hide_prompt();
        self.visible = false;
        true
    }
}
