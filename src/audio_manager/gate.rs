//! Interaction gate: turns the first qualifying user gesture into an
//! interaction grant.
//!
//! All gesture listeners share one registration table. Whichever fires first
//! tears the whole table down before running the grant, so a later gesture of
//! another kind can never trigger twice.

use super::host::{GestureKind, Host, Registration};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

type GrantCallback = Box<dyn FnOnce(GestureKind)>;

pub struct InteractionGate {
    listeners: Rc<RefCell<Vec<(GestureKind, Registration)>>>,
}

impl InteractionGate {
    /// Listens for `gestures`; `on_grant` runs once with the gesture that
    /// opened the gate.
    pub fn arm(
        host: &dyn Host,
        gestures: &[GestureKind],
        on_grant: impl FnOnce(GestureKind) + 'static,
    ) -> Self {
        let listeners: Rc<RefCell<Vec<(GestureKind, Registration)>>> = Rc::default();
        let pending: Rc<RefCell<Option<GrantCallback>>> =
            Rc::new(RefCell::new(Some(Box::new(on_grant))));

        for (i, &gesture) in gestures.iter().enumerate() {
            if gestures[..i].contains(&gesture) {
                continue;
            }
            let table = Rc::downgrade(&listeners);
            let pending = pending.clone();
            let handler: Rc<dyn Fn()> = Rc::new(move || {
                if let Some(table) = table.upgrade() {
                    let torn_down = std::mem::take(&mut *table.borrow_mut());
                    drop(torn_down);
                }
                let grant = pending.borrow_mut().take();
                if let Some(grant) = grant {
                    debug!("Interaction gate opened by {}", gesture.event_name());
                    grant(gesture);
                }
            });
            match host.listen(gesture, handler) {
                Ok(registration) => listeners.borrow_mut().push((gesture, registration)),
                Err(err) => warn!("Could not listen for {}: {err}", gesture.event_name()),
            }
        }

        debug!("Interaction gate armed for {} gesture kinds", listeners.borrow().len());
        Self { listeners }
    }

    pub fn is_armed(&self) -> bool {
        !self.listeners.borrow().is_empty()
    }

    pub fn armed_gestures(&self) -> Vec<GestureKind> {
        self.listeners.borrow().iter().map(|(g, _)| *g).collect()
    }

    /// Removes every listener in one step.
    pub fn disarm(&self) {
        let torn_down = std::mem::take(&mut *self.listeners.borrow_mut());
        drop(torn_down);
    }
}

impl Drop for InteractionGate {
    fn drop(&mut self) {
        self.disarm();
    }
}
