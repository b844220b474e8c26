//! Event bus between the streaming controller and the UI.
//!
//! Single-threaded (WASM constraint), interior mutability via RefCell.
//! The controller pushes events as it mutates the tree; the UI drains
//! them once per frame and re-projects the thread from the store.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tangle_types::event::ChatEvent;

/// Shared event bus — clone-cheap via Rc.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<RefCell<VecDeque<ChatEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Publish an event. Called by the streaming controller.
    pub fn emit(&self, event: ChatEvent) {
        self.inner.borrow_mut().push_back(event);
    }

    /// Drain all pending events. Called by the UI layer each frame.
    pub fn drain(&self) -> Vec<ChatEvent> {
        self.inner.borrow_mut().drain(..).collect()
    }

    /// Whether anything is queued (drives egui repaint requests).
    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
