//! Streaming response controller.
//!
//! Drives one model invocation: reserves a placeholder node, commits the
//! accumulated text into the tree as increments arrive, and finalizes,
//! cancels, or error-marks the target when the stream ends. Model
//! failures never escape this module; they are converted into node
//! content and events.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::StreamExt;

use tangle_types::event::ChatEvent;
use tangle_types::message::{Role, ERROR_PREFIX, PLACEHOLDER};
use tangle_types::ChatError;

use crate::event_bus::EventBus;
use crate::ports::{GenerateRequest, ModelPort, ModelStreamEvent, PacerPort};
use crate::splitter::{find_split_point, finalize_remainder, split_bubble, BUBBLE_DELAY_MS};
use crate::store::ChatStore;

/// Written into the thread for the credential failure class instead of
/// the raw provider message.
const AUTH_GUIDANCE: &str = "No valid API key is configured, or the key was rejected. \
    Open Settings and paste a Gemini API key (create one at \
    https://aistudio.google.com/apikey), then resend your message.";

/// Lifecycle of one in-flight generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    PlaceholderCreated,
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Cancelled,
    Failed,
}

/// How model output lands in the tree: one accumulating node, or a
/// sequence of sentence bubbles (chat mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Single,
    Bubbles,
}

/// Cooperative cancellation flag, checked before each increment is
/// processed. Does not abort transport I/O; it stops tree mutation.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.get()
    }
}

pub struct ResponseController {
    store: Rc<RefCell<ChatStore>>,
    event_bus: EventBus,
    phase: StreamPhase,
}

impl ResponseController {
    pub fn new(store: Rc<RefCell<ChatStore>>, event_bus: EventBus) -> Self {
        Self {
            store,
            event_bus,
            phase: StreamPhase::Idle,
        }
    }

    pub fn phase(&self) -> &StreamPhase {
        &self.phase
    }

    /// Run one generation to completion.
    ///
    /// Only one stream per session may be in flight; callers gate this by
    /// disabling the triggering action while busy, the store itself does
    /// not enforce it.
    pub async fn run(
        &mut self,
        session_id: &str,
        model: &dyn ModelPort,
        req: GenerateRequest,
        mode: DeliveryMode,
        pacer: &dyn PacerPort,
        cancel: &CancelToken,
    ) -> StreamOutcome {
        let model_name = req.model.clone();

        // Reserve the write target for the rest of the run.
        let reserved = self.store.borrow_mut().append_message(
            session_id,
            Role::Model,
            PLACEHOLDER,
            Vec::new(),
        );
        let Some(mut target) = reserved else {
            log::warn!("generation requested for missing session {}", session_id);
            self.phase = StreamPhase::Failed;
            return StreamOutcome::Failed;
        };
        self.phase = StreamPhase::PlaceholderCreated;
        self.event_bus.emit(ChatEvent::GenerationStarted {
            session_id: session_id.to_string(),
            node_id: target.clone(),
        });

        let mut stream = model.stream_generate(req);
        // Single mode: the cumulative text so far. Bubble mode: the
        // unsplit remainder belonging to the current bubble.
        let mut buffer = String::new();

        while let Some(event) = stream.next().await {
            if cancel.is_cancelled() {
                return self.finish_cancelled(session_id);
            }
            match event {
                ModelStreamEvent::Delta(chunk) => {
                    self.phase = StreamPhase::Streaming;
                    buffer.push_str(&chunk);
                    match mode {
                        DeliveryMode::Single => {
                            // Full replacement with the cumulative text:
                            // idempotent, tolerant of redelivery.
                            self.store.borrow_mut().update_content(
                                session_id,
                                &target,
                                buffer.clone(),
                            );
                            self.event_bus.emit(ChatEvent::Delta {
                                session_id: session_id.to_string(),
                                node_id: target.clone(),
                            });
                        }
                        DeliveryMode::Bubbles => {
                            if !self
                                .drain_bubbles(session_id, &mut target, &mut buffer, pacer, cancel)
                                .await
                            {
                                return self.finish_cancelled(session_id);
                            }
                        }
                    }
                }
                ModelStreamEvent::Usage {
                    input_tokens,
                    output_tokens,
                } => {
                    self.event_bus.emit(ChatEvent::UsageReported {
                        model: model_name.clone(),
                        input_tokens,
                        output_tokens,
                    });
                }
                ModelStreamEvent::Done => break,
                ModelStreamEvent::Error(err) => {
                    return self.finish_failed(session_id, &target, err);
                }
            }
        }

        if mode == DeliveryMode::Bubbles {
            // The remainder becomes the last bubble; a bubble that never
            // received text is blanked and left in the tree (there is no
            // node deletion), renderers filter it out.
            let finalized = finalize_remainder(&buffer);
            self.store
                .borrow_mut()
                .update_content(session_id, &target, finalized);
        }

        self.phase = StreamPhase::Completed;
        self.event_bus.emit(ChatEvent::GenerationCompleted {
            session_id: session_id.to_string(),
        });
        StreamOutcome::Completed
    }

    /// Commit every complete sentence in `buffer` as its own bubble,
    /// opening a fresh target node after each, then show the unsplit
    /// remainder live in the current bubble. Returns `false` when the run
    /// must stop (cancelled mid-scan, or the session disappeared).
    async fn drain_bubbles(
        &mut self,
        session_id: &str,
        target: &mut String,
        buffer: &mut String,
        pacer: &dyn PacerPort,
        cancel: &CancelToken,
    ) -> bool {
        while let Some(split_at) = find_split_point(buffer) {
            if cancel.is_cancelled() {
                return false;
            }
            let (sentence, remainder) = split_bubble(buffer, split_at);
            self.store
                .borrow_mut()
                .update_content(session_id, target, sentence);

            pacer.pause(BUBBLE_DELAY_MS).await;
            if cancel.is_cancelled() {
                return false;
            }

            let next =
                self.store
                    .borrow_mut()
                    .append_message(session_id, Role::Model, "", Vec::new());
            let Some(next) = next else {
                return false;
            };
            self.event_bus.emit(ChatEvent::BubbleOpened {
                session_id: session_id.to_string(),
                node_id: next.clone(),
            });
            *target = next;
            *buffer = remainder;
        }

        if !buffer.is_empty() {
            self.store
                .borrow_mut()
                .update_content(session_id, target, buffer.clone());
            self.event_bus.emit(ChatEvent::Delta {
                session_id: session_id.to_string(),
                node_id: target.clone(),
            });
        }
        true
    }

    /// Cancellation keeps whatever was last committed; no revert, no
    /// error marker.
    fn finish_cancelled(&mut self, session_id: &str) -> StreamOutcome {
        self.phase = StreamPhase::Cancelled;
        self.event_bus.emit(ChatEvent::GenerationCancelled {
            session_id: session_id.to_string(),
        });
        StreamOutcome::Cancelled
    }

    fn finish_failed(&mut self, session_id: &str, target: &str, err: ChatError) -> StreamOutcome {
        self.store
            .borrow_mut()
            .update_content(session_id, target, error_marker(&err));
        self.phase = StreamPhase::Failed;
        self.event_bus.emit(ChatEvent::GenerationFailed {
            session_id: session_id.to_string(),
            message: err.to_string(),
        });
        StreamOutcome::Failed
    }
}

/// Render an error as node content. The credential class gets actionable
/// guidance; everything else carries the raw message.
fn error_marker(err: &ChatError) -> String {
    if err.is_auth() {
        format!("{}{}", ERROR_PREFIX, AUTH_GUIDANCE)
    } else {
        format!("{}{}", ERROR_PREFIX, err)
    }
}
