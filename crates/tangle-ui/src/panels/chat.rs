//! Chat panel — the projected thread, branch navigation, message
//! editing, and the composer.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};

use tangle_core::store::{ChatStore, SiblingDirection};
use tangle_core::thread::project_thread;
use tangle_types::message::{MessageNode, Role};
use tangle_types::session::ChatSession;

use crate::state::{EditDraft, UiState};
use crate::theme::*;

/// What the caller should do after rendering the chat panel.
pub enum ChatAction {
    /// Send the composer text as a new user message
    Send(String),
    /// Commit an edit: branch off a new sibling and regenerate
    SubmitEdit { node_id: String, text: String },
    /// Move to a sibling branch of the given node
    Navigate {
        node_id: String,
        direction: SiblingDirection,
    },
    /// Stop the in-flight generation
    Stop,
}

pub fn chat_panel(
    ui: &mut egui::Ui,
    state: &mut UiState,
    store: &ChatStore,
) -> Option<ChatAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                let Some(session) = store.current_session() else {
                    ui.centered_and_justified(|ui| {
                        ui.label(
                            RichText::new("Select or start a new chat").color(TEXT_SECONDARY),
                        );
                    });
                    return;
                };

                let composer_height = 56.0;
                let available_height = ui.available_height() - composer_height;

                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        let thread = project_thread(session);
                        let visible: Vec<&&MessageNode> =
                            thread.iter().filter(|n| !n.is_placeholder()).collect();

                        if visible.is_empty() {
                            ui.add_space(24.0);
                            ui.vertical_centered(|ui| {
                                ui.label(
                                    RichText::new("Start a conversation...")
                                        .color(TEXT_SECONDARY),
                                );
                            });
                        }

                        for node in visible {
                            if let Some(a) = render_message(ui, state, store, session, node) {
                                action = Some(a);
                            }
                            ui.add_space(6.0);
                        }
                    });

                ui.add_space(6.0);
                if let Some(a) = composer(ui, state) {
                    action = Some(a);
                }
            });
        });

    action
}

fn render_message(
    ui: &mut egui::Ui,
    state: &mut UiState,
    store: &ChatStore,
    session: &ChatSession,
    node: &MessageNode,
) -> Option<ChatAction> {
    let mut action = None;

    // An open edit draft replaces the bubble with an editor.
    let editing_this = state
        .editing
        .as_ref()
        .is_some_and(|draft| draft.node_id == node.id);
    if editing_this {
        if let Some(a) = render_editor(ui, state) {
            action = Some(a);
        }
        return action;
    }

    let (bubble, align) = match node.role {
        Role::User => (USER_BUBBLE, Layout::right_to_left(Align::TOP)),
        Role::Model if node.is_error() => (ERROR_BUBBLE, Layout::left_to_right(Align::TOP)),
        Role::Model => (MODEL_BUBBLE, Layout::left_to_right(Align::TOP)),
    };

    ui.with_layout(align, |ui| {
        ui.set_max_width(ui.available_width() * 0.85);
        ui.vertical(|ui| {
            egui::Frame::default()
                .fill(bubble)
                .corner_radius(PANEL_ROUNDING)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    if node.is_error() {
                        ui.label(RichText::new("⚠ Error").color(ERROR).strong().small());
                    }
                    ui.label(RichText::new(&node.content).color(TEXT_PRIMARY));
                });

            ui.horizontal(|ui| {
                if let Some(a) = branch_nav(ui, store, session, node) {
                    action = Some(a);
                }

                if node.role == Role::User && !state.is_busy() {
                    if ui
                        .small_button("✏")
                        .on_hover_text("Edit message (creates a new branch)")
                        .clicked()
                    {
                        state.editing = Some(EditDraft {
                            node_id: node.id.clone(),
                            text: node.content.clone(),
                        });
                    }
                }
            });
        });
    });

    action
}

/// The `‹ i/n ›` sibling switcher, shown when the node has siblings.
fn branch_nav(
    ui: &mut egui::Ui,
    store: &ChatStore,
    session: &ChatSession,
    node: &MessageNode,
) -> Option<ChatAction> {
    let (index, total) = store.sibling_position(&session.id, &node.id)?;
    if total <= 1 {
        return None;
    }

    let mut action = None;
    ui.horizontal(|ui| {
        if ui.add_enabled(index > 0, egui::Button::new("‹").small()).clicked() {
            action = Some(ChatAction::Navigate {
                node_id: node.id.clone(),
                direction: SiblingDirection::Prev,
            });
        }
        ui.label(
            RichText::new(format!("{} / {}", index + 1, total))
                .color(TEXT_SECONDARY)
                .monospace()
                .small(),
        );
        if ui
            .add_enabled(index + 1 < total, egui::Button::new("›").small())
            .clicked()
        {
            action = Some(ChatAction::Navigate {
                node_id: node.id.clone(),
                direction: SiblingDirection::Next,
            });
        }
    });
    action
}

fn render_editor(ui: &mut egui::Ui, state: &mut UiState) -> Option<ChatAction> {
    let mut action = None;
    let mut close = false;

    if let Some(draft) = &mut state.editing {
        egui::Frame::default()
            .fill(BG_SECONDARY)
            .corner_radius(PANEL_ROUNDING)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut draft.text)
                        .desired_width(ui.available_width())
                        .desired_rows(3),
                );
                ui.horizontal(|ui| {
                    if ui.small_button("Cancel").clicked() {
                        close = true;
                    }
                    let can_submit = !draft.text.trim().is_empty();
                    if ui
                        .add_enabled(can_submit, egui::Button::new("Save & Submit").small())
                        .clicked()
                    {
                        action = Some(ChatAction::SubmitEdit {
                            node_id: draft.node_id.clone(),
                            text: draft.text.trim().to_string(),
                        });
                        close = true;
                    }
                });
            });
    }

    if close {
        state.editing = None;
    }
    action
}

fn composer(ui: &mut egui::Ui, state: &mut UiState) -> Option<ChatAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        let is_busy = state.is_busy();
        let input = egui::TextEdit::singleline(&mut state.input_text)
            .hint_text("Type a message...")
            .desired_width(ui.available_width() - 70.0)
            .font(egui::FontId::proportional(14.0));
        let response = ui.add_enabled(!is_busy, input);

        if state.is_busy() {
            let stop = ui.add(
                egui::Button::new(RichText::new("Stop").color(TEXT_PRIMARY))
                    .fill(ERROR)
                    .corner_radius(PANEL_ROUNDING)
                    .min_size(Vec2::new(60.0, 0.0)),
            );
            if stop.clicked() {
                action = Some(ChatAction::Stop);
            }
        } else {
            let send_enabled = !state.input_text.trim().is_empty();
            let send = ui.add_enabled(
                send_enabled,
                egui::Button::new(RichText::new("Send").color(TEXT_PRIMARY))
                    .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                    .corner_radius(PANEL_ROUNDING)
                    .min_size(Vec2::new(60.0, 0.0)),
            );

            let submitted = response.lost_focus()
                && ui.input(|i| i.key_pressed(egui::Key::Enter))
                && send_enabled;
            if submitted || send.clicked() {
                let text = state.input_text.trim().to_string();
                state.input_text.clear();
                action = Some(ChatAction::Send(text));
                response.request_focus();
            }
        }
    });

    action
}
