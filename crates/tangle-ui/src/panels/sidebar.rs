//! Sidebar — session list with new/select/rename/delete.

use egui::{self, RichText, ScrollArea};

use tangle_core::store::ChatStore;

use crate::state::{RenameDraft, UiState};
use crate::theme::*;

/// What the caller should do after rendering the sidebar.
pub enum SidebarAction {
    NewChat,
    Select(String),
    Delete(String),
    Rename { session_id: String, title: String },
}

pub fn sidebar_panel(
    ui: &mut egui::Ui,
    state: &mut UiState,
    store: &ChatStore,
) -> Option<SidebarAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                let new_chat = ui.add_sized(
                    [ui.available_width(), 28.0],
                    egui::Button::new(RichText::new("+ New Chat").color(TEXT_PRIMARY))
                        .fill(ACCENT)
                        .corner_radius(PANEL_ROUNDING),
                );
                if new_chat.clicked() {
                    action = Some(SidebarAction::NewChat);
                }

                ui.add_space(8.0);
                ui.separator();

                ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        for summary in store.summaries() {
                            let selected =
                                store.current_session_id() == Some(summary.id.as_str());

                            // Rename in place when this session holds the draft
                            let renaming = state
                                .rename_draft
                                .as_ref()
                                .is_some_and(|d| d.session_id == summary.id);
                            if renaming {
                                let mut commit = false;
                                let mut abandon = false;
                                if let Some(draft) = &mut state.rename_draft {
                                    let response = ui.text_edit_singleline(&mut draft.title);
                                    if response.lost_focus() {
                                        commit =
                                            ui.input(|i| i.key_pressed(egui::Key::Enter));
                                        abandon = !commit;
                                    }
                                }
                                if commit {
                                    if let Some(draft) = state.rename_draft.take() {
                                        if !draft.title.trim().is_empty() {
                                            action = Some(SidebarAction::Rename {
                                                session_id: draft.session_id,
                                                title: draft.title.trim().to_string(),
                                            });
                                        }
                                    }
                                } else if abandon {
                                    state.rename_draft = None;
                                }
                                continue;
                            }

                            ui.horizontal(|ui| {
                                let label = ui.selectable_label(
                                    selected,
                                    RichText::new(&summary.title).color(if selected {
                                        TEXT_PRIMARY
                                    } else {
                                        TEXT_SECONDARY
                                    }),
                                );
                                if label.clicked() && !selected {
                                    action = Some(SidebarAction::Select(summary.id.clone()));
                                }

                                if selected {
                                    if ui
                                        .small_button("✏")
                                        .on_hover_text("Rename chat")
                                        .clicked()
                                    {
                                        state.rename_draft = Some(RenameDraft {
                                            session_id: summary.id.clone(),
                                            title: summary.title.clone(),
                                        });
                                    }
                                    if ui
                                        .small_button(RichText::new("🗑").color(ERROR))
                                        .on_hover_text("Delete chat")
                                        .clicked()
                                    {
                                        action = Some(SidebarAction::Delete(summary.id.clone()));
                                    }
                                }
                            });
                        }
                    });
            });
        });

    action
}
