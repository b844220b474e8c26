//! Settings panel — API key, storage backend, persona management, and
//! usage totals.

use egui::{self, RichText};

use tangle_core::personas::{MoveDirection, PersonaRoster};
use tangle_types::config::{AppSettings, StorageBackendType, PLAYGROUND_MODELS};
use tangle_types::persona::Persona;
use tangle_types::usage::UsageTracker;

use crate::state::UiState;
use crate::theme::*;

/// What the caller should do after rendering the settings panel.
pub enum SettingsAction {
    /// API key or storage backend edited (auto-saved)
    SettingsChanged,
    SelectPersona(String),
    AddPersona,
    DeletePersona(String),
    MovePersona(String, MoveDirection),
    /// Apply the edited persona draft
    SavePersona(Persona),
}

pub fn settings_panel(
    ui: &mut egui::Ui,
    state: &mut UiState,
    settings: &mut AppSettings,
    roster: &PersonaRoster,
    usage: &UsageTracker,
) -> Vec<SettingsAction> {
    let mut actions = Vec::new();

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .corner_radius(PANEL_ROUNDING)
        .show(ui, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.heading(RichText::new("Settings").color(TEXT_PRIMARY));
                    ui.separator();

                    // ── API Section ──────────────────────────────────
                    ui.label(RichText::new("Gemini API").color(ACCENT).strong());
                    ui.add_space(2.0);

                    ui.label(RichText::new("API Key").color(TEXT_SECONDARY).small());
                    let key_edit = egui::TextEdit::singleline(&mut settings.api_key)
                        .password(true)
                        .hint_text("AIza...");
                    if ui.add(key_edit).changed() {
                        actions.push(SettingsAction::SettingsChanged);
                    }

                    ui.add_space(4.0);
                    ui.label(RichText::new("Storage").color(TEXT_SECONDARY).small());
                    egui::ComboBox::from_id_salt("storage_backend")
                        .selected_text(storage_label(&settings.storage))
                        .show_ui(ui, |ui| {
                            for backend in [
                                StorageBackendType::Auto,
                                StorageBackendType::IndexedDb,
                                StorageBackendType::Memory,
                            ] {
                                if ui
                                    .selectable_value(
                                        &mut settings.storage,
                                        backend,
                                        storage_label(&backend),
                                    )
                                    .changed()
                                {
                                    actions.push(SettingsAction::SettingsChanged);
                                }
                            }
                        });
                    ui.label(
                        RichText::new("Takes effect on next reload")
                            .color(TEXT_SECONDARY)
                            .small()
                            .italics(),
                    );

                    ui.add_space(12.0);
                    ui.separator();

                    // ── Personas Section ─────────────────────────────
                    ui.label(RichText::new("Personas").color(ACCENT).strong());
                    ui.add_space(2.0);

                    for persona in roster.personas() {
                        let active = roster.active_id() == Some(persona.id.as_str());
                        ui.horizontal(|ui| {
                            let label = format!(
                                "{} {}",
                                persona.avatar.as_deref().unwrap_or("•"),
                                persona.name
                            );
                            if ui.selectable_label(active, label).clicked() && !active {
                                actions.push(SettingsAction::SelectPersona(persona.id.clone()));
                            }
                            if ui.small_button("↑").clicked() {
                                actions.push(SettingsAction::MovePersona(
                                    persona.id.clone(),
                                    MoveDirection::Up,
                                ));
                            }
                            if ui.small_button("↓").clicked() {
                                actions.push(SettingsAction::MovePersona(
                                    persona.id.clone(),
                                    MoveDirection::Down,
                                ));
                            }
                            if ui
                                .small_button(RichText::new("🗑").color(ERROR))
                                .clicked()
                            {
                                actions.push(SettingsAction::DeletePersona(persona.id.clone()));
                            }
                        });
                    }
                    if ui.small_button("+ Add persona").clicked() {
                        actions.push(SettingsAction::AddPersona);
                    }

                    // ── Active persona editor ────────────────────────
                    if let Some(draft) = &mut state.persona_draft {
                        ui.add_space(8.0);
                        ui.label(
                            RichText::new(format!("Edit: {}", draft.name))
                                .color(TEXT_SECONDARY)
                                .strong(),
                        );

                        ui.label(RichText::new("Name").color(TEXT_SECONDARY).small());
                        ui.text_edit_singleline(&mut draft.name);

                        ui.label(
                            RichText::new("System prompt")
                                .color(TEXT_SECONDARY)
                                .small(),
                        );
                        ui.add(
                            egui::TextEdit::multiline(&mut draft.system_prompt)
                                .desired_rows(3)
                                .desired_width(ui.available_width()),
                        );

                        ui.label(RichText::new("Model").color(TEXT_SECONDARY).small());
                        egui::ComboBox::from_id_salt("persona_model")
                            .selected_text(
                                PLAYGROUND_MODELS
                                    .iter()
                                    .find(|m| m.id == draft.config.model)
                                    .map(|m| m.name)
                                    .unwrap_or(draft.config.model.as_str()),
                            )
                            .show_ui(ui, |ui| {
                                for model in PLAYGROUND_MODELS {
                                    ui.selectable_value(
                                        &mut draft.config.model,
                                        model.id.to_string(),
                                        model.name,
                                    );
                                }
                            });

                        ui.label(RichText::new("Temperature").color(TEXT_SECONDARY).small());
                        ui.add(egui::Slider::new(&mut draft.config.temperature, 0.0..=2.0));

                        ui.label(RichText::new("Top-K").color(TEXT_SECONDARY).small());
                        ui.add(egui::Slider::new(&mut draft.config.top_k, 1..=100));

                        ui.label(RichText::new("Top-P").color(TEXT_SECONDARY).small());
                        ui.add(egui::Slider::new(&mut draft.config.top_p, 0.0..=1.0));

                        ui.label(RichText::new("Max tokens").color(TEXT_SECONDARY).small());
                        ui.add(egui::Slider::new(
                            &mut draft.config.max_output_tokens,
                            256..=8192,
                        ));

                        ui.checkbox(&mut draft.chat_mode, "Chat mode (sentence bubbles)");

                        // Value equality against the stored persona, not a
                        // deep-clone diff.
                        let dirty = roster
                            .get(&draft.id)
                            .map(|stored| *stored != *draft)
                            .unwrap_or(false);
                        if ui
                            .add_enabled(dirty, egui::Button::new("Save persona").small())
                            .clicked()
                        {
                            actions.push(SettingsAction::SavePersona(draft.clone()));
                        }
                    }

                    ui.add_space(12.0);
                    ui.separator();

                    // ── Usage Section ────────────────────────────────
                    ui.label(RichText::new("Usage").color(ACCENT).strong());
                    ui.add_space(2.0);
                    if usage.per_model.is_empty() {
                        ui.label(
                            RichText::new("No usage recorded yet")
                                .color(TEXT_SECONDARY)
                                .small(),
                        );
                    } else {
                        for (model, tally) in &usage.per_model {
                            ui.label(
                                RichText::new(format!(
                                    "{}: {} in / {} out ({} calls)",
                                    model, tally.input_tokens, tally.output_tokens, tally.calls
                                ))
                                .color(TEXT_SECONDARY)
                                .small()
                                .monospace(),
                            );
                        }
                        ui.label(
                            RichText::new(format!("Total: {} tokens", usage.total_tokens()))
                                .color(TEXT_PRIMARY)
                                .small(),
                        );
                    }
                });
        });

    actions
}

fn storage_label(backend: &StorageBackendType) -> &'static str {
    match backend {
        StorageBackendType::Auto => "Auto-detect",
        StorageBackendType::Memory => "Memory (volatile)",
        StorageBackendType::IndexedDb => "IndexedDB (persistent)",
    }
}
