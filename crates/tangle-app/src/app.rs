//! Main egui application — composes the panels and owns the stores.

use std::cell::RefCell;
use std::rc::Rc;

use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};

use tangle_core::event_bus::EventBus;
use tangle_core::personas::PersonaRoster;
use tangle_core::ports::{GenerateRequest, ModelPort, PacerPort, StoragePort};
use tangle_core::store::ChatStore;
use tangle_core::stream::{CancelToken, DeliveryMode, ResponseController};
use tangle_core::thread::build_history;
use tangle_platform::llm::GeminiProvider;
use tangle_platform::pacer::TimeoutPacer;
use tangle_platform::persist;
use tangle_platform::storage::open_storage;
use tangle_types::config::{AppSettings, StorageBackendType};
use tangle_types::event::ChatEvent;
use tangle_types::message::Role;
use tangle_types::persona::Persona;
use tangle_types::usage::UsageTracker;
use tangle_ui::panels::chat::{chat_panel, ChatAction};
use tangle_ui::panels::settings::{settings_panel, SettingsAction};
use tangle_ui::panels::sidebar::{sidebar_panel, SidebarAction};
use tangle_ui::state::UiState;
use tangle_ui::theme;

/// Everything loaded from storage at startup, delivered to the UI
/// thread through a slot polled on frame.
struct RestoredState {
    storage: Rc<dyn StoragePort>,
    store: ChatStore,
    roster: PersonaRoster,
    settings: AppSettings,
    usage: UsageTracker,
}

pub struct TangleApp {
    ui_state: UiState,
    settings: AppSettings,
    store: Rc<RefCell<ChatStore>>,
    roster: Rc<RefCell<PersonaRoster>>,
    usage: Rc<RefCell<UsageTracker>>,
    event_bus: EventBus,
    model: Rc<dyn ModelPort>,
    pacer: Rc<dyn PacerPort>,
    storage: Option<Rc<dyn StoragePort>>,
    /// Token for the in-flight generation, if any
    cancel: Option<CancelToken>,
    restore_slot: Rc<RefCell<Option<RestoredState>>>,
    first_frame: bool,
}

impl TangleApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = AppSettings::default();
        let restore_slot: Rc<RefCell<Option<RestoredState>>> = Rc::new(RefCell::new(None));

        Self::restore_state(restore_slot.clone(), cc.egui_ctx.clone());

        Self {
            ui_state: UiState::new(),
            model: Rc::new(GeminiProvider::new(settings.api_key.clone())),
            settings,
            store: Rc::new(RefCell::new(ChatStore::new())),
            roster: Rc::new(RefCell::new(PersonaRoster::new())),
            usage: Rc::new(RefCell::new(UsageTracker::new())),
            event_bus: EventBus::new(),
            pacer: Rc::new(TimeoutPacer),
            storage: None,
            cancel: None,
            restore_slot,
            first_frame: true,
        }
    }

    /// Open storage and load every persisted concern (async).
    ///
    /// Settings are read through a bootstrap auto-detected backend first,
    /// since the backend preference itself lives in settings; the rest of
    /// the state then loads from the preferred backend.
    fn restore_state(slot: Rc<RefCell<Option<RestoredState>>>, ctx: egui::Context) {
        wasm_bindgen_futures::spawn_local(async move {
            let bootstrap = open_storage(StorageBackendType::Auto).await;
            let settings = persist::load_settings(bootstrap.as_ref()).await;
            let storage = if settings.storage == StorageBackendType::Auto {
                bootstrap
            } else {
                open_storage(settings.storage).await
            };
            let store = persist::load_sessions(storage.as_ref()).await;
            let roster = persist::load_personas(storage.as_ref()).await;
            let usage = persist::load_usage(storage.as_ref()).await;
            log::info!(
                "State restored from {}: {} session(s), {} persona(s)",
                storage.backend_name(),
                store.sessions().len(),
                roster.personas().len()
            );
            *slot.borrow_mut() = Some(RestoredState {
                storage,
                store,
                roster,
                settings,
                usage,
            });
            ctx.request_repaint();
        });
    }

    /// Install restored state once the async load lands.
    fn adopt_restored_state(&mut self, restored: RestoredState) {
        self.storage = Some(restored.storage);
        *self.store.borrow_mut() = restored.store;
        *self.roster.borrow_mut() = restored.roster;
        self.settings = restored.settings;
        *self.usage.borrow_mut() = restored.usage;

        if self.roster.borrow_mut().ensure_known_model() {
            self.persist_personas();
        }
        self.rebuild_model();

        if self.store.borrow().sessions().is_empty() {
            self.store.borrow_mut().create_session();
            self.persist_sessions();
        }
        self.refresh_persona_draft();
    }

    fn rebuild_model(&mut self) {
        self.model = Rc::new(GeminiProvider::new(self.settings.api_key.clone()));
    }

    fn refresh_persona_draft(&mut self) {
        self.ui_state.persona_draft = self.roster.borrow().active().cloned();
    }

    // ─── Persistence (fire-and-forget) ───────────────────────

    fn persist_sessions(&self) {
        let Some(storage) = self.storage.clone() else {
            return;
        };
        let snapshot = {
            let store = self.store.borrow();
            ChatStore::from_parts(
                store.sessions().to_vec(),
                store.current_session_id().map(String::from),
            )
        };
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = persist::save_sessions(storage.as_ref(), &snapshot).await {
                log::error!("Failed to persist sessions: {}", e);
            }
        });
    }

    fn persist_personas(&self) {
        let Some(storage) = self.storage.clone() else {
            return;
        };
        let snapshot = {
            let roster = self.roster.borrow();
            PersonaRoster::from_parts(
                roster.personas().to_vec(),
                roster.active_id().map(String::from),
            )
        };
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = persist::save_personas(storage.as_ref(), &snapshot).await {
                log::error!("Failed to persist personas: {}", e);
            }
        });
    }

    fn persist_settings(&self) {
        let Some(storage) = self.storage.clone() else {
            return;
        };
        let settings = self.settings.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = persist::save_settings(storage.as_ref(), &settings).await {
                log::error!("Failed to persist settings: {}", e);
            }
        });
    }

    fn persist_usage(&self) {
        let Some(storage) = self.storage.clone() else {
            return;
        };
        let usage = self.usage.borrow().clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = persist::save_usage(storage.as_ref(), &usage).await {
                log::error!("Failed to persist usage: {}", e);
            }
        });
    }

    // ─── Generation ──────────────────────────────────────────

    /// Append (or branch-edit) the user message, then stream the reply.
    fn dispatch_generation(&mut self, text: String, edited_node: Option<String>, ctx: &egui::Context) {
        let session_id = match self.store.borrow().current_session_id() {
            Some(id) => id.to_string(),
            None => String::new(),
        };
        let session_id = if session_id.is_empty() {
            self.store.borrow_mut().create_session()
        } else {
            session_id
        };

        let persona = {
            let roster = self.roster.borrow();
            roster
                .active()
                .or_else(|| roster.personas().first())
                .cloned()
        };
        let Some(persona) = persona else {
            log::error!("No persona available, dropping message");
            return;
        };

        {
            let mut store = self.store.borrow_mut();
            match &edited_node {
                Some(node_id) => store.edit_message(&session_id, node_id, text),
                None => {
                    store.append_message(&session_id, Role::User, text, Vec::new());
                }
            }
        }

        let history = {
            let store = self.store.borrow();
            match store.session(&session_id) {
                Some(session) => build_history(session, &persona.system_prompt),
                None => return,
            }
        };
        let req = GenerateRequest::new(history, &persona.config);
        let mode = if persona.chat_mode {
            DeliveryMode::Bubbles
        } else {
            DeliveryMode::Single
        };

        let cancel = CancelToken::new();
        self.cancel = Some(cancel.clone());
        // Gate further sends now; the event bus confirms on the next frame.
        self.ui_state.generating = true;
        self.ui_state.status_text = "Generating...".to_string();

        let store = self.store.clone();
        let event_bus = self.event_bus.clone();
        let model = self.model.clone();
        let pacer = self.pacer.clone();
        let storage = self.storage.clone();
        let ctx = ctx.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let mut controller = ResponseController::new(store.clone(), event_bus);
            let outcome = controller
                .run(&session_id, model.as_ref(), req, mode, pacer.as_ref(), &cancel)
                .await;
            log::info!("Generation finished: {:?}", outcome);

            if let Some(storage) = storage {
                let snapshot = {
                    let store = store.borrow();
                    ChatStore::from_parts(
                        store.sessions().to_vec(),
                        store.current_session_id().map(String::from),
                    )
                };
                if let Err(e) = persist::save_sessions(storage.as_ref(), &snapshot).await {
                    log::error!("Failed to persist sessions: {}", e);
                }
            }
            ctx.request_repaint();
        });
    }

    // ─── Action handlers ─────────────────────────────────────

    fn handle_chat_action(&mut self, action: ChatAction, ctx: &egui::Context) {
        match action {
            ChatAction::Send(text) => self.dispatch_generation(text, None, ctx),
            ChatAction::SubmitEdit { node_id, text } => {
                self.dispatch_generation(text, Some(node_id), ctx)
            }
            ChatAction::Navigate { node_id, direction } => {
                let session_id = self
                    .store
                    .borrow()
                    .current_session_id()
                    .map(String::from);
                if let Some(session_id) = session_id {
                    self.store
                        .borrow_mut()
                        .navigate_sibling(&session_id, &node_id, direction);
                    self.persist_sessions();
                }
            }
            ChatAction::Stop => {
                if let Some(cancel) = &self.cancel {
                    cancel.cancel();
                    self.ui_state.status_text = "Stopping...".to_string();
                }
            }
        }
    }

    fn handle_sidebar_action(&mut self, action: SidebarAction) {
        match action {
            SidebarAction::NewChat => {
                self.store.borrow_mut().create_session();
            }
            SidebarAction::Select(id) => {
                self.store.borrow_mut().select_session(&id);
            }
            SidebarAction::Delete(id) => {
                let mut store = self.store.borrow_mut();
                store.delete_session(&id);
                if store.sessions().is_empty() {
                    store.create_session();
                }
            }
            SidebarAction::Rename { session_id, title } => {
                self.store.borrow_mut().rename_session(&session_id, title);
            }
        }
        self.persist_sessions();
    }

    fn handle_settings_action(&mut self, action: SettingsAction) {
        match action {
            SettingsAction::SettingsChanged => {
                self.rebuild_model();
                self.persist_settings();
            }
            SettingsAction::SelectPersona(id) => {
                self.roster.borrow_mut().set_active(&id);
                self.refresh_persona_draft();
                self.persist_personas();
            }
            SettingsAction::AddPersona => {
                let persona = Persona::new("New Persona", "You are a helpful AI assistant.");
                let id = persona.id.clone();
                {
                    let mut roster = self.roster.borrow_mut();
                    roster.add(persona);
                    roster.set_active(&id);
                }
                self.refresh_persona_draft();
                self.persist_personas();
            }
            SettingsAction::DeletePersona(id) => {
                self.roster.borrow_mut().remove(&id);
                self.refresh_persona_draft();
                self.persist_personas();
            }
            SettingsAction::MovePersona(id, direction) => {
                self.roster.borrow_mut().move_persona(&id, direction);
                self.persist_personas();
            }
            SettingsAction::SavePersona(edited) => {
                let id = edited.id.clone();
                self.roster
                    .borrow_mut()
                    .update(&id, move |stored| *stored = edited);
                self.persist_personas();
            }
        }
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        let events = self.event_bus.drain();
        if events.is_empty() {
            return;
        }

        let mut usage_changed = false;
        for event in &events {
            match event {
                ChatEvent::UsageReported {
                    model,
                    input_tokens,
                    output_tokens,
                } => {
                    self.usage
                        .borrow_mut()
                        .record(model, *input_tokens, *output_tokens);
                    usage_changed = true;
                }
                ChatEvent::GenerationCompleted { .. }
                | ChatEvent::GenerationCancelled { .. }
                | ChatEvent::GenerationFailed { .. } => {
                    self.cancel = None;
                }
                _ => {}
            }
        }
        if usage_changed {
            self.persist_usage();
        }

        self.ui_state.process_events(&events);
        ctx.request_repaint();
    }
}

impl eframe::App for TangleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            self.first_frame = false;
        }

        let restored = self.restore_slot.borrow_mut().take();
        if let Some(restored) = restored {
            self.adopt_restored_state(restored);
        }

        self.drain_events(ctx);
        if self.ui_state.is_busy() {
            ctx.request_repaint();
        }

        // ── Top bar ──────────────────────────────────────────
        TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("Tangle")
                        .strong()
                        .color(theme::ACCENT)
                        .size(16.0),
                );
                ui.separator();

                let (active_name, active_model) = {
                    let roster = self.roster.borrow();
                    match roster.active() {
                        Some(p) => (p.name.clone(), p.config.model.clone()),
                        None => ("No persona".to_string(), String::new()),
                    }
                };
                let mut selected: Option<String> = None;
                egui::ComboBox::from_id_salt("active_persona")
                    .selected_text(active_name)
                    .show_ui(ui, |ui| {
                        for persona in self.roster.borrow().personas() {
                            let is_active =
                                self.roster.borrow().active_id() == Some(persona.id.as_str());
                            if ui.selectable_label(is_active, &persona.name).clicked() {
                                selected = Some(persona.id.clone());
                            }
                        }
                    });
                if let Some(id) = selected {
                    self.handle_settings_action(SettingsAction::SelectPersona(id));
                }

                ui.label(
                    RichText::new(active_model)
                        .color(theme::TEXT_SECONDARY)
                        .small(),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .selectable_label(self.ui_state.show_settings, "Settings")
                        .clicked()
                    {
                        self.ui_state.show_settings = !self.ui_state.show_settings;
                    }
                    ui.label(
                        RichText::new(&self.ui_state.status_text)
                            .color(theme::TEXT_SECONDARY)
                            .small(),
                    );
                });
            });
        });

        // ── Session sidebar ──────────────────────────────────
        SidePanel::left("session_sidebar")
            .min_width(180.0)
            .max_width(260.0)
            .show(ctx, |ui| {
                let action = {
                    let store = self.store.borrow();
                    sidebar_panel(ui, &mut self.ui_state, &store)
                };
                if let Some(action) = action {
                    self.handle_sidebar_action(action);
                }
            });

        // ── Settings side panel ──────────────────────────────
        if self.ui_state.show_settings {
            SidePanel::right("settings_panel")
                .min_width(300.0)
                .max_width(380.0)
                .show(ctx, |ui| {
                    let actions = {
                        let roster = self.roster.borrow();
                        let usage = self.usage.borrow();
                        settings_panel(
                            ui,
                            &mut self.ui_state,
                            &mut self.settings,
                            &roster,
                            &usage,
                        )
                    };
                    for action in actions {
                        self.handle_settings_action(action);
                    }
                });
        }

        // ── Conversation ─────────────────────────────────────
        CentralPanel::default().show(ctx, |ui| {
            let action = {
                let store = self.store.borrow();
                chat_panel(ui, &mut self.ui_state, &store)
            };
            if let Some(action) = action {
                self.handle_chat_action(action, ctx);
            }
        });
    }
}
