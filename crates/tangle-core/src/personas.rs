//! Persona roster: the list of assistant configurations and the active
//! selection.

use tangle_types::config::{is_known_model, DEFAULT_MODEL};
use tangle_types::persona::{default_personas, Persona};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

pub struct PersonaRoster {
    personas: Vec<Persona>,
    active_id: Option<String>,
}

impl PersonaRoster {
    /// The built-in personas with the first one active.
    pub fn new() -> Self {
        let personas = default_personas();
        let active_id = personas.first().map(|p| p.id.clone());
        Self {
            personas,
            active_id,
        }
    }

    /// Rebuild from persisted parts. An empty list falls back to the
    /// defaults; an active id that no longer resolves is dropped.
    pub fn from_parts(personas: Vec<Persona>, active_id: Option<String>) -> Self {
        if personas.is_empty() {
            return Self::new();
        }
        let active_id = active_id.filter(|id| personas.iter().any(|p| &p.id == id));
        Self {
            personas,
            active_id,
        }
    }

    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Persona> {
        let id = self.active_id.as_deref()?;
        self.personas.iter().find(|p| p.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    pub fn set_active(&mut self, id: &str) {
        if self.personas.iter().any(|p| p.id == id) {
            self.active_id = Some(id.to_string());
        }
    }

    pub fn add(&mut self, persona: Persona) {
        self.personas.push(persona);
    }

    /// Apply an edit to one persona in place. Missing id is a no-op.
    pub fn update(&mut self, id: &str, apply: impl FnOnce(&mut Persona)) {
        if let Some(persona) = self.personas.iter_mut().find(|p| p.id == id) {
            apply(persona);
        }
    }

    /// Remove a persona. Removing the active one clears the selection.
    pub fn remove(&mut self, id: &str) {
        self.personas.retain(|p| p.id != id);
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
    }

    /// Reorder a persona one step up or down, clamped at the ends.
    pub fn move_persona(&mut self, id: &str, direction: MoveDirection) {
        let Some(index) = self.personas.iter().position(|p| p.id == id) else {
            return;
        };
        match direction {
            MoveDirection::Up if index > 0 => self.personas.swap(index - 1, index),
            MoveDirection::Down if index + 1 < self.personas.len() => {
                self.personas.swap(index, index + 1)
            }
            _ => {}
        }
    }

    /// Migrate the active persona off a model that left the catalog.
    /// Returns true when a migration happened (callers persist the roster).
    pub fn ensure_known_model(&mut self) -> bool {
        let Some(id) = self.active_id.clone() else {
            return false;
        };
        let Some(persona) = self.personas.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        if is_known_model(&persona.config.model) {
            return false;
        }
        log::warn!(
            "Model {} is invalid or deprecated; migrating persona '{}' to {}",
            persona.config.model,
            persona.name,
            DEFAULT_MODEL
        );
        persona.config.model = DEFAULT_MODEL.to_string();
        true
    }
}

impl Default for PersonaRoster {
    fn default() -> Self {
        Self::new()
    }
}
