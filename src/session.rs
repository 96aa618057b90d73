//! Per-visitor session preferences
//!
//! The session context is the filter input: level, target OS, and focus tag.
//! Contexts live in an in-process map keyed by the visitor's `sid` cookie;
//! an unknown or missing session id simply yields the defaults.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{LearningLevel, ParseLevelError, ParseOsError, TargetOs};

/// Invalid preference update. The stored context is left untouched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreferenceError {
    #[error(transparent)]
    Level(#[from] ParseLevelError),
    #[error(transparent)]
    Os(#[from] ParseOsError),
}

/// Mutable per-visitor preferences used as filter input
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub level: LearningLevel,
    pub target_os: TargetOs,
    focus: String,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            level: LearningLevel::Newbie,
            target_os: TargetOs::Any,
            focus: String::new(),
        }
    }
}

impl SessionContext {
    pub fn focus(&self) -> &str {
        &self.focus
    }

    /// Focus is trimmed on write; blank clears the filter.
    pub fn set_focus(&mut self, focus: &str) {
        self.focus = focus.trim().to_string();
    }

    /// Apply a preference form. Blank level/OS fall back to their defaults;
    /// an unrecognized value rejects the whole update.
    pub fn apply_preferences(
        &mut self,
        level: &str,
        target_os: &str,
        focus: Option<&str>,
    ) -> Result<(), PreferenceError> {
        let level = LearningLevel::from_form_value(level)?;
        let target_os = TargetOs::from_form_value(target_os)?;
        self.level = level;
        self.target_os = target_os;
        self.set_focus(focus.unwrap_or(""));
        Ok(())
    }
}

/// In-process session registry keyed by cookie id
#[derive(Debug, Default)]
pub struct SessionStore {
    contexts: RwLock<HashMap<Uuid, SessionContext>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The context for a session id, defaulting for unknown/missing ids.
    pub fn context(&self, id: Option<Uuid>) -> SessionContext {
        id.and_then(|id| self.contexts.read().unwrap().get(&id).cloned())
            .unwrap_or_default()
    }

    /// Store the context for a session id, replacing any previous value.
    pub fn put(&self, id: Uuid, context: SessionContext) {
        self.contexts.write().unwrap().insert(id, context);
    }
}
