//! Confirmation gate for destructive actions.

use modcon_core::action::{ActionDescriptor, TargetNoun};
use serde::Serialize;

/// Message shown before an irreversible batch is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationPrompt {
    pub action: &'static str,
    pub count: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmationGate;

impl ConfirmationGate {
    pub fn new() -> Self {
        Self
    }

    pub fn requires(&self, action: &ActionDescriptor) -> bool {
        action.kind.is_destructive()
    }

    /// Builds the prompt for `count` selected records.
    pub fn prompt(&self, action: &ActionDescriptor, count: usize) -> ConfirmationPrompt {
        let noun = action
            .noun
            .unwrap_or(TargetNoun::new("item", "items"))
            .for_count(count);
        ConfirmationPrompt {
            action: action.name,
            count,
            message: format!(
                "You are about to {} {count} {noun}. This action is irreversible.",
                action.name.to_lowercase()
            ),
        }
    }
}
