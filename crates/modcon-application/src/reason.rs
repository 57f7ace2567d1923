//! Reason capture for deny-class actions.

use modcon_core::action::{ActionDescriptor, ReasonPolicy};
use modcon_core::config::{DenyReason, DenyReasonCatalogs};
use modcon_core::error::{ModconError, Result};
use serde::Serialize;

/// What the operator is asked before a reason-required action may dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasonPrompt {
    pub action: &'static str,
    pub description: String,
    /// Selectable entries; `None` means free text.
    pub catalog: Option<Vec<DenyReason>>,
}

/// Validates operator-supplied reasons against an action's reason policy.
#[derive(Debug, Clone, Default)]
pub struct ReasonCapture {
    catalogs: DenyReasonCatalogs,
}

impl ReasonCapture {
    pub fn new(catalogs: DenyReasonCatalogs) -> Self {
        Self { catalogs }
    }

    /// Prompt for `action`, or `None` when it takes no reason.
    pub fn prompt(&self, action: &ActionDescriptor) -> Result<Option<ReasonPrompt>> {
        match action.reason {
            ReasonPolicy::None => Ok(None),
            ReasonPolicy::FreeText => Ok(Some(ReasonPrompt {
                action: action.name,
                description: "Please enter a reason.".to_string(),
                catalog: None,
            })),
            ReasonPolicy::Catalog(key) => Ok(Some(ReasonPrompt {
                action: action.name,
                description: "Please select a reason.".to_string(),
                catalog: Some(self.catalog(key)?.to_vec()),
            })),
        }
    }

    /// Resolves `input` to the reason sent with every mutation of the batch.
    ///
    /// Catalog entries match by key or display name, case-insensitively, and
    /// resolve to the entry's key. Free text is trimmed and must not be empty.
    pub fn capture(&self, action: &ActionDescriptor, input: &str) -> Result<Option<String>> {
        let input = input.trim();
        match action.reason {
            ReasonPolicy::None => Ok(None),
            ReasonPolicy::FreeText => {
                if input.is_empty() {
                    return Err(ModconError::ReasonRequired(action.name.to_string()));
                }
                Ok(Some(input.to_string()))
            }
            ReasonPolicy::Catalog(key) => {
                if input.is_empty() {
                    return Err(ModconError::ReasonRequired(action.name.to_string()));
                }
                self.catalog(key)?
                    .iter()
                    .find(|r| r.key.eq_ignore_ascii_case(input) || r.name.eq_ignore_ascii_case(input))
                    .map(|r| Some(r.key.clone()))
                    .ok_or_else(|| {
                        ModconError::InvalidReason(format!(
                            "'{input}' is not one of the {key} deny reasons"
                        ))
                    })
            }
        }
    }

    fn catalog(&self, key: modcon_core::collection::FetchKey) -> Result<&[DenyReason]> {
        match self.catalogs.catalog(key) {
            Some(entries) if !entries.is_empty() => Ok(entries),
            _ => Err(ModconError::config(format!("no deny reasons configured for {key}"))),
        }
    }
}
