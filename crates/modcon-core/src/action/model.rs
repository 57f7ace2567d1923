//! Action descriptor models.

use serde::Serialize;

use super::mutation::Mutation;
use crate::collection::{FetchKey, Record};
use crate::error::Result;
use crate::permission::PermissionSet;

/// What an action does to its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Navigates to a single record; never touches the backend.
    View,
    /// Mutates exactly one record.
    MutateSingle,
    /// Mutates every selected record.
    MutateBatch,
    /// Irreversible batch mutation; gated behind operator confirmation.
    DestructiveBatch,
}

impl ActionKind {
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::DestructiveBatch)
    }
}

/// Selection size an action accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionRule {
    AtLeastOne,
    ExactlyOne,
}

impl SelectionRule {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Self::AtLeastOne => count >= 1,
            Self::ExactlyOne => count == 1,
        }
    }
}

/// Declarative visibility predicate.
///
/// Evaluated against the operator's permission set and the current selection
/// every time the action list is presented; results are never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visibility {
    /// Capability the operator must hold, if any.
    pub capability: Option<&'static str>,
    pub selection: SelectionRule,
    /// Field that must hold a nested object on the (single) selected record.
    pub requires_object: Option<&'static str>,
}

impl Visibility {
    /// Checks the predicate, returning why the action is hidden when it is.
    pub fn check(
        &self,
        permissions: &PermissionSet,
        selected: &[&Record],
    ) -> std::result::Result<(), String> {
        if let Some(capability) = self.capability
            && !permissions.allows(capability)
        {
            return Err(format!("missing permission {capability}"));
        }
        if !self.selection.accepts(selected.len()) {
            return Err(match self.selection {
                SelectionRule::ExactlyOne => {
                    format!("requires exactly one selected record, got {}", selected.len())
                }
                SelectionRule::AtLeastOne => "requires a selection".to_string(),
            });
        }
        if let Some(field) = self.requires_object
            && !selected.iter().all(|r| r.has_object(field))
        {
            return Err(format!("selected record has no {field}"));
        }
        Ok(())
    }

    pub fn is_visible(&self, permissions: &PermissionSet, selected: &[&Record]) -> bool {
        self.check(permissions, selected).is_ok()
    }
}

/// How a reason is captured before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "catalog", rename_all = "snake_case")]
pub enum ReasonPolicy {
    None,
    /// Operator picks one entry of the configured catalog for this dataset.
    Catalog(FetchKey),
    /// Operator types any non-empty text.
    FreeText,
}

impl ReasonPolicy {
    pub fn is_required(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Singular and plural display names of an action's target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetNoun {
    pub singular: &'static str,
    pub plural: &'static str,
}

impl TargetNoun {
    pub const fn new(singular: &'static str, plural: &'static str) -> Self {
        Self { singular, plural }
    }

    pub fn for_count(&self, count: usize) -> &'static str {
        if count == 1 { self.singular } else { self.plural }
    }
}

pub type NavigateFn = fn(&Record) -> Result<String>;
pub type MutateFn = fn(&Record, Option<&str>) -> Result<Mutation>;

/// Effect of an action on one target record.
#[derive(Clone, Copy)]
pub enum Effect {
    /// Produces a navigation target (route or external URL).
    Navigate(NavigateFn),
    /// Produces the mutation to send for this record and optional reason.
    Mutate(MutateFn),
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Navigate(_) => f.write_str("Effect::Navigate"),
            Self::Mutate(_) => f.write_str("Effect::Mutate"),
        }
    }
}

/// One named action available on a collection.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub name: &'static str,
    pub kind: ActionKind,
    pub visibility: Visibility,
    pub reason: ReasonPolicy,
    pub effect: Effect,
    /// Dataset refreshed after the action runs.
    pub affects: Option<FetchKey>,
    /// Target type shown in confirmation prompts.
    pub noun: Option<TargetNoun>,
}

impl ActionDescriptor {
    /// A single-record navigation action.
    pub fn view(name: &'static str, navigate: NavigateFn) -> Self {
        Self {
            name,
            kind: ActionKind::View,
            visibility: Visibility {
                capability: None,
                selection: SelectionRule::ExactlyOne,
                requires_object: None,
            },
            reason: ReasonPolicy::None,
            effect: Effect::Navigate(navigate),
            affects: None,
            noun: None,
        }
    }

    /// A mutation applied to every selected record.
    pub fn batch(
        name: &'static str,
        capability: &'static str,
        affects: FetchKey,
        mutate: MutateFn,
    ) -> Self {
        Self {
            name,
            kind: ActionKind::MutateBatch,
            visibility: Visibility {
                capability: Some(capability),
                selection: SelectionRule::AtLeastOne,
                requires_object: None,
            },
            reason: ReasonPolicy::None,
            effect: Effect::Mutate(mutate),
            affects: Some(affects),
            noun: None,
        }
    }

    /// A mutation that only applies to a lone selected record.
    pub fn single(
        name: &'static str,
        capability: &'static str,
        affects: FetchKey,
        mutate: MutateFn,
    ) -> Self {
        let mut action = Self::batch(name, capability, affects, mutate);
        action.kind = ActionKind::MutateSingle;
        action.visibility.selection = SelectionRule::ExactlyOne;
        action
    }

    /// Marks the action irreversible; it will be confirmed before dispatch.
    pub fn destructive(mut self, noun: TargetNoun) -> Self {
        self.kind = ActionKind::DestructiveBatch;
        self.noun = Some(noun);
        self
    }

    pub fn with_reason(mut self, policy: ReasonPolicy) -> Self {
        self.reason = policy;
        self
    }

    /// Restricts the action to records carrying a nested `field` object.
    pub fn requires_object(mut self, field: &'static str) -> Self {
        self.visibility.requires_object = Some(field);
        self
    }

    pub fn summary(&self) -> ActionSummary {
        ActionSummary {
            name: self.name,
            kind: self.kind,
            reason: self.reason,
            affects: self.affects,
        }
    }
}

/// Presentation view of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionSummary {
    pub name: &'static str,
    pub kind: ActionKind,
    pub reason: ReasonPolicy,
    pub affects: Option<FetchKey>,
}
