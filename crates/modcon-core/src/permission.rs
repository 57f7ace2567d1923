//! Operator permission set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Capability names as sent by the backend.
pub mod capability {
    pub const APPROVE_EMOJIS: &str = "canApproveEmojis";
    pub const DELETE_EMOJIS: &str = "canDeleteEmojis";
    pub const APPROVE_BOTS: &str = "canApproveBots";
    pub const DELETE_BOTS: &str = "canDeleteBots";
    pub const APPROVE_TEMPLATES: &str = "canApproveTemplates";
    pub const DELETE_TEMPLATES: &str = "canDeleteTemplates";
    pub const APPROVE_SOUNDS: &str = "canApproveSounds";
    pub const DELETE_SOUNDS: &str = "canDeleteSounds";
    pub const APPROVE_REVIEWS: &str = "canApproveReviews";
    pub const DELETE_REVIEWS: &str = "canDeleteReviews";
    pub const DELETE_BLOCKED_IPS: &str = "canDeleteBlockedIps";
    pub const DELETE_LINKS: &str = "canDeleteLinks";
    pub const DELETE_BOT_DENIES: &str = "canDeleteBotDenies";
    pub const DELETE_TIMEOUTS: &str = "canDeleteTimeouts";
    pub const DELETE_QUARANTINES: &str = "canDeleteQuarantines";
}

/// Mapping from capability name to grant. Unknown capabilities are denied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(HashMap<String, bool>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allows(&self, capability: &str) -> bool {
        self.0.get(capability).copied().unwrap_or(false)
    }

    pub fn grant(mut self, capability: impl Into<String>) -> Self {
        self.0.insert(capability.into(), true);
        self
    }

    pub fn set(&mut self, capability: impl Into<String>, allowed: bool) {
        self.0.insert(capability.into(), allowed);
    }
}

impl FromIterator<(String, bool)> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Supplies the operator's current permissions.
///
/// The set is refreshed alongside data fetches; readers always see the latest
/// snapshot.
pub trait PermissionProvider: Send + Sync {
    fn current(&self) -> PermissionSet;
}

/// A provider that never changes. Handy for tests and offline tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions(pub PermissionSet);

impl PermissionProvider for StaticPermissions {
    fn current(&self) -> PermissionSet {
        self.0.clone()
    }
}
