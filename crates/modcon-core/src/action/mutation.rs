//! Mutations sent through the moderation backend.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Resource type a mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Resource {
    Emoji,
    Bot,
    Template,
    Sound,
    Review,
    BlockedIp,
    Link,
    BotDeny,
    BotTimeout,
    ServerTimeout,
    Quarantine,
}

impl Resource {
    /// Path segment under the dashboard API.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Emoji => "emojis",
            Self::Bot => "bots",
            Self::Template => "templates",
            Self::Sound => "sounds",
            Self::Review => "reviews",
            Self::BlockedIp => "blockedips",
            Self::Link => "links",
            Self::BotDeny => "botdenies",
            Self::BotTimeout => "timeouts/bot",
            Self::ServerTimeout => "timeouts/server",
            Self::Quarantine => "quarantines",
        }
    }
}

/// Kind of record a nested resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParentKind {
    Server,
    Bot,
}

/// Owner of a nested resource, e.g. the server or bot a review was left on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parent {
    pub kind: ParentKind,
    pub id: String,
}

impl Parent {
    pub fn new(kind: ParentKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// One unit of work against the backend for a single target record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    Approve {
        resource: Resource,
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<Parent>,
    },
    Deny {
        resource: Resource,
        id: String,
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<Parent>,
    },
    Delete {
        resource: Resource,
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<Parent>,
    },
}

impl Mutation {
    pub fn resource(&self) -> Resource {
        match self {
            Self::Approve { resource, .. }
            | Self::Deny { resource, .. }
            | Self::Delete { resource, .. } => *resource,
        }
    }

    pub fn target_id(&self) -> &str {
        match self {
            Self::Approve { id, .. } | Self::Deny { id, .. } | Self::Delete { id, .. } => id,
        }
    }

    pub fn parent(&self) -> Option<&Parent> {
        match self {
            Self::Approve { parent, .. }
            | Self::Deny { parent, .. }
            | Self::Delete { parent, .. } => parent.as_ref(),
        }
    }

    /// Scopes the mutation to the record owning its target.
    pub fn within(mut self, owner: Parent) -> Self {
        match &mut self {
            Self::Approve { parent, .. }
            | Self::Deny { parent, .. }
            | Self::Delete { parent, .. } => *parent = Some(owner),
        }
        self
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Deny { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Short verb for logs and notices.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Approve { .. } => "approve",
            Self::Deny { .. } => "deny",
            Self::Delete { .. } => "delete",
        }
    }
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.verb(), self.resource(), self.target_id())?;
        if let Some(parent) = self.parent() {
            write!(f, " on {} {}", parent.kind, parent.id)?;
        }
        Ok(())
    }
}
