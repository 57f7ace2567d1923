//! Collection domain models.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::record::Record;
use crate::action::ActionDescriptor;

/// Dataset served by the backend's fetch interface.
///
/// One dataset can back several collections (a queue's waiting and approved
/// views share the same fetch), so refreshes are keyed by dataset.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FetchKey {
    Emojis,
    Bots,
    Templates,
    Sounds,
    Reviews,
    BlockedIps,
    Links,
    BotDenies,
    Timeouts,
    Quarantines,
}

/// Unique key of a collection in the registry (e.g. `bots.waiting`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// How a collection projects its dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFilter {
    All,
    /// Keep records whose boolean `field` equals `equals` (missing reads as false).
    Flag { field: &'static str, equals: bool },
}

impl RecordFilter {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Flag { field, equals } => record.flag(field) == *equals,
        }
    }
}

/// Static description of one moderatable collection.
///
/// Descriptors are defined once and never mutated. The records themselves are
/// owned by the refresh coordinator and replaced wholesale; a descriptor only
/// says which dataset it views and how it filters it.
#[derive(Debug, Clone)]
pub struct CollectionDescriptor {
    pub id: CollectionId,
    pub title: &'static str,
    pub fetch_key: FetchKey,
    pub filter: RecordFilter,
    pub actions: Vec<ActionDescriptor>,
}

impl CollectionDescriptor {
    pub fn new(id: &str, title: &'static str, fetch_key: FetchKey) -> Self {
        Self {
            id: CollectionId::from(id),
            title,
            fetch_key,
            filter: RecordFilter::All,
            actions: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }

    /// Finds an action by its display name (case-insensitive).
    pub fn action(&self, name: &str) -> Option<&ActionDescriptor> {
        self.actions
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Projects a dataset into this collection's ordered records.
    pub fn project(&self, dataset: &[Record]) -> Vec<Record> {
        dataset
            .iter()
            .filter(|r| self.filter.matches(r))
            .cloned()
            .collect()
    }
}
