use std::collections::BTreeSet;

use serde::Serialize;

use crate::collection::CollectionId;
use crate::error::{ModconError, Result};

/// Active collection plus the selected record indexes within it.
///
/// Invariant: every selected index is below `record_count`, the length of the
/// active collection's current records. Selection is emptied when the active
/// collection changes, when a batch is dispatched, and when the records are
/// replaced. It is never clamped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionStore {
    active: Option<CollectionId>,
    selected: BTreeSet<usize>,
    record_count: usize,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&CollectionId> {
        self.active.as_ref()
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Selected indexes in ascending order.
    pub fn selected(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Switches the active collection and clears the selection.
    pub fn set_active_collection(&mut self, id: CollectionId, record_count: usize) {
        self.active = Some(id);
        self.record_count = record_count;
        self.selected.clear();
    }

    /// Replaces the selection. Duplicates collapse; any out-of-range index
    /// rejects the whole call and leaves the previous selection untouched.
    pub fn select(&mut self, indexes: impl IntoIterator<Item = usize>) -> Result<()> {
        if self.active.is_none() {
            return Err(ModconError::InvalidSelection(
                "no active collection".to_string(),
            ));
        }
        let next: BTreeSet<usize> = indexes.into_iter().collect();
        if let Some(bad) = next.iter().find(|&&i| i >= self.record_count) {
            return Err(ModconError::InvalidSelection(format!(
                "index {bad} is out of range for {} records",
                self.record_count
            )));
        }
        self.selected = next;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Called when the active collection's records were substituted.
    pub fn records_replaced(&mut self, record_count: usize) {
        self.record_count = record_count;
        self.selected.clear();
    }
}
