//! Data refresh coordinator.
//!
//! Sole owner of the collection records. Datasets are only ever replaced
//! wholesale, never edited in place, which is what lets the selection be
//! cleared on refresh without diffing old and new indexes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use modcon_core::collection::{
    CollectionDescriptor, CollectionRegistry, DashboardSource, FetchKey, Record, Refresher,
};
use modcon_core::notification::{Notice, Notifier};
use modcon_core::permission::{PermissionProvider, PermissionSet};
use modcon_core::selection::SelectionStore;

pub struct DataRefreshCoordinator {
    source: Arc<dyn DashboardSource>,
    registry: Arc<CollectionRegistry>,
    datasets: RwLock<HashMap<FetchKey, Arc<Vec<Record>>>>,
    permissions: RwLock<PermissionSet>,
    selection: Arc<Mutex<SelectionStore>>,
    notifier: Notifier,
}

impl DataRefreshCoordinator {
    pub fn new(
        source: Arc<dyn DashboardSource>,
        registry: Arc<CollectionRegistry>,
        selection: Arc<Mutex<SelectionStore>>,
        notifier: Notifier,
    ) -> Self {
        Self {
            source,
            registry,
            datasets: RwLock::new(HashMap::new()),
            permissions: RwLock::new(PermissionSet::default()),
            selection,
            notifier,
        }
    }

    /// Current dataset for `key`; empty until first fetched.
    pub fn dataset(&self, key: FetchKey) -> Arc<Vec<Record>> {
        self.datasets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    /// Records of `collection`, in display order.
    pub fn records(&self, collection: &CollectionDescriptor) -> Vec<Record> {
        collection.project(&self.dataset(collection.fetch_key))
    }

    /// Fetches `keys` and substitutes the returned datasets.
    ///
    /// On failure the previous records stay in place and a notice is sent, so
    /// a collection is never emptied by a failed fetch.
    pub async fn refresh_keys(&self, keys: &[FetchKey]) -> bool {
        if keys.is_empty() {
            return true;
        }
        tracing::debug!("[Refresh] Fetching {:?}", keys);

        let data = match self.source.fetch(keys).await {
            Ok(data) => data,
            Err(error) => {
                tracing::warn!("[Refresh] Fetch of {:?} failed: {}", keys, error);
                let names: Vec<&str> = keys.iter().map(|k| k.as_ref()).collect();
                self.notifier.notify(
                    Notice::error(format!("Failed to refresh data: {error}"))
                        .with_context(names.join(", ")),
                );
                return false;
            }
        };

        let mut replaced = Vec::new();
        {
            let mut datasets = self.datasets.write().unwrap_or_else(PoisonError::into_inner);
            for (key, records) in data.datasets {
                if keys.contains(&key) {
                    datasets.insert(key, Arc::new(records));
                    replaced.push(key);
                }
            }
        }
        if let Some(permissions) = data.permissions {
            *self.permissions.write().unwrap_or_else(PoisonError::into_inner) = permissions;
        }

        self.sync_selection(&replaced);
        tracing::info!("[Refresh] Replaced {:?}", replaced);
        true
    }

    fn sync_selection(&self, replaced: &[FetchKey]) {
        let mut selection = self.selection.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(active) = selection.active().cloned() else {
            return;
        };
        let Some(collection) = self.registry.get(&active) else {
            return;
        };
        if replaced.contains(&collection.fetch_key) {
            let count = self.records(collection).len();
            selection.records_replaced(count);
        }
    }
}

#[async_trait]
impl Refresher for DataRefreshCoordinator {
    async fn refresh(&self, keys: &[FetchKey]) -> bool {
        self.refresh_keys(keys).await
    }
}

impl PermissionProvider for DataRefreshCoordinator {
    fn current(&self) -> PermissionSet {
        self.permissions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
