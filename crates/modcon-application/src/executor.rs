//! Paced execution of action batches.
//!
//! The backend enforces per-minute quotas on its mutation endpoints, so a batch
//! is never issued concurrently. Dispatches are serialized with a fixed pacing
//! interval between them.
//!
//! The single-target and multi-target paths deliberately differ:
//!
//! - **One target**: the mutation is awaited, so its error is observable (and
//!   reported in the [`BatchReport`]) before the refresh runs. One pacing
//!   interval follows, then the refresh.
//! - **Several targets**: each mutation is fired without waiting for its
//!   response. Failures surface later as notices. The executor only suspends
//!   for the pacing interval between consecutive dispatches, then refreshes
//!   right after the last one is fired.
//!
//! Because of the second point the refresh can overtake a slow mutation, in
//! which case the operator sees stale data until the next refresh.

use std::sync::Arc;
use std::time::Duration;

use modcon_core::action::{ActionDescriptor, Effect, ModerationBackend, MutateFn, Mutation};
use modcon_core::collection::{CollectionId, FetchKey, Record, Refresher};
use modcon_core::error::{ModconError, Result};
use modcon_core::notification::{Notice, Notifier};
use modcon_core::permission::PermissionProvider;
use serde::Serialize;
use uuid::Uuid;

/// Snapshot of one dispatch: targets are copied out of the selection when the
/// batch is built, so later selection changes never affect it.
#[derive(Debug, Clone)]
pub struct ActionBatch {
    pub id: Uuid,
    pub collection: CollectionId,
    pub action: &'static str,
    effect: MutateFn,
    /// `(selection index, record)` in ascending index order.
    targets: Vec<(usize, Record)>,
    reason: Option<String>,
    affects: FetchKey,
}

impl ActionBatch {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn target_indexes(&self) -> Vec<usize> {
        self.targets.iter().map(|(i, _)| *i).collect()
    }
}

/// An item that could not be applied.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub index: usize,
    pub target: Option<String>,
    pub error: ModconError,
}

/// Outcome of a batch as known when the executor returns.
///
/// In the multi-target path `failures` only holds items whose mutation could
/// not even be built; backend failures arrive later through the notifier.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub collection: CollectionId,
    pub action: &'static str,
    pub targets: usize,
    pub dispatched: usize,
    pub failures: Vec<ItemFailure>,
    pub refreshed: bool,
}

pub struct ActionExecutor {
    backend: Arc<dyn ModerationBackend>,
    permissions: Arc<dyn PermissionProvider>,
    pacing: Duration,
    notifier: Notifier,
}

impl ActionExecutor {
    pub fn new(
        backend: Arc<dyn ModerationBackend>,
        permissions: Arc<dyn PermissionProvider>,
        pacing: Duration,
        notifier: Notifier,
    ) -> Self {
        Self {
            backend,
            permissions,
            pacing,
            notifier,
        }
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Validates a dispatch request and snapshots it into a batch.
    ///
    /// This is the only way to obtain an [`ActionBatch`], so a batch always
    /// carries its reason when the action requires one.
    pub fn prepare(
        &self,
        collection: &CollectionId,
        action: &ActionDescriptor,
        targets: Vec<(usize, Record)>,
        reason: Option<String>,
    ) -> Result<ActionBatch> {
        let Effect::Mutate(effect) = action.effect else {
            return Err(ModconError::unavailable(
                action.name,
                "navigation actions do not run as batches",
            ));
        };
        let affects = action.affects.ok_or_else(|| {
            ModconError::internal(format!("action '{}' has no dataset to refresh", action.name))
        })?;

        let selected: Vec<&Record> = targets.iter().map(|(_, r)| r).collect();
        action
            .visibility
            .check(&self.permissions.current(), &selected)
            .map_err(|reason| ModconError::unavailable(action.name, reason))?;

        let reason = reason.filter(|r| !r.trim().is_empty());
        if action.reason.is_required() && reason.is_none() {
            return Err(ModconError::ReasonRequired(action.name.to_string()));
        }

        let mut targets = targets;
        targets.sort_by_key(|(index, _)| *index);

        Ok(ActionBatch {
            id: Uuid::new_v4(),
            collection: collection.clone(),
            action: action.name,
            effect,
            targets,
            reason,
            affects,
        })
    }

    /// Runs `batch` to completion and refreshes its dataset exactly once.
    ///
    /// Never aborts early: individual failures are reported and the remaining
    /// targets are still dispatched.
    pub async fn run(&self, batch: ActionBatch, refresher: &dyn Refresher) -> BatchReport {
        tracing::info!(
            batch_id = %batch.id,
            collection = %batch.collection,
            action = batch.action,
            targets = batch.len(),
            "[Executor] Dispatching batch"
        );

        let (dispatched, failures) = match batch.targets.as_slice() {
            [(index, record)] => self.run_single(&batch, *index, record).await,
            _ => self.run_paced(&batch).await,
        };

        let refreshed = refresher.refresh(&[batch.affects]).await;

        tracing::info!(
            batch_id = %batch.id,
            dispatched,
            failures = failures.len(),
            refreshed,
            "[Executor] Batch complete"
        );

        BatchReport {
            batch_id: batch.id,
            collection: batch.collection.clone(),
            action: batch.action,
            targets: batch.len(),
            dispatched,
            failures,
            refreshed,
        }
    }

    async fn run_single(
        &self,
        batch: &ActionBatch,
        index: usize,
        record: &Record,
    ) -> (usize, Vec<ItemFailure>) {
        let mut failures = Vec::new();
        let mut dispatched = 0;

        match self.build(batch, index, record) {
            Ok(mutation) => {
                dispatched = 1;
                if let Err(error) = self.backend.apply(&mutation).await {
                    tracing::warn!("[Executor] {} failed: {}", mutation, error);
                    self.notifier
                        .notify(Notice::error(error.to_string()).with_context(mutation.to_string()));
                    failures.push(ItemFailure {
                        index,
                        target: Some(mutation.target_id().to_string()),
                        error,
                    });
                }
            }
            Err(failure) => failures.push(failure),
        }

        tokio::time::sleep(self.pacing).await;
        (dispatched, failures)
    }

    async fn run_paced(&self, batch: &ActionBatch) -> (usize, Vec<ItemFailure>) {
        let mut failures = Vec::new();
        let mut dispatched = 0;

        for (index, record) in &batch.targets {
            match self.build(batch, *index, record) {
                Ok(mutation) => {
                    // Pacing separates fired requests; skipped items do not wait.
                    if dispatched > 0 {
                        tokio::time::sleep(self.pacing).await;
                    }
                    self.fire(mutation);
                    dispatched += 1;
                    // Let the request start; its response is not awaited.
                    tokio::task::yield_now().await;
                }
                Err(failure) => failures.push(failure),
            }
        }

        (dispatched, failures)
    }

    fn build(
        &self,
        batch: &ActionBatch,
        index: usize,
        record: &Record,
    ) -> std::result::Result<Mutation, ItemFailure> {
        (batch.effect)(record, batch.reason()).map_err(|error| {
            tracing::warn!(
                "[Executor] Could not build {} for record #{}: {}",
                batch.action,
                index,
                error
            );
            self.notifier.notify(
                Notice::error(error.to_string())
                    .with_context(format!("{} record #{}", batch.action, index)),
            );
            ItemFailure {
                index,
                target: record.id(),
                error,
            }
        })
    }

    fn fire(&self, mutation: Mutation) {
        let backend = Arc::clone(&self.backend);
        let notifier = self.notifier.clone();
        tracing::debug!("[Executor] Firing {}", mutation);
        tokio::spawn(async move {
            if let Err(error) = backend.apply(&mutation).await {
                tracing::warn!("[Executor] {} failed: {}", mutation, error);
                notifier.notify(Notice::error(error.to_string()).with_context(mutation.to_string()));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use modcon_core::collection::{CollectionDescriptor, default_registry};
    use modcon_core::permission::{PermissionSet, StaticPermissions, capability};
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Default)]
    struct MockBackend {
        calls: Mutex<Vec<Instant>>,
    }

    #[async_trait]
    impl ModerationBackend for MockBackend {
        async fn apply(&self, _mutation: &Mutation) -> Result<()> {
            self.calls.lock().unwrap().push(Instant::now());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingRefresher {
        calls: Mutex<Vec<Instant>>,
    }

    #[async_trait]
    impl Refresher for CountingRefresher {
        async fn refresh(&self, _keys: &[FetchKey]) -> bool {
            self.calls.lock().unwrap().push(Instant::now());
            true
        }
    }

    fn collection(id: &str) -> &'static CollectionDescriptor {
        default_registry().get(&CollectionId::from(id)).unwrap()
    }

    fn targets(indexes: &[usize]) -> Vec<(usize, Record)> {
        indexes
            .iter()
            .map(|&i| (i, Record::from_value(json!({"id": format!("t{i}")})).unwrap()))
            .collect()
    }

    fn executor(backend: Arc<MockBackend>, permissions: PermissionSet) -> ActionExecutor {
        ActionExecutor::new(
            backend,
            Arc::new(StaticPermissions(permissions)),
            Duration::from_millis(1500),
            Notifier::disabled(),
        )
    }

    #[test]
    fn test_prepare_requires_reason_and_sorts_targets() {
        let executor = executor(
            Arc::new(MockBackend::default()),
            PermissionSet::new().grant(capability::APPROVE_BOTS),
        );
        let bots = collection("bots.waiting");
        let deny = bots.action("Deny").unwrap();

        let err = executor
            .prepare(&bots.id, deny, targets(&[2, 0]), Some("  ".into()))
            .unwrap_err();
        assert!(matches!(err, ModconError::ReasonRequired(_)));

        let batch = executor
            .prepare(&bots.id, deny, targets(&[2, 0]), Some("offline".into()))
            .unwrap();
        assert_eq!(batch.target_indexes(), vec![0, 2]);
        assert_eq!(batch.reason(), Some("offline"));
    }

    #[test]
    fn test_prepare_rejects_navigation_and_missing_permission() {
        let executor = executor(Arc::new(MockBackend::default()), PermissionSet::new());
        let links = collection("links");

        let visit = links.action("Visit").unwrap();
        assert!(executor.prepare(&links.id, visit, targets(&[0]), None).is_err());

        let delete = links.action("Delete").unwrap();
        let err = executor
            .prepare(&links.id, delete, targets(&[0]), None)
            .unwrap_err();
        assert!(matches!(err, ModconError::ActionUnavailable { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_target_waits_before_refresh() {
        let backend = Arc::new(MockBackend::default());
        let executor = executor(
            backend.clone(),
            PermissionSet::new().grant(capability::DELETE_LINKS),
        );
        let links = collection("links");
        let batch = executor
            .prepare(&links.id, links.action("Delete").unwrap(), targets(&[3]), None)
            .unwrap();

        let refresher = CountingRefresher::default();
        let report = executor.run(batch, &refresher).await;

        let applied = backend.calls.lock().unwrap()[0];
        let refreshed = refresher.calls.lock().unwrap().clone();
        assert_eq!(refreshed.len(), 1);
        assert_eq!(refreshed[0] - applied, executor.pacing());
        assert_eq!(report.dispatched, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_multi_target_refreshes_after_last_dispatch() {
        let backend = Arc::new(MockBackend::default());
        let executor = executor(
            backend.clone(),
            PermissionSet::new().grant(capability::DELETE_LINKS),
        );
        let links = collection("links");
        let batch = executor
            .prepare(&links.id, links.action("Delete").unwrap(), targets(&[0, 1, 2]), None)
            .unwrap();

        let refresher = CountingRefresher::default();
        let start = Instant::now();
        executor.run(batch, &refresher).await;

        let calls = backend.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2] - start, executor.pacing() * 2);
        assert_eq!(refresher.calls.lock().unwrap()[0], calls[2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbuildable_item_does_not_consume_an_interval() {
        let backend = Arc::new(MockBackend::default());
        let executor = executor(
            backend.clone(),
            PermissionSet::new().grant(capability::DELETE_LINKS),
        );
        let links = collection("links");
        let mut items = targets(&[0, 2]);
        items.insert(1, (1, Record::from_value(json!({"redirectTo": "x"})).unwrap()));
        let batch = executor
            .prepare(&links.id, links.action("Delete").unwrap(), items, None)
            .unwrap();

        let refresher = CountingRefresher::default();
        let start = Instant::now();
        let report = executor.run(batch, &refresher).await;

        let calls = backend.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1] - calls[0], executor.pacing());
        assert_eq!(refresher.calls.lock().unwrap()[0] - start, executor.pacing());
        assert_eq!(report.dispatched, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
    }
}
