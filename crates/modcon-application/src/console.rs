//! Moderation console use case.
//!
//! Wires the selection store, reason capture, confirmation gate, executor and
//! refresh coordinator into the per-batch state machine:
//!
//! ```text
//! idle -> (reason capture) -> (confirmation) -> dispatching -> refreshing -> idle
//! ```
//!
//! Reason capture and confirmation are skipped when the action does not need
//! them. Once dispatching starts the batch always runs to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use modcon_core::action::{ActionDescriptor, ActionSummary, Effect, ModerationBackend};
use modcon_core::collection::{
    CollectionDescriptor, CollectionId, CollectionRegistry, DashboardSource, FetchKey, Record,
};
use modcon_core::config::ConsoleConfig;
use modcon_core::error::{ModconError, Result};
use modcon_core::notification::Notifier;
use modcon_core::permission::PermissionProvider;
use modcon_core::selection::SelectionStore;
use serde::Serialize;

use crate::confirmation::{ConfirmationGate, ConfirmationPrompt};
use crate::executor::{ActionExecutor, BatchReport};
use crate::reason::{ReasonCapture, ReasonPrompt};
use crate::refresh::DataRefreshCoordinator;

/// Result of triggering (or advancing) an action.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// A view action resolved to a route or URL.
    Navigate(String),
    /// Waiting for [`ModerationConsole::submit_reason`].
    ReasonRequired(ReasonPrompt),
    /// Waiting for [`ModerationConsole::confirm`] or [`ModerationConsole::cancel`].
    ConfirmationRequired(ConfirmationPrompt),
    /// The batch ran and the dataset was refreshed.
    Completed(BatchReport),
}

/// An action parked in reason capture or confirmation.
#[derive(Debug, Clone)]
struct PendingAction {
    collection: CollectionId,
    action: &'static str,
    stage: PendingStage,
}

#[derive(Debug, Clone)]
enum PendingStage {
    AwaitingReason(ReasonPrompt),
    AwaitingConfirmation {
        prompt: ConfirmationPrompt,
        reason: Option<String>,
    },
}

/// Presentation view of a pending action.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PendingView {
    Reason { action: &'static str, prompt: ReasonPrompt },
    Confirmation { action: &'static str, prompt: ConfirmationPrompt },
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleSnapshot {
    pub active: Option<CollectionId>,
    pub title: Option<&'static str>,
    pub records: Vec<Record>,
    pub selected: Vec<usize>,
    pub loading: bool,
    pub actions: Vec<ActionSummary>,
    pub pending: Option<PendingView>,
}

/// Clears the loading flag when the batch ends, however it ends.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ModconError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ModerationConsole {
    registry: Arc<CollectionRegistry>,
    selection: Arc<Mutex<SelectionStore>>,
    refresher: Arc<DataRefreshCoordinator>,
    executor: ActionExecutor,
    reasons: ReasonCapture,
    gate: ConfirmationGate,
    pending: Mutex<Option<PendingAction>>,
    loading: AtomicBool,
}

impl ModerationConsole {
    /// Creates a console over `registry`.
    ///
    /// # Arguments
    ///
    /// * `backend` - Mutation effect interface used by the executor
    /// * `source` - Fetch interface used by the refresh coordinator
    /// * `config` - Pacing interval and deny reason catalogs
    /// * `notifier` - Channel for transient operator notices
    pub fn new(
        registry: Arc<CollectionRegistry>,
        backend: Arc<dyn ModerationBackend>,
        source: Arc<dyn DashboardSource>,
        config: &ConsoleConfig,
        notifier: Notifier,
    ) -> Self {
        let selection = Arc::new(Mutex::new(SelectionStore::new()));
        let refresher = Arc::new(DataRefreshCoordinator::new(
            source,
            registry.clone(),
            selection.clone(),
            notifier.clone(),
        ));
        let permissions: Arc<dyn PermissionProvider> = refresher.clone();
        let executor = ActionExecutor::new(
            backend,
            permissions,
            config.dashboard.pacing_interval(),
            notifier,
        );

        Self {
            registry,
            selection,
            refresher,
            executor,
            reasons: ReasonCapture::new(config.deny_reasons.clone()),
            gate: ConfirmationGate::new(),
            pending: Mutex::new(None),
            loading: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    // ============================================================================
    // Selection
    // ============================================================================

    /// Activates a collection, clears the selection and fetches its dataset.
    ///
    /// Allowed while a batch is running: the batch already holds its targets.
    pub async fn switch_collection(&self, id: &CollectionId) -> Result<()> {
        let collection = self.registry.require(id)?;
        let count = self.refresher.records(collection).len();
        self.lock_selection().set_active_collection(id.clone(), count);
        self.lock_pending().take();
        tracing::info!("[Console] Active collection: {}", id);

        self.refresher.refresh_keys(&[collection.fetch_key]).await;
        Ok(())
    }

    /// Replaces the selection. A parked action is dropped since its prompt no
    /// longer matches what is selected.
    pub fn select(&self, indexes: impl IntoIterator<Item = usize>) -> Result<()> {
        self.lock_selection().select(indexes)?;
        self.lock_pending().take();
        Ok(())
    }

    pub fn clear_selection(&self) {
        self.lock_selection().clear();
    }

    pub fn selected(&self) -> Vec<usize> {
        self.lock_selection().selected()
    }

    /// Re-fetches datasets on operator request.
    ///
    /// Replacing the active dataset clears the selection, which also drops a
    /// parked action: its prompt described records that are gone.
    pub async fn refresh(&self, keys: &[FetchKey]) -> bool {
        let refreshed = self.refresher.refresh_keys(keys).await;
        let cleared = self.lock_selection().is_empty();
        if cleared {
            if let Some(pending) = self.lock_pending().take() {
                tracing::info!("[Console] Dropped {}: its records were replaced", pending.action);
            }
        }
        refreshed
    }

    // ============================================================================
    // Presentation
    // ============================================================================

    /// Actions visible for the current permissions and selection. Recomputed on
    /// every call.
    pub fn visible_actions(&self) -> Vec<ActionSummary> {
        let Ok((collection, records, selected)) = self.active_view() else {
            return Vec::new();
        };
        let permissions = self.refresher.current();
        let targets: Vec<&Record> = selected.iter().map(|&i| &records[i]).collect();
        collection
            .actions
            .iter()
            .filter(|a| a.visibility.is_visible(&permissions, &targets))
            .map(ActionDescriptor::summary)
            .collect()
    }

    pub fn snapshot(&self) -> ConsoleSnapshot {
        let view = self.active_view().ok();
        let pending = self.lock_pending().as_ref().map(|p| match &p.stage {
            PendingStage::AwaitingReason(prompt) => PendingView::Reason {
                action: p.action,
                prompt: prompt.clone(),
            },
            PendingStage::AwaitingConfirmation { prompt, .. } => PendingView::Confirmation {
                action: p.action,
                prompt: prompt.clone(),
            },
        });

        ConsoleSnapshot {
            active: view.as_ref().map(|(c, _, _)| c.id.clone()),
            title: view.as_ref().map(|(c, _, _)| c.title),
            actions: self.visible_actions(),
            selected: view.as_ref().map(|(_, _, s)| s.clone()).unwrap_or_default(),
            records: view.map(|(_, r, _)| r).unwrap_or_default(),
            loading: self.is_loading(),
            pending,
        }
    }

    // ============================================================================
    // Actions
    // ============================================================================

    /// Triggers `action` on the current selection.
    ///
    /// A reason may be supplied up front; otherwise reason-required actions
    /// park in reason capture.
    pub async fn trigger(&self, action: &str, reason: Option<&str>) -> Result<TriggerOutcome> {
        if self.is_loading() {
            return Err(ModconError::Busy);
        }
        let (collection, records, selected) = self.active_view()?;
        let descriptor = collection
            .action(action)
            .ok_or_else(|| ModconError::not_found("action", action))?;

        let targets: Vec<&Record> = selected.iter().map(|&i| &records[i]).collect();
        descriptor
            .visibility
            .check(&self.refresher.current(), &targets)
            .map_err(|why| ModconError::unavailable(descriptor.name, why))?;

        if let Effect::Navigate(navigate) = descriptor.effect {
            let record = targets
                .first()
                .ok_or_else(|| ModconError::InvalidSelection("nothing selected".into()))?;
            let target = navigate(record)?;
            self.clear_selection();
            tracing::info!("[Console] {} -> {}", descriptor.name, target);
            return Ok(TriggerOutcome::Navigate(target));
        }

        self.lock_pending().take();
        let reason = match reason {
            Some(input) => self.reasons.capture(descriptor, input)?,
            None => match self.reasons.prompt(descriptor)? {
                Some(prompt) => {
                    self.park(collection, descriptor, PendingStage::AwaitingReason(prompt.clone()));
                    return Ok(TriggerOutcome::ReasonRequired(prompt));
                }
                None => None,
            },
        };

        self.advance(collection, descriptor, reason, selected.len()).await
    }

    /// Supplies the reason for the action parked in reason capture.
    ///
    /// An invalid reason keeps the action parked so the operator can retry.
    pub async fn submit_reason(&self, input: &str) -> Result<TriggerOutcome> {
        if self.is_loading() {
            return Err(ModconError::Busy);
        }
        let pending = self.lock_pending().clone().ok_or(ModconError::NoPendingAction)?;
        if !matches!(pending.stage, PendingStage::AwaitingReason(_)) {
            return Err(ModconError::NoPendingAction);
        }

        let (collection, _, selected) = self.active_view()?;
        let descriptor = self.pending_descriptor(collection, &pending)?;
        let reason = self.reasons.capture(descriptor, input)?;
        self.lock_pending().take();

        self.advance(collection, descriptor, reason, selected.len()).await
    }

    /// Affirms the pending confirmation and dispatches the batch.
    pub async fn confirm(&self) -> Result<TriggerOutcome> {
        if self.is_loading() {
            return Err(ModconError::Busy);
        }
        let pending = {
            let mut slot = self.lock_pending();
            let awaiting = matches!(
                slot.as_ref().map(|p| &p.stage),
                Some(PendingStage::AwaitingConfirmation { .. })
            );
            if awaiting { slot.take() } else { None }
        };
        let pending = pending.ok_or(ModconError::NoPendingAction)?;

        let (collection, _, _) = self.active_view()?;
        let descriptor = self.pending_descriptor(collection, &pending)?;
        let PendingStage::AwaitingConfirmation { reason, .. } = pending.stage else {
            return Err(ModconError::NoPendingAction);
        };
        self.dispatch(collection, descriptor, reason).await
    }

    /// Drops the parked action. Nothing else changes, the selection included.
    pub fn cancel(&self) -> bool {
        let cancelled = self.lock_pending().take();
        if let Some(pending) = &cancelled {
            tracing::info!("[Console] Cancelled {}", pending.action);
        }
        cancelled.is_some()
    }

    async fn advance(
        &self,
        collection: &CollectionDescriptor,
        descriptor: &ActionDescriptor,
        reason: Option<String>,
        count: usize,
    ) -> Result<TriggerOutcome> {
        if self.gate.requires(descriptor) {
            let prompt = self.gate.prompt(descriptor, count);
            self.park(
                collection,
                descriptor,
                PendingStage::AwaitingConfirmation {
                    prompt: prompt.clone(),
                    reason,
                },
            );
            return Ok(TriggerOutcome::ConfirmationRequired(prompt));
        }
        self.dispatch(collection, descriptor, reason).await
    }

    async fn dispatch(
        &self,
        collection: &CollectionDescriptor,
        descriptor: &ActionDescriptor,
        reason: Option<String>,
    ) -> Result<TriggerOutcome> {
        let _loading = LoadingGuard::acquire(&self.loading)?;

        let batch = {
            let mut selection = self.lock_selection();
            let records = self.refresher.records(collection);
            let targets = selection
                .selected()
                .into_iter()
                .filter_map(|i| records.get(i).cloned().map(|r| (i, r)))
                .collect();
            let batch = self
                .executor
                .prepare(&collection.id, descriptor, targets, reason)?;
            // Cleared at dispatch so no stale checkmarks sit next to changing rows.
            selection.clear();
            batch
        };

        let report = self.executor.run(batch, self.refresher.as_ref()).await;
        Ok(TriggerOutcome::Completed(report))
    }

    // ============================================================================
    // Helpers
    // ============================================================================

    fn active_view(&self) -> Result<(&CollectionDescriptor, Vec<Record>, Vec<usize>)> {
        let (active, selected) = {
            let selection = self.lock_selection();
            let active = selection
                .active()
                .cloned()
                .ok_or_else(|| ModconError::InvalidSelection("no active collection".into()))?;
            (active, selection.selected())
        };
        let collection = self.registry.require(&active)?;
        let records = self.refresher.records(collection);
        if selected.iter().any(|&i| i >= records.len()) {
            // Records were replaced between the two reads; the store is cleared
            // by the coordinator, so report an empty selection.
            return Ok((collection, records, Vec::new()));
        }
        Ok((collection, records, selected))
    }

    fn pending_descriptor<'a>(
        &self,
        collection: &'a CollectionDescriptor,
        pending: &PendingAction,
    ) -> Result<&'a ActionDescriptor> {
        if collection.id != pending.collection {
            return Err(ModconError::NoPendingAction);
        }
        collection
            .action(pending.action)
            .ok_or_else(|| ModconError::not_found("action", pending.action))
    }

    fn park(&self, collection: &CollectionDescriptor, descriptor: &ActionDescriptor, stage: PendingStage) {
        tracing::debug!("[Console] {} waiting: {:?}", descriptor.name, stage);
        *self.lock_pending() = Some(PendingAction {
            collection: collection.id.clone(),
            action: descriptor.name,
            stage,
        });
    }

    fn lock_selection(&self) -> MutexGuard<'_, SelectionStore> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<PendingAction>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
