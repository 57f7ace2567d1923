use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use modcon_application::{ModerationConsole, PendingView, TriggerOutcome};
use modcon_core::action::{ModerationBackend, Mutation, Parent, ParentKind, Resource};
use modcon_core::collection::{
    CollectionId, DashboardData, DashboardSource, FetchKey, Record, default_registry,
};
use modcon_core::config::ConsoleConfig;
use modcon_core::error::{ModconError, Result};
use modcon_core::notification::{Notice, Notifier};
use modcon_core::permission::{PermissionSet, capability};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

const PACING: Duration = Duration::from_millis(1500);

#[derive(Default)]
struct RecordingBackend {
    calls: Mutex<Vec<(Mutation, Instant)>>,
    failing: Vec<String>,
    latency: Duration,
}

impl RecordingBackend {
    fn calls(&self) -> Vec<(Mutation, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModerationBackend for RecordingBackend {
    async fn apply(&self, mutation: &Mutation) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((mutation.clone(), Instant::now()));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.iter().any(|id| id == mutation.target_id()) {
            return Err(ModconError::http(500, "Internal Server Error"));
        }
        Ok(())
    }
}

struct FakeDashboard {
    datasets: Mutex<HashMap<FetchKey, Vec<Record>>>,
    permissions: Mutex<PermissionSet>,
    fetches: Mutex<Vec<(Vec<FetchKey>, Instant)>>,
}

impl FakeDashboard {
    fn new(permissions: PermissionSet) -> Self {
        Self {
            datasets: Mutex::new(HashMap::new()),
            permissions: Mutex::new(permissions),
            fetches: Mutex::new(Vec::new()),
        }
    }

    fn with(self, key: FetchKey, records: Vec<Record>) -> Self {
        self.datasets.lock().unwrap().insert(key, records);
        self
    }

    fn replace(&self, key: FetchKey, records: Vec<Record>) {
        self.datasets.lock().unwrap().insert(key, records);
    }

    fn fetch_times(&self) -> Vec<Instant> {
        self.fetches.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl DashboardSource for FakeDashboard {
    async fn fetch(&self, keys: &[FetchKey]) -> Result<DashboardData> {
        self.fetches
            .lock()
            .unwrap()
            .push((keys.to_vec(), Instant::now()));
        let datasets = self.datasets.lock().unwrap();
        Ok(DashboardData {
            datasets: keys
                .iter()
                .map(|k| (*k, datasets.get(k).cloned().unwrap_or_default()))
                .collect(),
            permissions: Some(self.permissions.lock().unwrap().clone()),
        })
    }
}

fn all_permissions() -> PermissionSet {
    PermissionSet::new()
        .grant(capability::APPROVE_BOTS)
        .grant(capability::APPROVE_REVIEWS)
        .grant(capability::DELETE_LINKS)
        .grant(capability::DELETE_BLOCKED_IPS)
}

fn records(prefix: &str, n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            Record::from_value(json!({
                "id": format!("{prefix}{i}"),
                "redirectTo": format!("https://example.com/{i}"),
            }))
            .unwrap()
        })
        .collect()
}

struct Harness {
    console: Arc<ModerationConsole>,
    backend: Arc<RecordingBackend>,
    dashboard: Arc<FakeDashboard>,
    notices: UnboundedReceiver<Notice>,
}

impl Harness {
    async fn open(backend: RecordingBackend, dashboard: FakeDashboard, collection: &str) -> Self {
        let backend = Arc::new(backend);
        let dashboard = Arc::new(dashboard);
        let (notifier, notices) = Notifier::channel();
        let console = Arc::new(ModerationConsole::new(
            Arc::new(default_registry().clone()),
            backend.clone(),
            dashboard.clone(),
            &ConsoleConfig::default(),
            notifier,
        ));
        console
            .switch_collection(&CollectionId::from(collection))
            .await
            .unwrap();
        Self {
            console,
            backend,
            dashboard,
            notices,
        }
    }

    fn drain_notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            notices.push(notice);
        }
        notices
    }
}

fn completed(outcome: TriggerOutcome) -> modcon_application::BatchReport {
    match outcome {
        TriggerOutcome::Completed(report) => report,
        other => panic!("expected a completed batch, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn approve_two_bots_is_paced_and_refreshed_once() {
    let dashboard = FakeDashboard::new(all_permissions()).with(FetchKey::Bots, records("b", 3));
    let h = Harness::open(RecordingBackend::default(), dashboard, "bots.waiting").await;

    h.console.select([0, 2]).unwrap();
    let report = completed(h.console.trigger("Approve", None).await.unwrap());

    let calls = h.backend.calls();
    let targets: Vec<&str> = calls.iter().map(|(m, _)| m.target_id()).collect();
    assert_eq!(targets, vec!["b0", "b2"]);
    assert!(matches!(calls[0].0, Mutation::Approve { resource: Resource::Bot, .. }));
    assert_eq!(calls[1].1 - calls[0].1, PACING);

    // One fetch on switch, one after the batch.
    let fetches = h.dashboard.fetch_times();
    assert_eq!(fetches.len(), 2);
    assert!(fetches[1] >= calls[1].1);

    assert_eq!(report.dispatched, 2);
    assert!(report.refreshed);
    assert!(h.console.selected().is_empty());
    assert!(!h.console.is_loading());
}

#[tokio::test(start_paused = true)]
async fn batch_of_n_waits_n_minus_one_intervals() {
    let dashboard = FakeDashboard::new(all_permissions()).with(FetchKey::BlockedIps, records("ip", 4));
    let h = Harness::open(RecordingBackend::default(), dashboard, "blocked_ips").await;

    h.console.select(0..4).unwrap();
    let start = Instant::now();
    completed(h.console.trigger("Delete", None).await.unwrap());

    let calls = h.backend.calls();
    assert_eq!(calls.len(), 4);
    for pair in calls.windows(2) {
        assert_eq!(pair[1].1 - pair[0].1, PACING);
    }
    assert_eq!(*h.dashboard.fetch_times().last().unwrap() - start, PACING * 3);
}

#[tokio::test(start_paused = true)]
async fn free_text_deny_on_single_review() {
    let reviews = vec![
        Record::from_value(json!({"_id": "r0", "bot": {"id": "b7"}})).unwrap(),
        Record::from_value(json!({"_id": "r1", "server": {"id": "s9"}})).unwrap(),
    ];
    let dashboard = FakeDashboard::new(all_permissions()).with(FetchKey::Reviews, reviews);
    let h = Harness::open(RecordingBackend::default(), dashboard, "reviews.waiting").await;

    h.console.select([1]).unwrap();
    let outcome = h.console.trigger("Deny", None).await.unwrap();
    let TriggerOutcome::ReasonRequired(prompt) = outcome else {
        panic!("expected a reason prompt");
    };
    assert!(prompt.catalog.is_none());
    assert!(h.backend.calls().is_empty());

    let report = completed(h.console.submit_reason("Spam").await.unwrap());
    assert!(report.failures.is_empty());

    let calls = h.backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.reason(), Some("Spam"));
    assert_eq!(calls[0].0.target_id(), "r1");
    assert_eq!(calls[0].0.parent(), Some(&Parent::new(ParentKind::Server, "s9")));

    // Single target: the effect completes, one interval passes, then the refresh.
    let refresh = *h.dashboard.fetch_times().last().unwrap();
    assert_eq!(refresh - calls[0].1, PACING);
}

#[tokio::test(start_paused = true)]
async fn catalog_deny_retries_after_invalid_reason() {
    let dashboard = FakeDashboard::new(all_permissions()).with(FetchKey::Bots, records("b", 2));
    let h = Harness::open(RecordingBackend::default(), dashboard, "bots.waiting").await;

    h.console.select([0, 1]).unwrap();
    assert!(matches!(
        h.console.trigger("Deny", None).await.unwrap(),
        TriggerOutcome::ReasonRequired(_)
    ));

    let err = h.console.submit_reason("not a reason").await.unwrap_err();
    assert!(matches!(err, ModconError::InvalidReason(_)));
    assert!(matches!(
        h.console.snapshot().pending,
        Some(PendingView::Reason { action: "Deny", .. })
    ));

    completed(h.console.submit_reason("Offline").await.unwrap());
    let calls = h.backend.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(m, _)| m.reason() == Some("offline")));
}

#[tokio::test(start_paused = true)]
async fn declined_delete_changes_nothing() {
    let dashboard = FakeDashboard::new(all_permissions()).with(FetchKey::Links, records("l", 4));
    let h = Harness::open(RecordingBackend::default(), dashboard, "links").await;

    h.console.select(0..4).unwrap();
    let outcome = h.console.trigger("Delete", None).await.unwrap();
    let TriggerOutcome::ConfirmationRequired(prompt) = outcome else {
        panic!("expected a confirmation prompt");
    };
    assert_eq!(
        prompt.message,
        "You are about to delete 4 links. This action is irreversible."
    );

    assert!(h.console.cancel());
    assert!(h.backend.calls().is_empty());
    assert_eq!(h.dashboard.fetch_times().len(), 1);
    assert_eq!(h.console.selected(), vec![0, 1, 2, 3]);
    assert!(h.console.snapshot().pending.is_none());
}

#[tokio::test(start_paused = true)]
async fn confirmed_delete_dispatches() {
    let dashboard = FakeDashboard::new(all_permissions()).with(FetchKey::Links, records("l", 3));
    let h = Harness::open(RecordingBackend::default(), dashboard, "links").await;

    h.console.select([1, 2]).unwrap();
    h.console.trigger("delete", None).await.unwrap();
    h.dashboard.replace(FetchKey::Links, records("l", 1));

    let report = completed(h.console.confirm().await.unwrap());
    assert_eq!(report.dispatched, 2);
    assert_eq!(h.console.snapshot().records.len(), 1);
    assert!(h.console.selected().is_empty());

    assert!(matches!(
        h.console.confirm().await,
        Err(ModconError::NoPendingAction)
    ));
}

#[tokio::test(start_paused = true)]
async fn multi_target_failures_arrive_as_notices() {
    let backend = RecordingBackend {
        failing: vec!["b1".to_string()],
        ..Default::default()
    };
    let dashboard = FakeDashboard::new(all_permissions()).with(FetchKey::Bots, records("b", 3));
    let mut h = Harness::open(backend, dashboard, "bots.waiting").await;

    h.console.select(0..3).unwrap();
    let report = completed(h.console.trigger("Approve", None).await.unwrap());

    assert_eq!(report.dispatched, 3);
    assert!(report.failures.is_empty());
    assert_eq!(h.backend.calls().len(), 3);

    tokio::time::sleep(Duration::from_millis(1)).await;
    let notices = h.drain_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].context.as_deref().unwrap().contains("b1"));
}

#[tokio::test(start_paused = true)]
async fn single_target_failure_is_reported() {
    let backend = RecordingBackend {
        failing: vec!["b0".to_string()],
        ..Default::default()
    };
    let dashboard = FakeDashboard::new(all_permissions()).with(FetchKey::Bots, records("b", 1));
    let mut h = Harness::open(backend, dashboard, "bots.waiting").await;

    h.console.select([0]).unwrap();
    let report = completed(h.console.trigger("Approve", None).await.unwrap());

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].target.as_deref(), Some("b0"));
    assert!(report.refreshed);
    assert_eq!(h.drain_notices().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn trigger_while_loading_is_busy() {
    let backend = RecordingBackend {
        latency: Duration::from_secs(10),
        ..Default::default()
    };
    let dashboard = FakeDashboard::new(all_permissions()).with(FetchKey::Bots, records("b", 2));
    let h = Harness::open(backend, dashboard, "bots.waiting").await;

    h.console.select([0]).unwrap();
    let console = h.console.clone();
    let running = tokio::spawn(async move { console.trigger("Approve", None).await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(h.console.is_loading());
    assert!(h.console.snapshot().loading);
    assert!(matches!(
        h.console.trigger("Approve", None).await,
        Err(ModconError::Busy)
    ));

    completed(running.await.unwrap().unwrap());
    assert!(!h.console.is_loading());
    assert_eq!(h.backend.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_permission_hides_action() {
    let dashboard = FakeDashboard::new(PermissionSet::new()).with(FetchKey::Bots, records("b", 2));
    let h = Harness::open(RecordingBackend::default(), dashboard, "bots.waiting").await;

    h.console.select([0]).unwrap();
    let names: Vec<&str> = h.console.visible_actions().iter().map(|a| a.name).collect();
    assert_eq!(names, vec!["View"]);

    let err = h.console.trigger("Approve", None).await.unwrap_err();
    assert!(matches!(err, ModconError::ActionUnavailable { .. }));
    assert!(h.backend.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn view_navigates_and_clears_selection() {
    let dashboard = FakeDashboard::new(all_permissions()).with(FetchKey::Links, records("l", 2));
    let h = Harness::open(RecordingBackend::default(), dashboard, "links").await;

    h.console.select([0, 1]).unwrap();
    let names: Vec<&str> = h.console.visible_actions().iter().map(|a| a.name).collect();
    assert_eq!(names, vec!["Delete"]);

    h.console.select([1]).unwrap();
    let outcome = h.console.trigger("Visit", None).await.unwrap();
    assert!(matches!(outcome, TriggerOutcome::Navigate(url) if url == "https://example.com/1"));
    assert!(h.console.selected().is_empty());
    assert!(h.backend.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shrinking_refresh_and_switch_clear_selection() {
    let dashboard = FakeDashboard::new(all_permissions())
        .with(FetchKey::Links, records("l", 10))
        .with(FetchKey::BlockedIps, records("ip", 2));
    let h = Harness::open(RecordingBackend::default(), dashboard, "links").await;

    h.console.select([1, 3, 5, 7, 9]).unwrap();
    h.dashboard.replace(FetchKey::Links, records("l", 3));
    assert!(h.console.refresh(&[FetchKey::Links]).await);
    assert!(h.console.selected().is_empty());
    assert!(h.console.select([5]).is_err());

    h.console.select([0, 2]).unwrap();
    h.console
        .switch_collection(&CollectionId::from("blocked_ips"))
        .await
        .unwrap();
    assert!(h.console.selected().is_empty());
    assert_eq!(h.console.snapshot().title, Some("Blocked IPs"));
}

#[tokio::test(start_paused = true)]
async fn refresh_replacing_records_drops_parked_confirmation() {
    let dashboard = FakeDashboard::new(all_permissions()).with(FetchKey::Links, records("l", 6));
    let h = Harness::open(RecordingBackend::default(), dashboard, "links").await;

    h.console.select([0, 1, 2, 3]).unwrap();
    let outcome = h.console.trigger("Delete", None).await.unwrap();
    assert!(matches!(outcome, TriggerOutcome::ConfirmationRequired(_)));
    assert!(h.console.snapshot().pending.is_some());

    h.dashboard.replace(FetchKey::Links, records("l", 2));
    assert!(h.console.refresh(&[FetchKey::Links]).await);

    assert!(h.console.selected().is_empty());
    assert!(h.console.snapshot().pending.is_none());
    assert!(matches!(h.console.confirm().await, Err(ModconError::NoPendingAction)));
    assert!(h.backend.calls().is_empty());
}
