// ── Dashboard coordinator ──
//
// Owns the session: the monitor client, the snapshot cache, the row state
// and the background poll tasks. Publishes row views through a watch
// channel and user-facing notifications through a broadcast channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use dockmon_api::transport::{TlsMode, TransportConfig};
use dockmon_api::{MonitorClient, PruneReport, UpdateOutcome};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CachedSnapshot, FileSnapshotCache, MemorySnapshotCache, SnapshotCache};
use crate::config::{DashboardConfig, TlsVerification};
use crate::error::CoreError;
use crate::i18n::{Language, t};
use crate::lazy::run_in_batches;
use crate::model::{Notification, RowView};
use crate::scheduler::{
    BusyGuard, PollOutcome, PollRequest, Trigger, deferred_fill_task, poll_task, trigger_task,
    unused_task,
};
use crate::settings::{SettingsInput, generate_request};
use crate::state::{AuthState, DashboardState};
use crate::visibility::{AlwaysVisible, VisibilitySignal, VisibilityTracker, VisibleSet};

const TRIGGER_CHANNEL_SIZE: usize = 32;
const NOTIFICATION_CHANNEL_SIZE: usize = 64;

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// ── Dashboard ────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<DashboardInner>`. Call
/// [`start()`](Self::start) to run the startup sequence and spawn the
/// poll loops, [`dispose()`](Self::dispose) to stop them.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    client: MonitorClient,
    cache: Arc<dyn SnapshotCache>,
    tracker: Arc<dyn VisibilityTracker>,
    visible: Arc<VisibleSet>,
    state: Mutex<DashboardState>,
    language: RwLock<Language>,
    /// Set while a poll cycle runs.
    polling: AtomicBool,
    /// Set while a prune request runs.
    pruning: AtomicBool,
    /// Set while a lazy metrics pass runs.
    filling: AtomicBool,
    rows_tx: watch::Sender<Arc<Vec<RowView>>>,
    unused_tx: watch::Sender<Option<u64>>,
    notify_tx: broadcast::Sender<Notification>,
    trigger_tx: mpsc::Sender<Trigger>,
    trigger_rx: Mutex<Option<mpsc::Receiver<Trigger>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Dashboard {
    /// Build a dashboard from configuration. Does not touch the network.
    ///
    /// The snapshot cache lives on disk when `cache_path` is set and in
    /// memory otherwise; every row counts as visible.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let tls = match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        let transport = TransportConfig {
            tls,
            timeout: config.timeout,
        };
        let client = MonitorClient::new(config.url.clone(), None, &transport)?;
        let cache: Arc<dyn SnapshotCache> = match &config.cache_path {
            Some(path) => Arc::new(FileSnapshotCache::new(path)),
            None => Arc::new(MemorySnapshotCache::new()),
        };
        Ok(Self::with_components(config, client, cache, Arc::new(AlwaysVisible)))
    }

    /// Build a dashboard from explicit collaborators.
    pub fn with_components(
        config: DashboardConfig,
        client: MonitorClient,
        cache: Arc<dyn SnapshotCache>,
        tracker: Arc<dyn VisibilityTracker>,
    ) -> Self {
        let (rows_tx, _) = watch::channel(Arc::new(Vec::new()));
        let (unused_tx, _) = watch::channel(None);
        let (notify_tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_SIZE);
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_CHANNEL_SIZE);
        let state = DashboardState::create(config.api_key.clone());
        let language = config.language;

        Self {
            inner: Arc::new(DashboardInner {
                config,
                client,
                cache,
                tracker,
                visible: Arc::new(VisibleSet::new()),
                state: Mutex::new(state),
                language: RwLock::new(language),
                polling: AtomicBool::new(false),
                pruning: AtomicBool::new(false),
                filling: AtomicBool::new(false),
                rows_tx,
                unused_tx,
                notify_tx,
                trigger_tx,
                trigger_rx: Mutex::new(Some(trigger_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &MonitorClient {
        &self.inner.client
    }

    /// Names of rows currently on screen.
    pub fn visible(&self) -> &Arc<VisibleSet> {
        &self.inner.visible
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Run the startup sequence and spawn the background tasks.
    ///
    /// Settings first (so the key is attached when auth is on), then the
    /// unused count, the cached snapshot as pending, one forced poll with
    /// loading placeholders, and finally the poll loops. Only a second
    /// call fails; every fetch in the sequence is best effort.
    pub async fn start(&self) -> Result<(), CoreError> {
        let Some(trigger_rx) = self.inner.trigger_rx.lock().await.take() else {
            return Err(CoreError::Internal("dashboard already started".into()));
        };

        if let Err(e) = self.load_settings().await {
            warn!(error = %e, "settings unavailable, continuing without credentials");
        }
        self.refresh_unused().await;
        self.show_cached().await;
        let outcome = self.poll(PollRequest::INITIAL).await;
        debug!(?outcome, "initial poll");

        let config = &self.inner.config;
        let cancel = self.inner.cancel.clone();
        let mut handles = self.inner.task_handles.lock().await;

        handles.push(tokio::spawn(deferred_fill_task(
            self.clone(),
            config.lazy_delay,
            cancel.clone(),
        )));
        handles.push(tokio::spawn(trigger_task(
            self.clone(),
            trigger_rx,
            cancel.clone(),
        )));
        for (period, request) in [
            (config.fast_interval, PollRequest::FAST),
            (config.slow_interval, PollRequest::SLOW),
        ] {
            if !period.is_zero() {
                handles.push(tokio::spawn(poll_task(
                    self.clone(),
                    period,
                    request,
                    cancel.clone(),
                )));
            }
        }
        if !config.unused_interval.is_zero() {
            handles.push(tokio::spawn(unused_task(
                self.clone(),
                config.unused_interval,
                cancel,
            )));
        }

        info!(url = %config.url, rows = self.rows_snapshot().len(), "dashboard started");
        Ok(())
    }

    /// Stop every background task and drop all per-session state.
    pub async fn dispose(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        let mut state = self.inner.state.lock().await;
        for name in state.names() {
            self.inner.tracker.unobserve(&name);
        }
        state.dispose();
        self.inner.visible.clear();
        self.publish(&state);
        debug!("dashboard disposed");
    }

    /// One-shot: load settings, run closure, dispose. No poll loops.
    pub async fn oneshot<F, Fut, T>(config: DashboardConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Dashboard) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let dashboard = Dashboard::new(config)?;
        if let Err(e) = dashboard.load_settings().await {
            debug!(error = %e, "settings unavailable");
        }
        let result = f(dashboard.clone()).await;
        dashboard.dispose().await;
        result
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Run one poll cycle. Never overlaps another cycle: a call made while
    /// one is running returns [`PollOutcome::Skipped`] at once.
    pub async fn poll(&self, request: PollRequest) -> PollOutcome {
        let Some(_guard) = BusyGuard::try_acquire(&self.inner.polling) else {
            debug!("poll skipped: cycle already running");
            return PollOutcome::Skipped;
        };

        if request.show_loading {
            let mut state = self.inner.state.lock().await;
            state.mark_all_pending();
            self.publish(&state);
        }

        match self
            .inner
            .client
            .fetch_status(request.force, request.light)
            .await
        {
            Ok(snapshot) => {
                if let Err(e) = self.inner.cache.store(&CachedSnapshot::now(snapshot.clone())) {
                    warn!(error = %e, "failed to cache snapshot");
                }
                self.apply_snapshot(&snapshot, false).await;
                PollOutcome::Live
            }
            Err(e) => {
                let e = CoreError::from(e);
                warn!(error = %e, "status poll failed");
                if self.show_cached().await {
                    PollOutcome::Cached
                } else {
                    PollOutcome::Unchanged
                }
            }
        }
    }

    /// Poll, then fill metrics for visible rows when live data arrived.
    pub async fn poll_cycle(&self, request: PollRequest) -> PollOutcome {
        let outcome = self.poll(request).await;
        if outcome == PollOutcome::Live {
            tokio::spawn(deferred_fill_task(
                self.clone(),
                Duration::ZERO,
                self.inner.cancel.clone(),
            ));
        }
        outcome
    }

    /// Reconcile the cached snapshot as pending. `false` when there is none.
    pub async fn show_cached(&self) -> bool {
        match self.inner.cache.load() {
            Ok(Some(entry)) => {
                debug!(captured_at = %entry.captured_at, "showing cached snapshot");
                self.apply_snapshot(&entry.snapshot, true).await;
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "snapshot cache unreadable");
                false
            }
        }
    }

    async fn apply_snapshot(&self, snapshot: &dockmon_api::StatusSnapshot, pending: bool) {
        let mut state = self.inner.state.lock().await;
        let outcome = state.reconcile(snapshot, pending, now_ms());
        for name in &outcome.removed {
            self.inner.tracker.unobserve(name);
            self.inner.visible.remove(name);
        }
        for name in &outcome.added {
            self.inner
                .tracker
                .observe(VisibilitySignal::new(name, Arc::clone(&self.inner.visible)));
        }
        self.publish(&state);
    }

    /// Fetch metrics for every visible row, a few at a time. Returns how
    /// many rows were updated.
    ///
    /// Only one pass runs at a time, so at most one batch of requests is
    /// ever in flight. A call made during a pass returns 0 at once.
    pub async fn fill_visible_metrics(&self) -> usize {
        let Some(_guard) = BusyGuard::try_acquire(&self.inner.filling) else {
            debug!("metrics pass skipped: pass already running");
            return 0;
        };

        let names: Vec<String> = {
            let state = self.inner.state.lock().await;
            state
                .names()
                .into_iter()
                .filter(|name| self.inner.visible.contains(name))
                .collect()
        };
        if names.is_empty() {
            return 0;
        }

        let filled = run_in_batches(&names, self.inner.config.metrics_batch_width(), |name| {
            let dashboard = self.clone();
            async move { dashboard.fill_row_metrics(&name).await }
        })
        .await;
        debug!(visible = names.len(), filled, "lazy metrics pass");
        filled
    }

    async fn fill_row_metrics(&self, name: &str) -> bool {
        match self.inner.client.fetch_entity_metrics(name).await {
            Ok(meta) => {
                let mut state = self.inner.state.lock().await;
                let applied = state.apply_metrics(name, &meta, now_ms());
                if applied {
                    self.publish(&state);
                }
                applied
            }
            Err(e) => {
                debug!(name, error = %e, "metrics fetch failed");
                false
            }
        }
    }

    // ── Row actions ──────────────────────────────────────────────

    /// Force-refresh one row's status and metrics.
    pub async fn refresh_entity(&self, name: &str) -> Result<RowView, CoreError> {
        {
            let mut state = self.inner.state.lock().await;
            let row = state
                .rows
                .get_mut(name)
                .ok_or_else(|| CoreError::EntityNotFound { name: name.into() })?;
            if row.refreshing {
                return Err(CoreError::ActionInProgress { action: "refresh" });
            }
            row.refreshing = true;
            row.loading = true;
            self.publish(&state);
        }

        let result = self.inner.client.fetch_entity_status(name, true).await;

        let mut state = self.inner.state.lock().await;
        let outcome = match result {
            Ok(snapshot) => match snapshot.updates.get(name).cloned() {
                Some(status) if state.contains(name) => {
                    let meta = snapshot.meta.get(name).cloned().unwrap_or_default();
                    let metrics = state.render_metrics(name, &meta, now_ms());
                    if let Some(row) = state.rows.get_mut(name) {
                        row.set_status(status);
                        row.set_image(meta.image.as_deref());
                        match metrics {
                            Some(metrics) => row.show_metrics(metrics),
                            None if row.has_metrics() => row.loading = false,
                            None => {}
                        }
                    }
                    Ok(())
                }
                _ => Err(CoreError::EntityNotFound { name: name.into() }),
            },
            Err(e) => Err(CoreError::from(e)),
        };
        if let Some(row) = state.rows.get_mut(name) {
            row.refreshing = false;
        }
        self.publish(&state);
        let view = state.row_view(name);
        drop(state);

        match outcome {
            Ok(()) => view.ok_or_else(|| CoreError::EntityNotFound { name: name.into() }),
            Err(e) => {
                warn!(name, error = %e, "row refresh failed");
                let message = self.tr("refresh_fail", &[("err", &e.to_string())]);
                self.notify(Notification::error(message));
                Err(e)
            }
        }
    }

    /// Ask the monitor to update one container, then re-poll.
    pub async fn update_entity(&self, name: &str) -> Result<UpdateOutcome, CoreError> {
        {
            let mut state = self.inner.state.lock().await;
            let row = state
                .rows
                .get_mut(name)
                .ok_or_else(|| CoreError::EntityNotFound { name: name.into() })?;
            if row.updating {
                return Err(CoreError::ActionInProgress { action: "update" });
            }
            if !row.action_enabled {
                return Err(CoreError::ActionFailed {
                    message: format!("{name}: update unavailable"),
                });
            }
            row.updating = true;
            self.publish(&state);
        }

        let result = self.inner.client.update_container(name).await;

        {
            let mut state = self.inner.state.lock().await;
            if let Some(row) = state.rows.get_mut(name) {
                row.updating = false;
            }
            self.publish(&state);
        }

        match result {
            Ok(response) => {
                let outcome = response.outcome();
                info!(name, ?outcome, "update finished");
                let follow_up = match outcome {
                    UpdateOutcome::AlreadyUpToDate => {
                        self.notify(Notification::success(self.tr("up_to_date", &[("name", name)])));
                        PollRequest::FAST
                    }
                    UpdateOutcome::Updated => {
                        self.notify(Notification::success(self.tr("updated_ok", &[("name", name)])));
                        PollRequest::USER
                    }
                    UpdateOutcome::Unknown => {
                        if let Some(message) = response.message.as_deref() {
                            self.notify(Notification::info(
                                self.tr("update_sent", &[("name", name), ("message", message)]),
                            ));
                        }
                        PollRequest::USER
                    }
                };
                self.poll_cycle(follow_up).await;
                Ok(outcome)
            }
            Err(e) => {
                let e = CoreError::from(e);
                warn!(name, error = %e, "update failed");
                let message = self.tr("update_fail", &[("name", name), ("err", &e.to_string())]);
                self.notify(Notification::error(message));
                Err(e)
            }
        }
    }

    /// Remove unused images, then refresh the unused count and re-poll.
    pub async fn prune_unused(&self) -> Result<PruneReport, CoreError> {
        let Some(_guard) = BusyGuard::try_acquire(&self.inner.pruning) else {
            return Err(CoreError::ActionInProgress { action: "prune" });
        };

        let result = self
            .inner
            .client
            .prune_images()
            .await
            .map_err(CoreError::from);
        match &result {
            Ok(report) => {
                info!(
                    reclaimed = report.space_reclaimed,
                    deleted = report.deleted_count(),
                    "prune finished"
                );
                let bytes = report.space_reclaimed.to_string();
                self.notify(Notification::success(self.tr("cleaned_ok", &[("bytes", &bytes)])));
            }
            Err(e) => {
                warn!(error = %e, "prune failed");
                self.notify(Notification::error(
                    self.tr("clean_fail", &[("err", &e.to_string())]),
                ));
            }
        }

        self.refresh_unused().await;
        self.poll_cycle(PollRequest::USER).await;
        result
    }

    /// Whether a prune request is running.
    pub fn prune_in_flight(&self) -> bool {
        self.inner.pruning.load(Ordering::Acquire)
    }

    // ── Unused images ────────────────────────────────────────────

    /// Refresh and publish the unused-image count. `None` when unknown.
    pub async fn refresh_unused(&self) -> Option<u64> {
        let count = match self.inner.client.unused_images().await {
            Ok(unused) => Some(unused.count),
            Err(e) => {
                debug!(error = %e, "unused image count unavailable");
                None
            }
        };
        self.inner.unused_tx.send_replace(count);
        count
    }

    // ── Settings ─────────────────────────────────────────────────

    /// Read the monitor's auth settings and attach the key accordingly.
    pub async fn load_settings(&self) -> Result<AuthState, CoreError> {
        let remote = self.inner.client.get_settings().await?;
        Ok(self.absorb_settings(remote).await)
    }

    /// Submit the settings form.
    pub async fn save_settings(&self, input: SettingsInput) -> Result<AuthState, CoreError> {
        match self.inner.client.post_settings(&input.into_update()).await {
            Ok(remote) => {
                let auth = self.absorb_settings(remote).await;
                self.notify(Notification::success(self.tr("settings_saved", &[])));
                self.poll_cycle(PollRequest::USER).await;
                Ok(auth)
            }
            Err(e) => {
                let e = CoreError::from(e);
                warn!(error = %e, "saving settings failed");
                self.notify(Notification::error(
                    self.tr("settings_fail", &[("err", &e.to_string())]),
                ));
                Err(e)
            }
        }
    }

    /// Have the monitor mint a new key and enable authentication.
    pub async fn generate_api_key(&self, allowed_cidrs: Vec<String>) -> Result<AuthState, CoreError> {
        match self
            .inner
            .client
            .post_settings(&generate_request(allowed_cidrs))
            .await
        {
            Ok(remote) => {
                let auth = self.absorb_settings(remote).await;
                self.notify(Notification::success(self.tr("auth_on", &[])));
                Ok(auth)
            }
            Err(e) => {
                let e = CoreError::from(e);
                warn!(error = %e, "key generation failed");
                self.notify(Notification::error(
                    self.tr("generate_fail", &[("err", &e.to_string())]),
                ));
                Err(e)
            }
        }
    }

    async fn absorb_settings(&self, remote: dockmon_api::Settings) -> AuthState {
        let mut state = self.inner.state.lock().await;
        state.auth.absorb(remote);
        self.inner.client.set_api_key(state.auth.request_key());
        debug!(auth_enabled = state.auth.auth_enabled, "settings applied");
        state.auth.clone()
    }

    /// Current auth view.
    pub async fn auth(&self) -> AuthState {
        self.inner.state.lock().await.auth().clone()
    }

    // ── Language ─────────────────────────────────────────────────

    pub fn language(&self) -> Language {
        *self
            .inner
            .language
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_language(&self, language: Language) {
        *self
            .inner
            .language
            .write()
            .unwrap_or_else(PoisonError::into_inner) = language;
        debug!(%language, "language changed");
    }

    fn tr(&self, key: &str, vars: &[(&str, &str)]) -> String {
        t(self.language(), key, vars)
    }

    // ── Triggers ─────────────────────────────────────────────────

    /// Queue on-demand work for the trigger task.
    pub async fn trigger(&self, trigger: Trigger) -> Result<(), CoreError> {
        self.inner
            .trigger_tx
            .send(trigger)
            .await
            .map_err(|_| CoreError::Internal("dashboard stopped".into()))
    }

    // ── Observation ──────────────────────────────────────────────

    /// Subscribe to row view changes.
    pub fn rows(&self) -> watch::Receiver<Arc<Vec<RowView>>> {
        self.inner.rows_tx.subscribe()
    }

    pub fn rows_snapshot(&self) -> Arc<Vec<RowView>> {
        Arc::clone(&self.inner.rows_tx.borrow())
    }

    /// Subscribe to the unused-image count.
    pub fn unused_count(&self) -> watch::Receiver<Option<u64>> {
        self.inner.unused_tx.subscribe()
    }

    /// Subscribe to user-facing notifications.
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notify_tx.subscribe()
    }

    fn publish(&self, state: &DashboardState) {
        let views = Arc::new(state.views());
        self.inner.rows_tx.send_modify(|rows| *rows = views);
    }

    fn notify(&self, notification: Notification) {
        debug!(kind = ?notification.kind, message = %notification.message, "notification");
        let _ = self.inner.notify_tx.send(notification);
    }
}
