// ── Dashboard state ──
//
// Everything the coordinator mutates: rows keyed by container name, the
// smoothing state, and the settings collaborator's auth view. Owned by one
// `Dashboard`, guarded by a single mutex, never touched across an await.

use std::fmt;

use dockmon_api::{EntityMeta, EntityStatus};
use indexmap::IndexMap;
use secrecy::SecretString;

use crate::format::{format_net, format_pct};
use crate::image_ref::{repo_label, repo_link};
use crate::model::{Meter, Metrics, RepoLink, ResourcesCell, RowView, StatusCell, state_tone};
use crate::smoothing::{EMA_ALPHA, MetricsSmoother, Series, clamp_pct};

// ── Rows ─────────────────────────────────────────────────────────

/// Core-owned state for one container.
#[derive(Debug, Clone)]
pub(crate) struct EntityRow {
    pub name: String,
    /// `None` while pending.
    pub status: Option<EntityStatus>,
    /// Last populated metrics; once set, only replaced, never cleared.
    pub metrics: Option<Metrics>,
    /// Show the loading skeleton regardless of `metrics`.
    pub loading: bool,
    pub link: Option<RepoLink>,
    pub action_enabled: bool,
    pub refreshing: bool,
    pub updating: bool,
}

impl EntityRow {
    /// A freshly discovered container: pending status, loading metrics.
    pub fn skeleton(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            status: None,
            metrics: None,
            loading: true,
            link: None,
            action_enabled: true,
            refreshing: false,
            updating: false,
        }
    }

    pub fn has_metrics(&self) -> bool {
        self.metrics.is_some()
    }

    /// Pending status and the loading skeleton, whatever was shown before.
    pub fn mark_pending(&mut self) {
        self.status = None;
        self.loading = true;
    }

    pub fn show_metrics(&mut self, metrics: Metrics) {
        self.metrics = Some(metrics);
        self.loading = false;
    }

    /// Apply a confirmed status; the update action is withheld for
    /// containers the monitor cannot resolve.
    pub fn set_status(&mut self, status: EntityStatus) {
        self.action_enabled = !matches!(status, EntityStatus::NotFound) && !status.is_error();
        self.status = Some(status);
    }

    pub fn set_image(&mut self, image: Option<&str>) {
        self.link = image.and_then(|image| {
            repo_label(image).map(|label| RepoLink {
                label,
                url: repo_link(image),
            })
        });
    }

    pub fn view(&self) -> RowView {
        let resources = match (&self.metrics, self.loading) {
            (Some(m), false) => ResourcesCell::Ready(m.clone()),
            _ => ResourcesCell::Loading,
        };
        RowView {
            name: self.name.clone(),
            status: self
                .status
                .clone()
                .map_or(StatusCell::Pending, StatusCell::tag),
            resources,
            link: self.link.clone(),
            action_enabled: self.action_enabled,
            refreshing: self.refreshing,
            updating: self.updating,
        }
    }
}

// ── Auth view ────────────────────────────────────────────────────

/// What the settings collaborator last told us, plus the key we know.
#[derive(Clone, Default)]
pub struct AuthState {
    pub auth_enabled: bool,
    pub api_key: Option<SecretString>,
    pub allowed_cidrs: Vec<String>,
}

impl AuthState {
    /// Credential to attach to requests: only while auth is enabled.
    pub fn request_key(&self) -> Option<SecretString> {
        if self.auth_enabled {
            self.api_key.clone()
        } else {
            None
        }
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("auth_enabled", &self.auth_enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("allowed_cidrs", &self.allowed_cidrs)
            .finish()
    }
}

// ── DashboardState ───────────────────────────────────────────────

/// Explicit owner of all mutable per-session state.
///
/// Lifecycle: [`create`](Self::create), [`remove_entity`](Self::remove_entity)
/// whenever a row disappears, [`dispose`](Self::dispose) at shutdown.
#[derive(Debug, Default)]
pub struct DashboardState {
    pub(crate) rows: IndexMap<String, EntityRow>,
    pub(crate) smoother: MetricsSmoother,
    pub(crate) auth: AuthState,
}

impl DashboardState {
    pub fn create(api_key: Option<SecretString>) -> Self {
        Self {
            rows: IndexMap::new(),
            smoother: MetricsSmoother::new(),
            auth: AuthState {
                api_key,
                ..AuthState::default()
            },
        }
    }

    /// Drop a row together with all derived numeric state.
    pub fn remove_entity(&mut self, name: &str) -> bool {
        self.smoother.forget(name);
        self.rows.shift_remove(name).is_some()
    }

    /// Forget everything. The auth view survives; it is not per-session.
    pub fn dispose(&mut self) {
        self.rows.clear();
        self.smoother = MetricsSmoother::new();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rows.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.rows.keys().cloned().collect()
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn smoother(&self) -> &MetricsSmoother {
        &self.smoother
    }

    pub fn row_view(&self, name: &str) -> Option<RowView> {
        self.rows.get(name).map(EntityRow::view)
    }

    pub fn views(&self) -> Vec<RowView> {
        self.rows.values().map(EntityRow::view).collect()
    }

    /// Mark every row pending with the loading skeleton.
    pub fn mark_all_pending(&mut self) {
        for row in self.rows.values_mut() {
            row.mark_pending();
        }
    }

    /// Compute display metrics for `name` from `meta`, advancing the
    /// smoothing state. Returns `None` when `meta` has no resource figures.
    pub fn render_metrics(&mut self, name: &str, meta: &EntityMeta, now_ms: i64) -> Option<Metrics> {
        if !meta.has_metrics() {
            return None;
        }
        let smoother = &mut self.smoother;

        let cpu = meta.cpu.map(|raw| {
            let pct = clamp_pct(smoother.ema_update(Series::Cpu, name, Some(clamp_pct(raw)), EMA_ALPHA));
            Meter {
                pct,
                text: format_pct(pct),
            }
        });

        let ram_raw = match (meta.mem_usage, meta.mem_limit) {
            (Some(usage), Some(limit)) if limit > 0.0 => Some(usage / limit * 100.0),
            _ => meta.mem_perc,
        };
        let ram = ram_raw.map(|raw| {
            let pct = clamp_pct(smoother.ema_update(Series::Ram, name, Some(clamp_pct(raw)), EMA_ALPHA));
            Meter {
                pct,
                text: format_pct(pct),
            }
        });

        let net = (meta.net_rx.is_some() || meta.net_tx.is_some()).then(|| {
            let rate = smoother.net_rate(
                name,
                meta.net_rx.unwrap_or_default(),
                meta.net_tx.unwrap_or_default(),
                now_ms,
            );
            Meter {
                pct: smoother.net_pct(rate),
                text: format_net(rate.rx_per_sec, rate.tx_per_sec),
            }
        });

        Some(Metrics {
            state: meta.state.clone(),
            state_tone: state_tone(meta.state.as_deref()),
            cpu,
            ram,
            net,
        })
    }

    /// Metrics-only update for one row. Rows that vanished meanwhile are
    /// left alone so no smoothing state is recreated for them.
    pub fn apply_metrics(&mut self, name: &str, meta: &EntityMeta, now_ms: i64) -> bool {
        if !self.rows.contains_key(name) {
            return false;
        }
        let Some(metrics) = self.render_metrics(name, meta, now_ms) else {
            return false;
        };
        if let Some(row) = self.rows.get_mut(name) {
            row.show_metrics(metrics);
        }
        true
    }
}
