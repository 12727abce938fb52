//! Polling, reconciliation and smoothing engine between `dockmon-api` and
//! the dashboard surfaces (CLI watch mode, one-shot commands).
//!
//! - **[`Dashboard`]**: central facade. [`start()`](Dashboard::start) runs
//!   the startup sequence (settings, unused count, cached snapshot as
//!   pending, forced poll) and spawns the fast/slow poll loops.
//!   [`Dashboard::oneshot()`](Dashboard::oneshot) skips the loops for
//!   single CLI invocations.
//!
//! - **[`DashboardState`]**: one row per container, kept in snapshot order
//!   and reconciled in place. Removing a row purges its smoothing state.
//!
//! - **[`MetricsSmoother`]**: EMA for CPU/RAM, counter-delta rates and an
//!   adaptive peak for network throughput.
//!
//! - **[`SnapshotCache`]**: last good snapshot, shown as pending whenever
//!   the monitor is unreachable.
//!
//! - **[`VisibilityTracker`]**: injected capability telling the lazy
//!   metrics pass which rows are on screen.

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod i18n;
pub mod image_ref;
pub mod lazy;
pub mod model;
pub mod reconcile;
pub mod scheduler;
pub mod settings;
pub mod smoothing;
pub mod state;
pub mod visibility;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CachedSnapshot, FileSnapshotCache, MemorySnapshotCache, SnapshotCache};
pub use config::{DashboardConfig, TlsVerification};
pub use dashboard::Dashboard;
pub use error::CoreError;
pub use i18n::{Language, t};
pub use reconcile::ReconcileOutcome;
pub use scheduler::{PollOutcome, PollRequest, Trigger};
pub use settings::SettingsInput;
pub use smoothing::MetricsSmoother;
pub use state::{AuthState, DashboardState};
pub use visibility::{
    AlwaysVisible, ManualVisibility, VisibilitySignal, VisibilityTracker, VisibleSet,
};

pub use model::{
    EntityStatus, Meter, Metrics, Notification, NotificationKind, RepoLink, ResourcesCell,
    RowView, StatusCell, Tone,
};
