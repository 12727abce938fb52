// ── View model ──
//
// What the presentation layer gets: already-computed per-row fields with
// no further logic required to draw them.

use serde::Serialize;
use strum::{AsRefStr, Display};

pub use dockmon_api::EntityStatus;

/// Visual severity for tags and lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tone {
    Ok,
    Warn,
    Err,
    Muted,
}

/// Tone of an update-status tag.
pub fn status_tone(status: &EntityStatus) -> Tone {
    match status {
        EntityStatus::UpToDate => Tone::Ok,
        EntityStatus::UpdateAvailable => Tone::Warn,
        EntityStatus::NotFound => Tone::Muted,
        EntityStatus::Error(_) | EntityStatus::Other(_) => Tone::Err,
    }
}

/// Tone of a container lifecycle state (`running`, `exited`, ...).
pub fn state_tone(state: Option<&str>) -> Tone {
    let state = state.unwrap_or_default().to_ascii_lowercase();
    match state.as_str() {
        "running" | "healthy" => Tone::Ok,
        "restarting" | "starting" | "unhealthy" => Tone::Warn,
        "exited" | "dead" | "removing" | "error" => Tone::Err,
        _ => Tone::Muted,
    }
}

/// Update-status column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusCell {
    /// Not confirmed live: first load, forced reload or cached data.
    Pending,
    Tag { status: EntityStatus, tone: Tone },
}

impl StatusCell {
    pub fn tag(status: EntityStatus) -> Self {
        let tone = status_tone(&status);
        Self::Tag { status, tone }
    }
}

/// One bar of the resources column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meter {
    /// Bar fill, 0..=100.
    pub pct: f64,
    /// Text next to the bar (`12.3%`, `↑ 1 KB/s • ↓ 2 KB/s`).
    pub text: String,
}

/// Populated resources column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub state: Option<String>,
    pub state_tone: Tone,
    pub cpu: Option<Meter>,
    pub ram: Option<Meter>,
    pub net: Option<Meter>,
}

/// Resources column: the skeleton until real numbers arrive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourcesCell {
    Loading,
    Ready(Metrics),
}

/// Repository column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoLink {
    pub label: String,
    pub url: Option<String>,
}

/// Everything needed to draw one container row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub name: String,
    pub status: StatusCell,
    pub resources: ResourcesCell,
    pub link: Option<RepoLink>,
    /// Whether the update action may be offered.
    pub action_enabled: bool,
    /// A single-row refresh is in flight.
    pub refreshing: bool,
    /// An update request is in flight.
    pub updating: bool,
}

impl RowView {
    pub fn is_pending(&self) -> bool {
        matches!(self.status, StatusCell::Pending)
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        match &self.resources {
            ResourcesCell::Ready(m) => Some(m),
            ResourcesCell::Loading => None,
        }
    }
}

// ── Notifications ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

/// A localized message the presentation layer should show the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tones() {
        assert_eq!(status_tone(&EntityStatus::UpToDate), Tone::Ok);
        assert_eq!(status_tone(&EntityStatus::UpdateAvailable), Tone::Warn);
        assert_eq!(status_tone(&EntityStatus::NotFound), Tone::Muted);
        assert_eq!(status_tone(&"registry_error".into()), Tone::Err);
        assert_eq!(status_tone(&"error: boom".into()), Tone::Err);
    }

    #[test]
    fn state_tones() {
        assert_eq!(state_tone(Some("Running")), Tone::Ok);
        assert_eq!(state_tone(Some("unhealthy")), Tone::Warn);
        assert_eq!(state_tone(Some("exited")), Tone::Err);
        assert_eq!(state_tone(Some("paused")), Tone::Muted);
        assert_eq!(state_tone(None), Tone::Muted);
    }
}
