// Wire types for the monitor HTTP API.
//
// Numeric telemetry fields are decoded leniently: `null`, missing, or
// non-numeric values become `None` instead of failing the whole snapshot.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

// ── Entity status ───────────────────────────────────────────────────

/// Update status reported for one container.
///
/// Known values get their own variant; anything prefixed with `error`
/// is kept whole in [`EntityStatus::Error`], and every other string
/// (`unknown_image`, `registry_error`, ...) survives in [`EntityStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityStatus {
    UpToDate,
    UpdateAvailable,
    NotFound,
    Error(String),
    Other(String),
}

impl EntityStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::UpToDate => "up_to_date",
            Self::UpdateAvailable => "update_available",
            Self::NotFound => "not_found",
            Self::Error(raw) | Self::Other(raw) => raw,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<String> for EntityStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "up_to_date" => Self::UpToDate,
            "update_available" => Self::UpdateAvailable,
            "not_found" => Self::NotFound,
            s if s.starts_with("error") => Self::Error(raw),
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for EntityStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_owned())
    }
}

impl From<EntityStatus> for String {
    fn from(status: EntityStatus) -> Self {
        match status {
            EntityStatus::Error(raw) | EntityStatus::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Entity metadata ─────────────────────────────────────────────────

/// Per-container metadata and instantaneous resource figures.
///
/// `net_rx` / `net_tx` / `blk_*` are cumulative byte counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMeta {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cpu: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mem_usage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mem_limit: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub mem_perc: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub net_rx: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub net_tx: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub blk_read: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub blk_write: Option<f64>,
}

impl EntityMeta {
    /// Whether any resource figure is present (state/image alone don't count).
    pub fn has_metrics(&self) -> bool {
        [
            self.cpu,
            self.mem_usage,
            self.mem_limit,
            self.mem_perc,
            self.net_rx,
            self.net_tx,
        ]
        .iter()
        .any(Option::is_some)
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }))
}

// ── Snapshots ───────────────────────────────────────────────────────

/// Response of `GET /status` and `GET /status/{name}`.
///
/// Insertion order of `updates` is preserved so rows keep the order the
/// monitor lists containers in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub updates: IndexMap<String, EntityStatus>,
    #[serde(default)]
    pub meta: IndexMap<String, EntityMeta>,
}

impl StatusSnapshot {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }

    /// Entity names present in this snapshot, in server order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.updates.keys().map(String::as_str)
    }
}

/// Response of `GET /metrics/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MetricsResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub meta: EntityMeta,
}

// ── Images ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedImage {
    pub id: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Response of `GET /images/unused`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedImages {
    pub count: u64,
    #[serde(default)]
    pub items: Vec<UnusedImage>,
}

/// Response of `POST /images/prune` (the Docker engine's prune report).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PruneReport {
    #[serde(rename = "SpaceReclaimed", default)]
    pub space_reclaimed: u64,
    #[serde(rename = "ImagesDeleted", default)]
    pub images_deleted: Option<Vec<serde_json::Value>>,
}

impl PruneReport {
    pub fn deleted_count(&self) -> usize {
        self.images_deleted.as_ref().map_or(0, Vec::len)
    }
}

// ── Container update ────────────────────────────────────────────────

/// Response of `POST /update_container` on success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponse {
    #[serde(default)]
    pub updated: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// How an update request turned out, as far as the monitor tells us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOutcome {
    AlreadyUpToDate,
    Updated,
    Unknown,
}

impl UpdateResponse {
    /// Classify the response. The explicit flag wins; otherwise the
    /// message text decides.
    pub fn outcome(&self) -> UpdateOutcome {
        let message = self.message.as_deref().unwrap_or_default().to_lowercase();
        if self.updated == Some(false) || message.contains("already up to date") {
            UpdateOutcome::AlreadyUpToDate
        } else if self.updated == Some(true)
            || ["recreated", "updated", "pulled"]
                .iter()
                .any(|word| message.contains(word))
        {
            UpdateOutcome::Updated
        } else {
            UpdateOutcome::Unknown
        }
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Placeholder the monitor returns instead of the key while auth is on.
pub const MASKED_API_KEY: &str = "********";

/// Response of `GET /settings` and `POST /settings`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub auth_enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub allowed_cidrs: Vec<String>,
}

impl Settings {
    /// Whether `api_key` is the masked placeholder rather than a real key.
    pub fn key_is_masked(&self) -> bool {
        self.api_key == MASKED_API_KEY
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("auth_enabled", &self.auth_enabled)
            .field("api_key", &"[REDACTED]")
            .field("allowed_cidrs", &self.allowed_cidrs)
            .finish()
    }
}

/// Body of `POST /settings`.
#[derive(Clone, Default, Serialize)]
pub struct SettingsUpdate {
    pub auth_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub allowed_cidrs: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub generate_api_key: bool,
}

impl fmt::Debug for SettingsUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsUpdate")
            .field("auth_enabled", &self.auth_enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("allowed_cidrs", &self.allowed_cidrs)
            .field("generate_api_key", &self.generate_api_key)
            .finish()
    }
}

// ── Health ──────────────────────────────────────────────────────────

/// Response of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub containers: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}
