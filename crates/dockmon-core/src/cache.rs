// ── Offline snapshot cache ──
//
// Keeps the last known-good full snapshot with its capture time. It is a
// fallback display source only: the dashboard reconciles it as pending and
// never merges it with live data.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use dockmon_api::StatusSnapshot;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub captured_at: DateTime<Utc>,
    pub snapshot: StatusSnapshot,
}

impl CachedSnapshot {
    pub fn now(snapshot: StatusSnapshot) -> Self {
        Self {
            captured_at: Utc::now(),
            snapshot,
        }
    }
}

/// Best-effort persistence for one snapshot.
pub trait SnapshotCache: Send + Sync {
    /// The stored snapshot, if any. Entries whose envelope is not `ok`
    /// count as absent.
    fn load(&self) -> Result<Option<CachedSnapshot>, CoreError>;

    fn store(&self, entry: &CachedSnapshot) -> Result<(), CoreError>;
}

// ── In-memory ────────────────────────────────────────────────────

/// Cache that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemorySnapshotCache {
    slot: Mutex<Option<CachedSnapshot>>,
}

impl MemorySnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(entry: CachedSnapshot) -> Self {
        Self {
            slot: Mutex::new(Some(entry)),
        }
    }
}

impl SnapshotCache for MemorySnapshotCache {
    fn load(&self) -> Result<Option<CachedSnapshot>, CoreError> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slot.clone().filter(|e| e.snapshot.is_ok()))
    }

    fn store(&self, entry: &CachedSnapshot) -> Result<(), CoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(entry.clone());
        Ok(())
    }
}

// ── On disk ──────────────────────────────────────────────────────

/// JSON file cache. Writes go to a sibling temp file that is renamed
/// into place, so a crash never leaves a half-written cache.
#[derive(Debug, Clone)]
pub struct FileSnapshotCache {
    path: PathBuf,
}

impl FileSnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, action: &str, err: &std::io::Error) -> CoreError {
        CoreError::Cache {
            message: format!("failed to {action} {}: {err}", self.path.display()),
        }
    }
}

impl SnapshotCache for FileSnapshotCache {
    fn load(&self) -> Result<Option<CachedSnapshot>, CoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error("read", &e)),
        };
        let entry: CachedSnapshot = serde_json::from_str(&raw)?;
        Ok(Some(entry).filter(|e| e.snapshot.is_ok()))
    }

    fn store(&self, entry: &CachedSnapshot) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error("create directory for", &e))?;
        }
        let body = serde_json::to_string(entry)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| self.io_error("write", &e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error("replace", &e))?;
        debug!(path = %self.path.display(), "snapshot cached");
        Ok(())
    }
}
