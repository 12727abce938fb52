// ── Snapshot reconciliation ──
//
// Merges a status snapshot into the long-lived rows. Removals are applied
// in full before anything is created or updated, so a name that vanishes
// and later comes back starts from a clean smoothing baseline.

use std::collections::HashSet;

use dockmon_api::{EntityMeta, StatusSnapshot};
use tracing::debug;

use crate::state::{DashboardState, EntityRow};

/// Which rows a reconciliation created and removed, in snapshot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ReconcileOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl DashboardState {
    /// Bring the rows in line with `snapshot`.
    ///
    /// With `pending` set every row shows the pending marker and the
    /// loading skeleton: used for cached data that must not look live.
    /// Otherwise status tags, links and (when the snapshot carries
    /// figures) metrics are applied; rows without figures keep what they
    /// already show. Per-row in-flight flags are never touched.
    pub fn reconcile(
        &mut self,
        snapshot: &StatusSnapshot,
        pending: bool,
        now_ms: i64,
    ) -> ReconcileOutcome {
        let incoming: HashSet<&str> = snapshot.names().collect();
        let mut outcome = ReconcileOutcome::default();

        let stale: Vec<String> = self
            .rows
            .keys()
            .filter(|name| !incoming.contains(name.as_str()))
            .cloned()
            .collect();
        for name in stale {
            self.remove_entity(&name);
            outcome.removed.push(name);
        }

        let empty = EntityMeta::default();
        for (name, status) in &snapshot.updates {
            if !self.rows.contains_key(name) {
                self.rows.insert(name.clone(), EntityRow::skeleton(name));
                outcome.added.push(name.clone());
            }
            let meta = snapshot.meta.get(name).unwrap_or(&empty);

            let metrics = if pending {
                None
            } else {
                self.render_metrics(name, meta, now_ms)
            };

            let Some(row) = self.rows.get_mut(name) else {
                continue;
            };
            row.set_image(meta.image.as_deref());
            if pending {
                row.mark_pending();
                row.action_enabled = true;
            } else {
                row.set_status(status.clone());
                if let Some(metrics) = metrics {
                    row.show_metrics(metrics);
                } else if !row.has_metrics() {
                    row.loading = true;
                }
            }
        }

        if !outcome.is_unchanged() {
            debug!(
                added = outcome.added.len(),
                removed = outcome.removed.len(),
                pending,
                "rows reconciled"
            );
        }
        outcome
    }
}
