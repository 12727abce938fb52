// Status and metrics endpoints
//
// Full snapshot, single-container snapshot, metrics-only refresh, and the
// monitor's health probe.

use tracing::debug;

use crate::client::MonitorClient;
use crate::error::Error;
use crate::models::{EntityMeta, HealthReport, MetricsResponse, StatusSnapshot};

fn flags<'a>(force: bool, light: bool) -> Vec<(&'a str, &'a str)> {
    let mut query = Vec::with_capacity(2);
    if force {
        query.push(("force", "1"));
    }
    if light {
        query.push(("light", "1"));
    }
    query
}

impl MonitorClient {
    /// Fetch the status snapshot for every container.
    ///
    /// `GET /status?[force=1][&light=1]`
    ///
    /// `force` bypasses the monitor's registry-digest cache; `light` skips
    /// the expensive per-container stats. A body whose envelope `status`
    /// is not `"ok"` is rejected with [`Error::Envelope`].
    pub async fn fetch_status(&self, force: bool, light: bool) -> Result<StatusSnapshot, Error> {
        let url = self.endpoint_url(&["status"], &flags(force, light), true)?;
        debug!(force, light, "fetching status snapshot");
        let snapshot: StatusSnapshot = self.get(url).await?;
        if !snapshot.is_ok() {
            return Err(Error::Envelope {
                status: snapshot.status.unwrap_or_else(|| "missing".into()),
            });
        }
        Ok(snapshot)
    }

    /// Fetch status and metadata for a single container.
    ///
    /// `GET /status/{name}?[force=1]`
    ///
    /// An unknown container comes back as `not_found` inside the snapshot,
    /// not as an HTTP error.
    pub async fn fetch_entity_status(
        &self,
        name: &str,
        force: bool,
    ) -> Result<StatusSnapshot, Error> {
        let url = self.endpoint_url(&["status", name], &flags(force, false), true)?;
        debug!(name, force, "fetching container status");
        let snapshot: StatusSnapshot = self.get(url).await?;
        match snapshot.status.as_deref() {
            None | Some("ok") => Ok(snapshot),
            Some(other) => Err(Error::Envelope {
                status: other.to_owned(),
            }),
        }
    }

    /// Fetch only the resource metrics of one container.
    ///
    /// `GET /metrics/{name}`
    pub async fn fetch_entity_metrics(&self, name: &str) -> Result<EntityMeta, Error> {
        let url = self.endpoint_url(&["metrics", name], &[], true)?;
        debug!(name, "fetching container metrics");
        let resp: MetricsResponse = self.get(url).await?;
        match resp.status.as_deref() {
            None | Some("ok") => Ok(resp.meta),
            Some(other) => Err(Error::Envelope {
                status: other.to_owned(),
            }),
        }
    }

    /// Probe the monitor and list the containers it can see.
    ///
    /// `GET /health`
    pub async fn health(&self) -> Result<HealthReport, Error> {
        let url = self.endpoint_url(&["health"], &[], true)?;
        debug!("probing monitor health");
        self.get(url).await
    }
}
