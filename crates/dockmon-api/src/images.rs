// Image housekeeping endpoints: unused (dangling) images and prune.

use serde_json::json;
use tracing::debug;

use crate::client::MonitorClient;
use crate::error::Error;
use crate::models::{PruneReport, UnusedImages};

impl MonitorClient {
    /// List dangling images.
    ///
    /// `GET /images/unused`
    pub async fn unused_images(&self) -> Result<UnusedImages, Error> {
        let url = self.endpoint_url(&["images", "unused"], &[], true)?;
        debug!("fetching unused images");
        self.get(url).await
    }

    /// Remove dangling images.
    ///
    /// `POST /images/prune`
    ///
    /// Failures come back as [`Error::Action`] with the monitor's `error`
    /// text, or `HTTP <code>` when the body had none.
    pub async fn prune_images(&self) -> Result<PruneReport, Error> {
        let url = self.endpoint_url(&["images", "prune"], &[], true)?;
        debug!("pruning unused images");
        self.post_action(url, &json!({})).await
    }
}
