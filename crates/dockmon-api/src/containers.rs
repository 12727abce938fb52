// Container actions.

use serde_json::json;
use tracing::debug;

use crate::client::MonitorClient;
use crate::error::Error;
use crate::models::UpdateResponse;

impl MonitorClient {
    /// Pull the latest image for a container and recreate it if needed.
    ///
    /// `POST /update_container` with `{"name": "..."}`
    ///
    /// The call blocks until the monitor has pulled and recreated, which
    /// can take minutes for large images.
    pub async fn update_container(&self, name: &str) -> Result<UpdateResponse, Error> {
        let url = self.endpoint_url(&["update_container"], &[], true)?;
        debug!(name, "requesting container update");
        self.post_action(url, &json!({ "name": name })).await
    }
}
