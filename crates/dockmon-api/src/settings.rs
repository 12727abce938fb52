// Settings endpoints. These are gated by the monitor's CIDR allow-list
// only, so no credential is attached.

use tracing::debug;

use crate::client::MonitorClient;
use crate::error::Error;
use crate::models::{Settings, SettingsUpdate};

impl MonitorClient {
    /// `GET /settings`. While auth is enabled the key comes back masked.
    pub async fn get_settings(&self) -> Result<Settings, Error> {
        let url = self.endpoint_url(&["settings"], &[], false)?;
        debug!("fetching settings");
        self.get(url).await
    }

    /// `POST /settings`. The response carries the effective key in clear,
    /// including a freshly generated one.
    pub async fn post_settings(&self, update: &SettingsUpdate) -> Result<Settings, Error> {
        let url = self.endpoint_url(&["settings"], &[], false)?;
        debug!(
            auth_enabled = update.auth_enabled,
            generate = update.generate_api_key,
            cidrs = update.allowed_cidrs.len(),
            "saving settings"
        );
        self.post(url, update).await
    }
}
