// Monitor HTTP client
//
// Wraps `reqwest::Client` with URL construction, credential attachment
// and response decoding. Endpoint groups (status, images, containers,
// settings) are implemented as inherent methods in separate files to keep
// this module focused on transport mechanics.

use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Error bodies the monitor sends alongside non-2xx statuses:
/// `{"error": "..."}` and/or `{"message": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Raw HTTP client for the container monitor.
///
/// Every authenticated call carries the API key as the `key` query
/// parameter once one is known. The key can be swapped at runtime after
/// the settings collaborator hands out a new one.
pub struct MonitorClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: RwLock<Option<SecretString>>,
}

impl MonitorClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the monitor root, e.g. `http://nas.local:5000` or
    /// `https://proxy/dockmon/` when served under a path prefix.
    pub fn new(
        base_url: Url,
        api_key: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, api_key))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key: RwLock::new(api_key),
        }
    }

    /// The monitor base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Credential management ────────────────────────────────────────

    /// Replace (or clear) the credential attached to outgoing requests.
    pub fn set_api_key(&self, key: Option<SecretString>) {
        debug!(present = key.is_some(), "updating API key");
        *self.api_key.write().unwrap_or_else(PoisonError::into_inner) = key;
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{segments...}?{query}` and append the credential.
    ///
    /// Segments are percent-encoded individually, so container names
    /// with odd characters stay a single path segment.
    pub(crate) fn endpoint_url(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);

        let guard = self.api_key.read().unwrap_or_else(PoisonError::into_inner);
        let key = guard
            .as_ref()
            .filter(|_| authenticated)
            .map(|k| k.expose_secret());

        if !query.is_empty() || key.is_some() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
            if let Some(key) = key {
                pairs.append_pair("key", key);
            }
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", redact(&url));

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;

        Self::parse_json(resp).await
    }

    /// Send a POST request with a JSON body and decode the JSON response.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", redact(&url));

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_json(resp).await
    }

    /// Send a POST for a user-facing action. Non-2xx responses become
    /// `Error::Action` carrying the server's own message.
    pub(crate) async fn post_action<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        self.post(url, body).await.map_err(|e| match e {
            Error::Http { message, .. } => Error::Action { message },
            other => other,
        })
    }

    /// Check the status code, then decode the body as `T`.
    ///
    /// Failed responses are mapped to `Error::Http` with the best message
    /// available: `error`, then `message`, then `HTTP <code>`.
    async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            trace!(status = status.as_u16(), body = %preview(&body), "error response");
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.or(b.message))
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(Error::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

/// First 200 characters of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// URL for logging with the credential blanked out.
fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == "key") {
        return url.to_string();
    }
    let mut clean = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    clean.query_pairs_mut().clear().extend_pairs(pairs);
    clean.to_string()
}
