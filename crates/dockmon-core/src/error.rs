// ── Core error types ──
//
// User-facing errors from dockmon-core. Consumers never see reqwest or
// serde failures directly. The `From<dockmon_api::Error>` impl folds
// transport-layer errors into the three-way request/decode/action split.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fetch errors ─────────────────────────────────────────────────
    /// Non-success HTTP status or transport failure.
    #[error("Request failed: {message}")]
    RequestFailed {
        message: String,
        status: Option<u16>,
    },

    /// The response body could not be decoded.
    #[error("Malformed response: {message}")]
    DecodeFailed { message: String },

    // ── Action errors ────────────────────────────────────────────────
    /// The monitor refused a prune/update with its own message.
    #[error("{message}")]
    ActionFailed { message: String },

    /// The same action is already running.
    #[error("{action} already in progress")]
    ActionInProgress { action: &'static str },

    #[error("Container not found: {name}")]
    EntityNotFound { name: String },

    // ── Local state ──────────────────────────────────────────────────
    #[error("Snapshot cache error: {message}")]
    Cache { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Fetch failures (`RequestFailed` / `DecodeFailed`) are handled the
    /// same way: fall back, never crash.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::RequestFailed { .. } | Self::DecodeFailed { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dockmon_api::Error> for CoreError {
    fn from(err: dockmon_api::Error) -> Self {
        match err {
            dockmon_api::Error::Transport(ref e) => CoreError::RequestFailed {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            dockmon_api::Error::Http { status, message } => CoreError::RequestFailed {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
            },
            dockmon_api::Error::Envelope { status } => CoreError::RequestFailed {
                message: format!("snapshot status {status}"),
                status: None,
            },
            dockmon_api::Error::Deserialization { message, body: _ } => {
                CoreError::DecodeFailed { message }
            }
            dockmon_api::Error::Action { message } => CoreError::ActionFailed { message },
            dockmon_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            dockmon_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Cache {
            message: err.to_string(),
        }
    }
}
