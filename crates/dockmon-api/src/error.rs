use thiserror::Error;

/// Top-level error type for the `dockmon-api` crate.
///
/// Covers every failure mode of a round trip to the monitor:
/// transport, HTTP status, body decoding, and business-level failures
/// reported by the prune and update actions. `dockmon-core` maps these
/// into its own `RequestFailed` / `DecodeFailed` / `ActionFailed` taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Protocol ────────────────────────────────────────────────────
    /// Non-success HTTP status. `message` carries the server's `error`
    /// field when one could be decoded, otherwise a body preview.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The snapshot envelope did not carry `status == "ok"`.
    #[error("Snapshot rejected (status={status})")]
    Envelope { status: String },

    // ── Actions ─────────────────────────────────────────────────────
    /// Business-level failure reported by the monitor for prune/update.
    /// The message is the server's own text, surfaced verbatim.
    #[error("{message}")]
    Action { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the monitor rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401 | 403, .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }
}
