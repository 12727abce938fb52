//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use dockmon_config::ConfigError;
use dockmon_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the monitor: {message}")]
    #[diagnostic(
        code(dockmon::unreachable),
        help(
            "Check that the monitor is running and reachable.\n\
             Try: dockmon health --url http://<host>:<port>"
        )
    )]
    Unreachable { message: String },

    #[error("The monitor sent an unexpected response: {message}")]
    #[diagnostic(code(dockmon::bad_response))]
    BadResponse { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(dockmon::auth_failed),
        help(
            "The monitor requires an API key.\n\
             Pass --api-key, set api_key_env in your profile, or store one with:\n\
             dockmon settings generate-key --save"
        )
    )]
    AuthFailed { message: String },

    // ── Containers ───────────────────────────────────────────────────
    #[error("Container '{name}' not found")]
    #[diagnostic(
        code(dockmon::not_found),
        help("Run: dockmon status to see available containers")
    )]
    NotFound { name: String },

    #[error("{message}")]
    #[diagnostic(code(dockmon::action_failed))]
    ActionFailed { message: String },

    #[error("{action} already in progress")]
    #[diagnostic(code(dockmon::busy))]
    Busy { action: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dockmon::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(dockmon::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No monitor configured")]
    #[diagnostic(
        code(dockmon::no_config),
        help(
            "Pass --url (or DOCKMON_URL), or add a profile to the config file.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(dockmon::config))]
    Config(Box<ConfigError>),

    #[error("Internal error: {0}")]
    #[diagnostic(code(dockmon::internal))]
    Internal(String),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(dockmon::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unreachable { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Busy { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::RequestFailed {
                message,
                status: Some(401 | 403),
            } => CliError::AuthFailed { message },
            CoreError::RequestFailed { message, .. } => CliError::Unreachable { message },
            CoreError::DecodeFailed { message } => CliError::BadResponse { message },
            CoreError::ActionFailed { message } => CliError::ActionFailed { message },
            CoreError::ActionInProgress { action } => CliError::Busy {
                action: action.into(),
            },
            CoreError::EntityNotFound { name } => CliError::NotFound { name },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Cache { message } | CoreError::Internal(message) => {
                CliError::Internal(message)
            }
        }
    }
}
