//! CLI configuration: thin wrapper around `dockmon_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --api-key, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use dockmon_core::{DashboardConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use dockmon_config::{Config, config_path, load_config_or_default, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `DashboardConfig` from the config file, profile, and CLI overrides.
///
/// With `--url` and no matching profile the monitor is reached with flag
/// values and config defaults alone.
pub fn build_dashboard_config(global: &GlobalOpts, cfg: &Config) -> Result<DashboardConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let mut config = match (cfg.profiles.get(&profile_name), global.url.as_deref()) {
        (Some(profile), _) => {
            dockmon_config::profile_to_dashboard_config(profile, &profile_name, &cfg.defaults)?
        }
        (None, Some(_)) => {
            let bare = dockmon_config::Profile {
                url: global.url.clone().unwrap_or_default(),
                ..dockmon_config::Profile::default()
            };
            dockmon_config::profile_to_dashboard_config(&bare, &profile_name, &cfg.defaults)?
        }
        (None, None) if global.profile.is_some() => {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available.join(", "),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    // Flag overrides (flag > env > profile)
    if let Some(ref url) = global.url {
        config.url = url.parse().map_err(|_| CliError::Validation {
            field: "url".into(),
            reason: format!("invalid URL: {url}"),
        })?;
    }
    if let Some(ref key) = global.api_key {
        config.api_key = Some(SecretString::from(key.clone()));
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    config.language = cfg.language();
    Ok(config)
}
