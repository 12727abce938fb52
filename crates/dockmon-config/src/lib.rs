//! Shared configuration for the dockmon CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), the
//! language preference, and translation to `dockmon_core::DashboardConfig`.
//! The core never reads files; everything on disk goes through here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use dockmon_core::{DashboardConfig, Language, TlsVerification};

const KEYRING_SERVICE: &str = "dockmon";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named monitor profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, or the default profile when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
            .to_owned();
        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile)),
            None => Err(ConfigError::UnknownProfile { profile: name }),
        }
    }

    /// Saved language, else the one `LANG` suggests.
    pub fn language(&self) -> Language {
        self.defaults
            .language
            .unwrap_or_else(|| Language::detect(std::env::var("LANG").ok().as_deref()))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// `fr` or `en`. Unset means "derive from LANG".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,

    #[serde(default = "default_fast_interval")]
    pub fast_interval_secs: u64,

    #[serde(default = "default_slow_interval")]
    pub slow_interval_secs: u64,

    #[serde(default = "default_unused_interval")]
    pub unused_interval_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            language: None,
            fast_interval_secs: default_fast_interval(),
            slow_interval_secs: default_slow_interval(),
            unused_interval_secs: default_unused_interval(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_fast_interval() -> u64 {
    5
}
fn default_slow_interval() -> u64 {
    3600
}
fn default_unused_interval() -> u64 {
    30
}

/// A named monitor profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Monitor base URL (e.g., "http://nas.local:5000").
    pub url: String,

    /// API key (plaintext, prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Accept self-signed certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "dockmon")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where the offline snapshot for `profile_name` is kept.
pub fn snapshot_cache_path(profile_name: &str) -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().join(format!("snapshot-{profile_name}.json")))
}

/// Directory for `watch` mode log files.
pub fn log_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("logs"),
        |dirs| dirs.data_local_dir().join("logs"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("dockmon");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, then apply `DOCKMON_` env overrides
/// (`DOCKMON_DEFAULTS__TIMEOUT=10`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DOCKMON_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Load the file alone, without env overrides. A missing file yields the
/// defaults; a malformed one is an error.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .extract()?;
    Ok(config)
}

/// Persist the language preference in the canonical config file.
pub fn set_language(language: Language) -> Result<(), ConfigError> {
    set_language_in(&config_path(), language)
}

/// Rewrite `path` with a new language. Everything else in the file is kept,
/// and env overrides never leak into it.
pub fn set_language_in(path: &Path, language: Language) -> Result<(), ConfigError> {
    let mut cfg = load_config_file(path)?;
    cfg.defaults.language = Some(language);
    save_config_to(path, &cfg)
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key"))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Resolve the API key from the credential chain. `None` is fine: the
/// monitor may run without authentication.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile.api_key.clone().map(SecretString::from)
}

/// Store a key in the system keyring for `profile_name`.
pub fn store_api_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?
        .set_password(key)
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `DashboardConfig` from a profile and the global defaults.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    if defaults.fast_interval_secs == 0 {
        return Err(ConfigError::Validation {
            field: "fast_interval_secs".into(),
            reason: "must be at least 1".into(),
        });
    }

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = DashboardConfig::new(url);
    config.api_key = resolve_api_key(profile, profile_name);
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.fast_interval = Duration::from_secs(defaults.fast_interval_secs);
    config.slow_interval = Duration::from_secs(defaults.slow_interval_secs);
    config.unused_interval = Duration::from_secs(defaults.unused_interval_secs);
    config.cache_path = snapshot_cache_path(profile_name);
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
default_profile = "nas"

[defaults]
timeout = 10
language = "en"
fast_interval_secs = 2

[profiles.nas]
url = "http://nas.local:5000"
insecure = true

[profiles.lab]
url = "https://lab.example/dockmon/"
ca_cert = "/etc/ssl/lab.pem"
timeout = 5
"#;

    fn sample() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn loads_profiles_and_defaults() {
        let cfg = sample();
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.fast_interval_secs, 2);
        assert_eq!(cfg.defaults.slow_interval_secs, 3600);
        assert_eq!(cfg.language(), Language::En);
        assert_eq!(cfg.profiles.len(), 2);

        let (name, profile) = cfg.profile(None).unwrap();
        assert_eq!(name, "nas");
        assert_eq!(profile.url, "http://nas.local:5000");
        assert!(matches!(
            cfg.profile(Some("missing")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.unused_interval_secs, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn save_then_load_keeps_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.defaults.language = Some(Language::En);
        cfg.profiles.insert(
            "default".into(),
            Profile {
                url: "http://localhost:5000".into(),
                ..Profile::default()
            },
        );
        save_config_to(&path, &cfg).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.defaults.language, Some(Language::En));
        assert_eq!(loaded.profiles["default"].url, "http://localhost:5000");
    }

    #[test]
    fn language_change_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        set_language_in(&path, Language::Fr).unwrap();

        let loaded = load_config_file(&path).unwrap();
        assert_eq!(loaded.defaults.language, Some(Language::Fr));
        assert_eq!(loaded.defaults.timeout, 10);
        assert_eq!(loaded.profiles.len(), 2);
        assert_eq!(loaded.profiles["lab"].timeout, Some(5));
    }

    #[test]
    fn language_change_leaves_a_broken_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let broken = "[profiles.nas\nurl = ";
        std::fs::write(&path, broken).unwrap();

        assert!(set_language_in(&path, Language::En).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
    }

    #[test]
    fn language_change_creates_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dockmon").join("config.toml");

        set_language_in(&path, Language::En).unwrap();

        let loaded = load_config_file(&path).unwrap();
        assert_eq!(loaded.defaults.language, Some(Language::En));
        assert!(loaded.profiles.is_empty());
    }

    #[test]
    fn profile_translates_to_dashboard_config() {
        let cfg = sample();
        let lab = &cfg.profiles["lab"];
        let dash = profile_to_dashboard_config(lab, "lab", &cfg.defaults).unwrap();
        assert_eq!(dash.url.as_str(), "https://lab.example/dockmon/");
        assert_eq!(dash.timeout, Duration::from_secs(5));
        assert_eq!(dash.fast_interval, Duration::from_secs(2));
        assert_eq!(dash.tls, TlsVerification::CustomCa(PathBuf::from("/etc/ssl/lab.pem")));

        let nas = &cfg.profiles["nas"];
        let dash = profile_to_dashboard_config(nas, "nas", &cfg.defaults).unwrap();
        assert_eq!(dash.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(dash.timeout, Duration::from_secs(10));
    }

    #[test]
    fn invalid_urls_are_rejected() {
        let defaults = Defaults::default();
        for url in ["not a url", "ftp://nas.local"] {
            let profile = Profile {
                url: url.into(),
                ..Profile::default()
            };
            assert!(matches!(
                profile_to_dashboard_config(&profile, "x", &defaults),
                Err(ConfigError::Validation { .. })
            ));
        }
    }

    #[test]
    fn env_var_key_wins() {
        let profile = Profile {
            url: "http://localhost".into(),
            api_key: Some("plaintext".into()),
            api_key_env: Some("PATH".into()),
            ..Profile::default()
        };
        let key = resolve_api_key(&profile, "env-test").unwrap();
        assert_eq!(
            secrecy::ExposeSecret::expose_secret(&key),
            std::env::var("PATH").unwrap()
        );
    }
}
