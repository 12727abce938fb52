// ── Runtime dashboard configuration ──
//
// Describes *how* to reach the monitor and how often to poll it.
// Carries credential data and timing knobs but never touches disk.
// The CLI builds a `DashboardConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::i18n::Language;

/// Steady poll cadence for the light snapshot.
pub const DEFAULT_FAST_INTERVAL: Duration = Duration::from_secs(5);
/// Full re-sync safety net.
pub const DEFAULT_SLOW_INTERVAL: Duration = Duration::from_secs(3600);
/// Unused-image count refresh.
pub const DEFAULT_UNUSED_INTERVAL: Duration = Duration::from_secs(30);
/// Delay between the initial poll and the first lazy metrics pass.
pub const DEFAULT_LAZY_DELAY: Duration = Duration::from_millis(300);
/// Most metrics-only requests ever in flight at once.
pub const MAX_BATCH_SIZE: usize = 6;
/// Width of one lazy metrics batch.
pub const DEFAULT_BATCH_SIZE: usize = MAX_BATCH_SIZE;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one dashboard session against one monitor.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Monitor base URL (e.g., `http://nas.local:5000`).
    pub url: Url,
    /// Known API key, attached once the monitor reports auth as enabled.
    pub api_key: Option<SecretString>,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    pub fast_interval: Duration,
    pub slow_interval: Duration,
    pub unused_interval: Duration,
    pub lazy_delay: Duration,
    /// Concurrent metrics-only requests per batch. Capped at
    /// [`MAX_BATCH_SIZE`] when used.
    pub batch_size: usize,
    /// Language for notification text.
    pub language: Language,
    /// Where the last good snapshot is kept. `None` keeps it in memory.
    pub cache_path: Option<PathBuf>,
}

impl DashboardConfig {
    /// Config with default cadences for the given monitor.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            api_key: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            fast_interval: DEFAULT_FAST_INTERVAL,
            slow_interval: DEFAULT_SLOW_INTERVAL,
            unused_interval: DEFAULT_UNUSED_INTERVAL,
            lazy_delay: DEFAULT_LAZY_DELAY,
            batch_size: DEFAULT_BATCH_SIZE,
            language: Language::default(),
            cache_path: None,
        }
    }

    pub fn with_api_key(mut self, key: SecretString) -> Self {
        self.api_key = Some(key);
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Batch width actually used by the lazy loader.
    pub fn metrics_batch_width(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }
}
