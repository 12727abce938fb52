// ── Rate and smoothing state ──
//
// Per-container numeric state: EMA for CPU% and RAM%, network throughput
// derived from cumulative byte counters, and the session-wide peak used to
// scale the network bar. Entries are only ever dropped through `forget`.

use std::collections::HashMap;

/// Weight of the newest sample.
pub const EMA_ALPHA: f64 = 0.3;

const MIB: f64 = 1024.0 * 1024.0;
/// Starting value for the network scale (2 MiB/s).
pub const NET_PEAK_INITIAL: f64 = 2.0 * MIB;
/// The network scale never drops below 1 MiB/s.
pub const NET_PEAK_FLOOR: f64 = MIB;
/// Observed throughput is padded by this factor before raising the peak.
pub const NET_PEAK_HEADROOM: f64 = 1.2;

/// Which smoothed percentage a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Series {
    Cpu,
    Ram,
}

/// Last observed counter pair for one container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetSample {
    pub at_ms: i64,
    pub rx: f64,
    pub tx: f64,
}

/// Derived throughput in bytes per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetRate {
    pub rx_per_sec: f64,
    pub tx_per_sec: f64,
}

impl NetRate {
    pub fn total(&self) -> f64 {
        self.rx_per_sec + self.tx_per_sec
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSmoother {
    cpu: HashMap<String, f64>,
    ram: HashMap<String, f64>,
    net: HashMap<String, NetSample>,
    peak: f64,
}

impl Default for MetricsSmoother {
    fn default() -> Self {
        Self {
            cpu: HashMap::new(),
            ram: HashMap::new(),
            net: HashMap::new(),
            peak: NET_PEAK_INITIAL,
        }
    }
}

impl MetricsSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    fn series_mut(&mut self, series: Series) -> &mut HashMap<String, f64> {
        match series {
            Series::Cpu => &mut self.cpu,
            Series::Ram => &mut self.ram,
        }
    }

    /// Fold `raw` into the running average for `key`.
    ///
    /// The first observation is taken as-is. Missing or non-finite input
    /// returns `0.0` and leaves the stored average untouched.
    pub fn ema_update(&mut self, series: Series, key: &str, raw: Option<f64>, alpha: f64) -> f64 {
        let Some(raw) = raw.filter(|v| v.is_finite()) else {
            return 0.0;
        };
        let map = self.series_mut(series);
        let next = match map.get(key) {
            Some(prev) => alpha * raw + (1.0 - alpha) * prev,
            None => raw,
        };
        map.insert(key.to_owned(), next);
        next
    }

    /// Current smoothed value, if any sample has been seen.
    pub fn smoothed(&self, series: Series, key: &str) -> Option<f64> {
        match series {
            Series::Cpu => self.cpu.get(key).copied(),
            Series::Ram => self.ram.get(key).copied(),
        }
    }

    /// Derive throughput from cumulative counters observed at `now_ms`.
    ///
    /// The first sample for a key only records a baseline. A clock that
    /// did not move forward yields zero and keeps the previous sample.
    /// Counter resets clamp to zero.
    pub fn net_rate(&mut self, key: &str, rx: f64, tx: f64, now_ms: i64) -> NetRate {
        let sample = NetSample { at_ms: now_ms, rx, tx };
        let Some(prev) = self.net.get(key).copied() else {
            self.net.insert(key.to_owned(), sample);
            return NetRate::default();
        };

        let elapsed_ms = now_ms.saturating_sub(prev.at_ms);
        if elapsed_ms <= 0 {
            return NetRate::default();
        }
        self.net.insert(key.to_owned(), sample);

        #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
        let elapsed = elapsed_ms as f64 / 1000.0;
        let rate = NetRate {
            rx_per_sec: ((rx - prev.rx) / elapsed).max(0.0),
            tx_per_sec: ((tx - prev.tx) / elapsed).max(0.0),
        };
        let observed = rate.total() * NET_PEAK_HEADROOM;
        if observed.is_finite() {
            self.peak = self.peak.max(observed).max(NET_PEAK_FLOOR);
        }
        rate
    }

    /// Session peak throughput used as the 100% mark of the network bar.
    pub fn net_peak(&self) -> f64 {
        self.peak
    }

    /// Share of the peak, clamped to 0..=100.
    pub fn net_pct(&self, rate: NetRate) -> f64 {
        clamp_pct(rate.total() / self.peak.max(1.0) * 100.0)
    }

    /// Drop every piece of state kept for `key`.
    pub fn forget(&mut self, key: &str) {
        self.cpu.remove(key);
        self.ram.remove(key);
        self.net.remove(key);
    }

    /// Whether anything is still stored for `key`.
    pub fn knows(&self, key: &str) -> bool {
        self.cpu.contains_key(key) || self.ram.contains_key(key) || self.net.contains_key(key)
    }
}

/// Clamp to 0..=100; NaN and infinities become 0.
pub fn clamp_pct(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
