// ── Display formatting ──
//
// Byte sizes and rates use 1024 steps and one decimal, dropping a
// trailing `.0` (`1 KB`, `1.5 MB`).

const SIZE_UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
const RATE_UNITS: [&str; 4] = ["B/s", "KB/s", "MB/s", "GB/s"];

fn scaled(value: f64, units: &[&str]) -> String {
    let mut n = if value.is_finite() { value.max(0.0) } else { 0.0 };
    let mut unit = 0;
    while n >= 1024.0 && unit + 1 < units.len() {
        n /= 1024.0;
        unit += 1;
    }
    let label = units.get(unit).copied().unwrap_or_default();
    format!("{} {label}", one_decimal(n))
}

/// Round to one decimal, print without a trailing `.0`.
pub fn one_decimal(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract().abs() < f64::EPSILON {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

pub fn format_bytes(bytes: f64) -> String {
    scaled(bytes, &SIZE_UNITS)
}

pub fn format_rate(bytes_per_sec: f64) -> String {
    scaled(bytes_per_sec, &RATE_UNITS)
}

/// `12.3%`; NaN shows as `0%`.
pub fn format_pct(pct: f64) -> String {
    if pct.is_nan() {
        return "0%".into();
    }
    format!("{}%", one_decimal(pct))
}

/// Network meter suffix: upload first, then download.
pub fn format_net(rx_per_sec: f64, tx_per_sec: f64) -> String {
    format!("↑ {} • ↓ {}", format_rate(tx_per_sec), format_rate(rx_per_sec))
}
