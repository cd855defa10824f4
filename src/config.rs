use std::env;
use std::time::Duration;

use crate::chart::interaction::InteractionSettings;
use crate::chart::view_window::WindowLimits;

/// Chart core configuration derived from environment variables.
///
/// Every field has a default matching the web client, so `ChartConfig::default()`
/// is a working configuration against a local API server.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    // ── Upstream API ───────────────────────────────────────────────
    pub api_base_url: String,
    pub chart_path: String,
    pub price_path: String,
    pub http_timeout_secs: u64,

    // ── Real-time polling ──────────────────────────────────────────
    pub poll_interval_secs: u64,

    // ── View window ────────────────────────────────────────────────
    pub min_visible: usize,
    pub max_visible: usize,
    pub wheel_step: usize,
    pub key_step: usize,

    // ── Price scale ────────────────────────────────────────────────
    /// Fraction of the visible span added above and below the slice.
    pub view_range_padding: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            chart_path: "/api/stock/kis-chart".to_string(),
            price_path: "/api/stock/current-price".to_string(),
            http_timeout_secs: 10,
            poll_interval_secs: 5,
            min_visible: 20,
            max_visible: 150,
            wheel_step: 5,
            key_step: 5,
            view_range_padding: 0.1,
        }
    }
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

impl ChartConfig {
    /// Reads `TUSSAK_*` variables, falling back to the defaults for anything
    /// missing or unparsable.
    pub fn from_env() -> Self {
        let d = Self::default();
        let min_visible = env_usize("TUSSAK_MIN_VISIBLE", d.min_visible).max(1);
        let max_visible = env_usize("TUSSAK_MAX_VISIBLE", d.max_visible).max(min_visible);
        Self {
            api_base_url: env_str("TUSSAK_API_BASE_URL", &d.api_base_url)
                .trim_end_matches('/')
                .to_string(),
            chart_path: env_str("TUSSAK_CHART_PATH", &d.chart_path),
            price_path: env_str("TUSSAK_PRICE_PATH", &d.price_path),
            http_timeout_secs: env_u64("TUSSAK_HTTP_TIMEOUT_SECS", d.http_timeout_secs).max(1),
            poll_interval_secs: env_u64("TUSSAK_POLL_INTERVAL_SECS", d.poll_interval_secs).max(1),
            min_visible,
            max_visible,
            wheel_step: env_usize("TUSSAK_WHEEL_STEP", d.wheel_step).max(1),
            key_step: env_usize("TUSSAK_KEY_STEP", d.key_step).max(1),
            view_range_padding: env_f64("TUSSAK_VIEW_RANGE_PADDING", d.view_range_padding).max(0.0),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn window_limits(&self) -> WindowLimits {
        WindowLimits::new(self.min_visible, self.max_visible)
    }

    pub fn interaction(&self) -> InteractionSettings {
        InteractionSettings {
            wheel_step: self.wheel_step,
            key_step: self.key_step,
            ..InteractionSettings::default()
        }
    }
}
