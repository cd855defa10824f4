//! Candle (OHLCV) data structure with timestamp and derived moving averages

use serde::Serialize;

/// Trailing simple moving averages attached to a candle by
/// [`annotate`](crate::indicators::moving_averages::annotate).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovingAverages {
    pub ma5: f64,
    pub ma20: f64,
    pub ma60: f64,
}

impl MovingAverages {
    pub fn values(&self) -> [f64; 3] {
        [self.ma5, self.ma20, self.ma60]
    }
}

/// Represents a single candlestick with OHLC prices, optional volume and timestamp.
///
/// The timestamp is Unix time in milliseconds. Daily data resolves to
/// midnight UTC of the trading date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    /// Unix timestamp in milliseconds
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: Option<f64>,
    // Upstream previous-close delta (KIS `prdy_vrss` / `prdy_ctrt`)
    change_amount: Option<f64>,
    change_rate: Option<f64>,
    #[serde(flatten)]
    moving_averages: Option<MovingAverages>,
}

impl Candle {
    /// Creates a new Candle without volume or annotations.
    ///
    /// `low <= min(open, close)` and `high >= max(open, close)` are assumed by
    /// rendering but not enforced.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: None,
            change_amount: None,
            change_rate: None,
            moving_averages: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_change(mut self, amount: Option<f64>, rate: Option<f64>) -> Self {
        self.change_amount = amount;
        self.change_rate = rate;
        self
    }

    pub fn with_moving_averages(mut self, moving_averages: MovingAverages) -> Self {
        self.moving_averages = Some(moving_averages);
        self
    }

    /// Returns a copy with `close` replaced and `high`/`low` widened to include it.
    pub fn with_close(mut self, close: f64) -> Self {
        self.close = close;
        self.high = self.high.max(close);
        self.low = self.low.min(close);
        self
    }

    /// Returns the candle's timestamp (Unix time in milliseconds).
    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_open(&self) -> f64 {
        self.open
    }

    pub fn get_high(&self) -> f64 {
        self.high
    }

    pub fn get_low(&self) -> f64 {
        self.low
    }

    pub fn get_close(&self) -> f64 {
        self.close
    }

    pub fn get_volume(&self) -> Option<f64> {
        self.volume
    }

    pub fn get_change_amount(&self) -> Option<f64> {
        self.change_amount
    }

    pub fn get_change_rate(&self) -> Option<f64> {
        self.change_rate
    }

    pub fn get_moving_averages(&self) -> Option<MovingAverages> {
        self.moving_averages
    }

    /// Full range of the candle (high - low).
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    /// Whether the candle is drawn in the rising colour.
    ///
    /// Uses the upstream previous-close delta when present, otherwise
    /// compares close against open.
    pub fn is_rising(&self) -> bool {
        match self.change_amount {
            Some(change) => change >= 0.0,
            None => self.close >= self.open,
        }
    }
}
