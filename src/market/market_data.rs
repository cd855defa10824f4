//! Market data types shared by the fetch layer, the session and the poller.

use std::sync::Arc;

use serde_json::Value;

use crate::error::NormalizeError;
use crate::indicators::candle::Candle;
use crate::indicators::moving_averages::{annotate, annotate_tail};
use crate::indicators::period::Period;
use crate::indicators::price_range::{PriceRange, RangePadding, compute_range_with, max_volume};

/// Full-series envelope padding (`min * 0.98`, `max * 1.02`).
pub const FULL_RANGE_PADDING: RangePadding = RangePadding::ValueFraction(0.02);

/// Identifies one upstream series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub symbol: String,
    pub period: Period,
}

impl SeriesKey {
    pub fn new(symbol: impl Into<String>, period: Period) -> Self {
        Self {
            symbol: symbol.into(),
            period,
        }
    }

    /// `"symbol:periodCode"`, e.g. `"005930:D"`.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.symbol, self.period.code())
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.symbol, self.period.code())
    }
}

/// A normalized, annotated series plus its full-series scale.
///
/// Entries are immutable snapshots; updates produce new entries.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEntry {
    pub key: SeriesKey,
    pub candles: Arc<[Candle]>,
    pub full_range: PriceRange,
    pub max_volume: f64,
}

impl SeriesEntry {
    /// Normalizes and annotates a raw payload.
    pub fn build(key: SeriesKey, raw: &Value) -> Result<Self, NormalizeError> {
        let candles = crate::market::normalizer::normalize(raw)?;
        Ok(Self::from_candles(key, annotate(&candles)))
    }

    /// Wraps already annotated candles.
    pub fn from_candles(key: SeriesKey, candles: Vec<Candle>) -> Self {
        let full_range = compute_range_with(&candles, false, FULL_RANGE_PADDING);
        let max_volume = max_volume(&candles);
        Self {
            key,
            candles: candles.into(),
            full_range,
            max_volume,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.get_close())
    }

    /// Returns a new entry whose last candle closes at `price`.
    ///
    /// High/low widen to include the price and the trailing averages of the
    /// last candle are recomputed. `self` is left untouched.
    pub fn with_live_price(&self, price: f64) -> Self {
        if !price.is_finite() || price <= 0.0 || self.candles.is_empty() {
            return self.clone();
        }
        let mut candles = self.candles.to_vec();
        let last = candles.len() - 1;
        candles[last] = candles[last].with_close(price);
        annotate_tail(&mut candles, last);
        Self::from_candles(self.key.clone(), candles)
    }
}

/// Latest traded price for a symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: f64,
    /// Unix time in milliseconds when the quote was received
    pub timestamp: i64,
}

impl PriceQuote {
    pub fn new(symbol: impl Into<String>, price: f64, timestamp: i64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
        }
    }
}
