//! Price and volume scale computation for a candle slice

use serde::Serialize;

use crate::indicators::candle::Candle;

/// Spans at or below this are treated as a single price.
const DEGENERATE_EPSILON: f64 = 1e-9;
/// Symmetric padding (fraction of the price) applied to a degenerate span.
const DEGENERATE_PADDING: f64 = 0.02;
/// Default slice padding used by [`compute_range`].
const DEFAULT_SPAN_PADDING: f64 = 0.1;
const DEFAULT_MAX_VOLUME: f64 = 1_000_000.0;

/// Vertical price scale, `max > min` strictly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    /// Scale used when there is nothing to measure.
    pub const DEFAULT: PriceRange = PriceRange {
        min: 0.0,
        max: 100_000.0,
    };

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }

    /// `count` evenly spaced grid values from `min` to `max` inclusive.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![self.min],
            _ => {
                let step = self.span() / (count - 1) as f64;
                (0..count).map(|i| self.min + step * i as f64).collect()
            }
        }
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// How the raw `[low, high]` envelope is widened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangePadding {
    /// Pad both ends by a fraction of `max - min` (visible slice).
    SpanFraction(f64),
    /// Scale `min` down and `max` up by a fraction of their value
    /// (full-series envelope, `min * 0.98` / `max * 1.02`).
    ValueFraction(f64),
}

/// Computes the padded price range of `candles` with the default slice padding.
///
/// With `include_ma` the MA5/MA20/MA60 values of annotated candles also
/// stretch the range.
pub fn compute_range(candles: &[Candle], include_ma: bool) -> PriceRange {
    compute_range_with(candles, include_ma, RangePadding::SpanFraction(DEFAULT_SPAN_PADDING))
}

/// Computes the padded price range of `candles`.
///
/// Never fails: an empty slice yields [`PriceRange::DEFAULT`] and a zero-height
/// envelope is padded by ±2 % of the price.
pub fn compute_range_with(
    candles: &[Candle],
    include_ma: bool,
    padding: RangePadding,
) -> PriceRange {
    let Some((min, max)) = envelope(candles, include_ma) else {
        return PriceRange::DEFAULT;
    };

    if max - min <= DEGENERATE_EPSILON {
        let pad = if min.abs() > DEGENERATE_EPSILON {
            min.abs() * DEGENERATE_PADDING
        } else {
            1.0
        };
        return PriceRange {
            min: min - pad,
            max: max + pad,
        };
    }

    match padding {
        RangePadding::SpanFraction(fraction) => {
            let pad = (max - min) * fraction.max(0.0);
            PriceRange {
                min: min - pad,
                max: max + pad,
            }
        }
        RangePadding::ValueFraction(fraction) => {
            let fraction = fraction.max(0.0);
            PriceRange {
                min: min - min.abs() * fraction,
                max: max + max.abs() * fraction,
            }
        }
    }
}

fn envelope(candles: &[Candle], include_ma: bool) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for candle in candles {
        min = min.min(candle.get_low());
        max = max.max(candle.get_high());
        if include_ma {
            if let Some(ma) = candle.get_moving_averages() {
                for value in ma.values() {
                    min = min.min(value);
                    max = max.max(value);
                }
            }
        }
    }

    (min.is_finite() && max.is_finite()).then_some((min, max))
}

/// Largest volume in the slice, `0.0` when no candle carries one.
pub fn max_volume(candles: &[Candle]) -> f64 {
    candles
        .iter()
        .filter_map(|c| c.get_volume())
        .fold(0.0, f64::max)
}

/// Volume pane scale, always anchored at zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeRange {
    pub max: f64,
}

impl VolumeRange {
    pub fn from_candles(candles: &[Candle]) -> Self {
        let max = max_volume(candles);
        Self {
            max: if max > 0.0 { max } else { DEFAULT_MAX_VOLUME },
        }
    }
}
