//! Trailing Simple Moving Averages (MA5 / MA20 / MA60) over closing prices

use crate::indicators::candle::{Candle, MovingAverages};

/// Periods annotated onto every candle, in `MovingAverages` field order.
pub const MA_PERIODS: [usize; 3] = [5, 20, 60];

/// Calculates the trailing SMA for every index of `closes`.
///
/// `sma[i] = mean(closes[max(0, i - period + 1) ..= i])`
///
/// Near the start of the series the window shrinks instead of leaving the
/// value undefined, so the output always has the same length as the input.
/// Returns an empty vector if `period` is zero.
pub fn trailing_sma(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }

    let mut values = Vec::with_capacity(closes.len());
    let mut sum = 0.0;

    for (i, close) in closes.iter().enumerate() {
        sum += close;
        if i >= period {
            sum -= closes[i - period];
        }
        let window = (i + 1).min(period);
        values.push(sum / window as f64);
    }

    values
}

/// Returns a copy of `candles` with MA5/MA20/MA60 attached to every element.
///
/// Deterministic and idempotent: existing annotations are ignored and
/// recomputed from the closes.
pub fn annotate(candles: &[Candle]) -> Vec<Candle> {
    let closes: Vec<f64> = candles.iter().map(|c| c.get_close()).collect();
    let [ma5, ma20, ma60] = MA_PERIODS.map(|period| trailing_sma(&closes, period));

    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            candle.with_moving_averages(MovingAverages {
                ma5: ma5[i],
                ma20: ma20[i],
                ma60: ma60[i],
            })
        })
        .collect()
}

/// Recomputes the moving averages in place for indices `from..`.
///
/// Earlier candles are read but not modified. Each index is averaged
/// directly, so a live update of the last candle costs one window per MA.
pub fn annotate_tail(candles: &mut [Candle], from: usize) {
    for i in from..candles.len() {
        let averages = MovingAverages {
            ma5: window_mean(candles, i, MA_PERIODS[0]),
            ma20: window_mean(candles, i, MA_PERIODS[1]),
            ma60: window_mean(candles, i, MA_PERIODS[2]),
        };
        candles[i] = candles[i].with_moving_averages(averages);
    }
}

fn window_mean(candles: &[Candle], index: usize, period: usize) -> f64 {
    let start = (index + 1).saturating_sub(period);
    let window = &candles[start..=index];
    let sum: f64 = window.iter().map(|c| c.get_close()).sum();
    sum / window.len() as f64
}
