//! Offline provider generating plausible price history.
//!
//! Used when no API server is reachable and in demos. Output is emitted in the
//! `{candleData: [...]}` shape so it goes through the same normalizer as real
//! data.

use std::sync::Mutex;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::error::ChartResult;
use crate::indicators::period::Period;
use crate::market::source::ChartSource;

const TOTAL_POINTS: usize = 300;
const BASE_PRICE: f64 = 235_000.0;
const PRICE_JITTER: f64 = 5_000.0;

#[derive(Debug)]
pub struct SimulatedSource {
    seed: u64,
    base_price: f64,
    points: usize,
    start: NaiveDate,
    // Price jitter is stateful so successive polls wander
    rng: Mutex<StdRng>,
}

impl SimulatedSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            base_price: BASE_PRICE,
            points: TOTAL_POINTS,
            start: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default(),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn with_base_price(mut self, base_price: f64) -> Self {
        self.base_price = base_price;
        self
    }

    pub fn with_points(mut self, points: usize) -> Self {
        self.points = points;
        self
    }

    /// Generates the raw payload for `(symbol, period)`.
    ///
    /// Deterministic for a given seed, symbol and period: a sine wave plus a
    /// random walk scaled by the period's volatility hint, with the base
    /// price drifting 10 % towards each close.
    pub fn generate(&self, symbol: &str, period: Period) -> Value {
        let volatility = period.profile().volatility;
        let mut rng = StdRng::seed_from_u64(self.series_seed(symbol, period));
        let start_ms = self
            .start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();

        let mut base = self.base_price;
        let mut records = Vec::with_capacity(self.points);
        for i in 0..self.points {
            let wave = (i as f64 * 0.1).sin() * volatility.price * 0.3;
            let change = (rng.r#gen::<f64>() - 0.5) * volatility.price;

            let open = (base + wave).max(1.0);
            let close = (open + change).max(1.0);
            let high = open.max(close) + rng.r#gen::<f64>() * volatility.price * 0.2;
            let low = (open.min(close) - rng.r#gen::<f64>() * volatility.price * 0.2).max(0.5);
            let volume = (rng.r#gen::<f64>() * 1_000_000.0 * (1.0 + volatility.volume)).round();

            records.push(json!({
                "timestamp": start_ms + i as i64 * period.step_millis(),
                "open": open.round(),
                "high": high.round(),
                "low": low.round(),
                "close": close.round(),
                "volume": volume,
            }));

            base += (close - base) * 0.1;
        }

        json!({ "candleData": records })
    }

    fn series_seed(&self, symbol: &str, period: Period) -> u64 {
        // FNV-1a over the key, mixed with the instance seed
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in symbol.bytes().chain(period.code().bytes()) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        hash ^ self.seed
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ChartSource for SimulatedSource {
    fn name(&self) -> &'static str {
        "Simulated"
    }

    async fn fetch_series(&self, symbol: &str, period: Period) -> ChartResult<Value> {
        Ok(self.generate(symbol, period))
    }

    async fn fetch_price(&self, _symbol: &str) -> ChartResult<f64> {
        let jitter = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            (rng.r#gen::<f64>() - 0.5) * PRICE_JITTER
        };
        Ok((self.base_price + jitter).round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::normalizer::normalize;

    #[test]
    fn test_generated_payload_normalizes() {
        let source = SimulatedSource::new(7);
        let candles = normalize(&source.generate("005930", Period::Daily)).unwrap();
        assert_eq!(candles.len(), TOTAL_POINTS);
        for c in &candles {
            assert!(c.get_low() <= c.body_bottom());
            assert!(c.get_high() >= c.body_top());
            assert!(c.get_volume().is_some());
        }
        assert!(
            candles
                .windows(2)
                .all(|w| w[0].get_timestamp() < w[1].get_timestamp())
        );
    }

    #[test]
    fn test_generation_is_deterministic_per_key() {
        let source = SimulatedSource::new(1);
        assert_eq!(
            source.generate("005930", Period::Weekly),
            source.generate("005930", Period::Weekly)
        );
        assert_ne!(
            source.generate("005930", Period::Weekly),
            source.generate("000660", Period::Weekly)
        );
    }

    #[test]
    fn test_point_count_is_configurable() {
        let source = SimulatedSource::new(3).with_points(12);
        let payload = source.generate("005930", Period::Yearly);
        assert_eq!(payload["candleData"].as_array().map(Vec::len), Some(12));
    }

    #[tokio::test]
    async fn test_price_jitters_around_base() {
        let source = SimulatedSource::new(5).with_base_price(10_000.0);
        for _ in 0..20 {
            let price = source.fetch_price("005930").await.unwrap();
            assert!((7_500.0..=12_500.0).contains(&price));
        }
    }
}
