//! ChartSource trait for upstream chart and price endpoints.

use std::future::Future;

use serde_json::Value;

use crate::error::ChartResult;
use crate::indicators::period::Period;

// A provider only fetches raw payloads. Shape sniffing and validation
// happen downstream in the normalizer.

/// Trait for upstream data providers (KIS REST proxy, simulated data, test doubles).
pub trait ChartSource: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Fetches the raw OHLC payload for `(symbol, period)`.
    /// Any shape accepted by the normalizer may be returned.
    fn fetch_series(
        &self,
        symbol: &str,
        period: Period,
    ) -> impl Future<Output = ChartResult<Value>> + Send;

    /// Fetches the current traded price for `symbol`.
    fn fetch_price(&self, symbol: &str) -> impl Future<Output = ChartResult<f64>> + Send;
}
