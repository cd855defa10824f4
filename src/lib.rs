//! Candlestick charting core for the 투싹증권 trading simulator.
//!
//! Raw upstream payloads are normalized into candles, annotated with moving
//! averages, cached per `(symbol, period)` and exposed through a scrollable,
//! zoomable view window that maps onto screen coordinates.

pub mod chart;
pub mod config;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod market;

pub use config::ChartConfig;
pub use error::{ChartError, ChartResult, NormalizeError};
pub use indicators::candle::Candle;
pub use indicators::period::Period;
pub use indicators::price_range::PriceRange;
