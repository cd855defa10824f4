//! Candle primitives and the per-candle / per-slice computations layered on them

pub mod candle;
pub mod moving_averages;
pub mod period;
pub mod price_range;
