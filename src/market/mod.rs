//! Market data: payload normalization, upstream sources, caching, live
//! price polling and the chart view session.

pub mod cache;
pub mod market_data;
pub mod normalizer;
pub mod poller;
pub mod providers;
pub mod session;
pub mod source;

// Re-exports for convenience
pub use cache::SeriesCache;
pub use market_data::{PriceQuote, SeriesEntry, SeriesKey};
pub use normalizer::normalize;
pub use poller::{AlwaysOpen, KrxTradingHours, PricePoller, TradingWindow};
pub use providers::{KisRestSource, SimulatedSource};
pub use session::{ChartSession, LoadStatus, LoadTicket, RenderFrame, load_into};
pub use source::ChartSource;
