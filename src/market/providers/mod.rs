//! Chart data provider implementations.

pub mod kis;
pub mod simulated;

// Re-export for convenience
pub use kis::KisRestSource;
pub use simulated::SimulatedSource;
