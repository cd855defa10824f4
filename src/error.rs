//! Error types shared by the normalizer, the fetch layer and the chart session.

use thiserror::Error;

/// Why a raw payload could not be turned into a candle series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// The payload is none of the known shapes (bare array, `output`,
    /// `candleData`, `data`, `data.output`).
    #[error("payload shape not recognised")]
    InvalidShape,
    /// Every record was dropped during validation.
    #[error("no valid candles in payload ({dropped} records dropped)")]
    NoValidCandles { dropped: usize },
}

/// Errors surfaced by `load` and the data sources.
///
/// Cloneable so a single in-flight result can be handed to every caller that
/// was de-duplicated onto it.
#[derive(Debug, Clone, Error)]
pub enum ChartError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("network error: {0}")]
    Network(String),
    #[error("http status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("api error: {0}")]
    Api(String),
    #[error("decode error: {0}")]
    Decode(String),
}

pub type ChartResult<T> = Result<T, ChartError>;

impl From<reqwest::Error> for ChartError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ChartError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

impl ChartError {
    /// True for failures that a manual retry could plausibly fix.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status { status: 500.., .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_error_converts_into_chart_error() {
        let err: ChartError = NormalizeError::NoValidCandles { dropped: 3 }.into();
        assert!(matches!(
            err,
            ChartError::Normalize(NormalizeError::NoValidCandles { dropped: 3 })
        ));
        assert_eq!(err.to_string(), "no valid candles in payload (3 records dropped)");
    }

    #[test]
    fn test_serde_errors_map_to_decode() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ChartError = err.into();
        assert!(matches!(err, ChartError::Decode(_)));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ChartError::Network("reset".into()).is_transient());
        assert!(
            ChartError::Status {
                status: 503,
                message: "busy".into()
            }
            .is_transient()
        );
        assert!(
            !ChartError::Status {
                status: 404,
                message: "missing".into()
            }
            .is_transient()
        );
        assert!(!ChartError::from(NormalizeError::InvalidShape).is_transient());
    }
}
