//! Error types for the price_error crate

use chrono::NaiveDateTime;
use nem_data::MarketDataError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while aligning forecasts with dispatch outcomes or while
/// persisting the aligned table.
#[derive(Debug, Error)]
pub enum AlignmentError {
    /// A requested window has no retrievable actual or forecast rows.
    /// Distinct from a window that joins to nulls: those rows are kept.
    #[error("No data in window: {0}")]
    MissingData(String),

    /// A forecast claims to predict its own past; the input data is broken
    #[error("Negative ahead time for {region} at {forecasted_time}")]
    NegativeAheadTime {
        forecasted_time: NaiveDateTime,
        region: String,
    },

    /// Failure in the underlying data provider
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    Polars(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, AlignmentError>;

impl From<PolarsError> for AlignmentError {
    fn from(err: PolarsError) -> Self {
        AlignmentError::Polars(err.to_string())
    }
}
