//! # Error Stats
//!
//! Statistics over aligned NEM price forecast errors:
//!
//! - **Threshold counting**: how often forecast errors exceed a dollar
//!   threshold, bucketed by forecast lead time ([`threshold`]).
//! - **Discount-curve fitting**: least-squares fits of exponential and
//!   hyperbolic decay models to error-exceedance curves ([`discount`]).
//! - **Price spread**: daily max-min dispatch price spread per region,
//!   the volatility proxy used for market characterisation ([`spread`]).

use thiserror::Error;

pub mod discount;
pub mod spread;
pub mod threshold;

pub use discount::{
    exponential_discount, fit_discount_curves, fit_discount_rate, hyperbolic_discount, rmsd,
    write_fit_summary, DiscountFit,
};
pub use spread::{daily_price_spread, log10_spreads, rolling_mean, DailySpread};
pub use threshold::{
    count_errors_in_bands, default_ahead_time_edges, error_summary, exceedance_by_ahead_time,
    split_by_region, AheadTimeBin, BandCount, ErrorSummary, ExceedanceCurve,
};

/// Errors that can occur in statistical calculations
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for statistics operations
pub type Result<T> = std::result::Result<T, StatsError>;
