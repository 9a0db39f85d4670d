//! # Price Error
//!
//! A Rust library for computing NEM price forecast errors: the difference
//! between what `P5MIN` and `PREDISPATCH` forecast a dispatch price to be
//! and what it settled at, mapped to the lead time of the forecast.
//!
//! ## Pipeline
//!
//! - Fetch actual dispatch prices and both forecast streams for a
//!   half-open analysis window through a [`nem_data::PriceDataProvider`].
//! - Normalise nominal run datetimes to actual availability times.
//! - Remove the trailing `PREDISPATCH` runs per target that `P5MIN`
//!   supersedes (a positional trim derived from the product cadences).
//! - Left-join the merged forecasts to actual prices and derive
//!   `ahead_time` and `error` per row.
//! - Persist one parquet file per analysis year and union them back for
//!   multi-year statistics.
//!
//! ## Quick Start
//!
//! ```
//! use nem_data::{AnalysisWindow, SyntheticProvider};
//! use price_error::calculate_price_error;
//!
//! let window = AnalysisWindow::parse("2021/06/01 00:00:00", "2021/06/01 06:00:00").unwrap();
//! let provider = SyntheticProvider::new(1);
//! let errors = calculate_price_error(&provider, &window).unwrap();
//! assert!(errors.iter().all(|e| e.ahead_time >= chrono::Duration::zero()));
//! ```

pub mod align;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use crate::align::{calculate_price_error, overlap_trim_count, PriceError};
pub use crate::error::AlignmentError;
pub use crate::store::{
    compute_yearly, read_all_price_errors, read_price_errors, write_price_errors, year_file_name,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
