//! # NEM Price Analysis
//!
//! A toolkit for characterising price forecast errors in Australia's
//! National Electricity Market (NEM).
//!
//! The workspace is split into three crates, re-exported here:
//!
//! - [`nem_data`]: the market data model (dispatch prices, `P5MIN` and
//!   `PREDISPATCH` forecasts) and the data-provider capability used to
//!   source it from CSV caches or synthetic generators.
//! - [`price_error`]: aligns forecast and actual price streams into a
//!   price-error table and persists it as one parquet file per year.
//! - [`error_stats`]: threshold/exceedance counting, discount-curve
//!   fitting and daily price-spread statistics over the aligned errors.
//!
//! ## Example
//!
//! ```
//! use nem_price_analysis::nem_data::{AnalysisWindow, SyntheticProvider};
//! use nem_price_analysis::price_error::calculate_price_error;
//!
//! let window = AnalysisWindow::parse("2021/06/01 00:00:00", "2021/06/02 00:00:00").unwrap();
//! let provider = SyntheticProvider::new(42);
//! let errors = calculate_price_error(&provider, &window).unwrap();
//! assert!(!errors.is_empty());
//! ```

pub use error_stats;
pub use nem_data;
pub use price_error;
