//! # NEM Data
//!
//! `nem_data` is the market data layer for NEM price forecast error
//! analysis. It models the three raw tables the analyses consume:
//!
//! - **Actual dispatch prices** (`DISPATCHPRICE`): one realized price per
//!   5-minute settlement interval and region, non-intervention only.
//! - **`P5MIN` forecasts** (`REGIONSOLUTION`): issued every 5 minutes,
//!   5 minutes before the first interval they target.
//! - **`PREDISPATCH` forecasts** (`PRICE`): issued every 30 minutes,
//!   30 minutes before the first interval they target.
//!
//! Data access goes through the [`PriceDataProvider`] trait so analyses
//! can run against CSV caches of AEMO data ([`CsvCacheProvider`]) or
//! deterministic synthetic data ([`SyntheticProvider`]).

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod cache;
mod provider;
mod synthetic;
mod window;

pub use cache::CsvCacheProvider;
pub use provider::{PriceDataProvider, RunWindow};
pub use synthetic::SyntheticProvider;
pub use window::AnalysisWindow;

/// Datetime format used across AEMO tables and analysis window strings.
pub const DATETIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// The five NEM pricing regions.
pub const REGIONS: [&str; 5] = ["NSW1", "QLD1", "SA1", "TAS1", "VIC1"];

/// Errors that can occur while retrieving market data.
///
/// Empty retrievals are not errors at this layer: providers return empty
/// vectors and callers decide whether an empty window is fatal.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Failed to load data: {0}")]
    DataLoad(String),

    #[error("Invalid analysis window: {0}")]
    InvalidWindow(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for market data operations
pub type Result<T> = std::result::Result<T, MarketDataError>;

/// A realized dispatch price for one settlement interval in one region.
///
/// Intervention re-runs are excluded at retrieval, so there is exactly one
/// row per (settlement_time, region).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualPrice {
    /// End of the 5-minute settlement interval (`SETTLEMENTDATE`)
    pub settlement_time: NaiveDateTime,
    /// NEM region identifier (`REGIONID`), e.g. `NSW1`
    pub region: String,
    /// Regional reference price in $/MWh (`RRP`)
    pub price: f64,
}

/// A single price forecast: one run predicting one future interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPrice {
    /// Nominal run datetime of the forecast
    pub run_time: NaiveDateTime,
    /// The future settlement interval this forecast targets
    pub forecasted_time: NaiveDateTime,
    /// NEM region identifier
    pub region: String,
    /// Forecast regional reference price in $/MWh
    pub price: f64,
    /// Intervention flag; `None` when the source table has no such column
    pub intervention: Option<bool>,
}

/// The two NEM price forecast products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForecastType {
    /// 5-minute predispatch: issued every 5 minutes, hour-ahead horizon
    P5min,
    /// 30-minute predispatch: issued every 30 minutes, horizon to the end
    /// of the next trading day
    Predispatch,
}

impl ForecastType {
    /// Fixed lag between the nominal run datetime and the wall-clock
    /// moment the forecast became available. The "actual run time" of a
    /// forecast is `run_time - issue_lag()`.
    pub fn issue_lag(&self) -> Duration {
        match self {
            ForecastType::P5min => Duration::minutes(5),
            ForecastType::Predispatch => Duration::minutes(30),
        }
    }

    /// Interval between consecutive forecast runs.
    pub fn cadence(&self) -> Duration {
        match self {
            ForecastType::P5min => Duration::minutes(5),
            ForecastType::Predispatch => Duration::minutes(30),
        }
    }

    /// Maximum look-ahead from the nominal run datetime to the last
    /// interval a run targets.
    pub fn horizon(&self) -> Duration {
        match self {
            ForecastType::P5min => Duration::minutes(60),
            // To the end of the next trading day; up to 39.5 hours
            ForecastType::Predispatch => Duration::minutes(2370),
        }
    }

    /// Issue window containing every run that can target an interval in
    /// `window`. Runs earlier than `window.start - horizon` finish before
    /// the window opens; runs at `window.end - cadence` or later only
    /// target intervals past its close.
    pub fn run_window_for(&self, window: &AnalysisWindow) -> RunWindow {
        RunWindow {
            start: window.start() - self.horizon(),
            end: window.end() - self.cadence(),
        }
    }
}

impl std::fmt::Display for ForecastType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastType::P5min => write!(f, "P5MIN"),
            ForecastType::Predispatch => write!(f, "PREDISPATCH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_type_conventions() {
        assert_eq!(ForecastType::P5min.issue_lag(), Duration::minutes(5));
        assert_eq!(ForecastType::Predispatch.issue_lag(), Duration::minutes(30));
        assert_eq!(ForecastType::P5min.cadence(), Duration::minutes(5));
        assert_eq!(ForecastType::Predispatch.cadence(), Duration::minutes(30));
    }

    #[test]
    fn test_run_window_covers_horizon() {
        let window = AnalysisWindow::parse("2021/06/01 00:00:00", "2021/06/02 00:00:00").unwrap();
        let runs = ForecastType::P5min.run_window_for(&window);
        assert_eq!(runs.start, window.start() - Duration::minutes(60));
        assert_eq!(runs.end, window.end() - Duration::minutes(5));
    }

    #[test]
    fn test_forecast_type_display() {
        assert_eq!(ForecastType::P5min.to_string(), "P5MIN");
        assert_eq!(ForecastType::Predispatch.to_string(), "PREDISPATCH");
    }
}
