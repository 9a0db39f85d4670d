//! The data-provider capability: analyses never touch raw files or network
//! caches directly, they ask a [`PriceDataProvider`] for rows.

use crate::{ActualPrice, AnalysisWindow, ForecastPrice, ForecastType, Result};
use chrono::NaiveDateTime;

/// A half-open `[start, end)` range of forecast run datetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl RunWindow {
    /// Whether a nominal run datetime falls inside the window.
    pub fn contains(&self, run_time: NaiveDateTime) -> bool {
        self.start <= run_time && run_time < self.end
    }
}

/// Source of actual and forecast price rows for an analysis window.
///
/// Implementations own the mechanics of retrieval (CSV caches, synthetic
/// generation); the contract is about the rows returned:
///
/// - `actual_prices` returns only non-intervention records, one per
///   (settlement_time, region) within the window.
/// - `forecast_prices` returns rows whose run datetime lies in
///   `run_window` and whose target lies in `window`. Intervention-period
///   rows may still be present; callers filter on
///   [`ForecastPrice::intervention`] where the flag exists.
///
/// Empty result sets are returned as empty vectors, not errors; whether an
/// empty window is an error is the caller's decision.
pub trait PriceDataProvider {
    /// Realized dispatch prices for the window.
    fn actual_prices(&self, window: &AnalysisWindow) -> Result<Vec<ActualPrice>>;

    /// Forecast prices of the given type, restricted to runs in
    /// `run_window` and targets in `window`.
    fn forecast_prices(
        &self,
        forecast_type: ForecastType,
        run_window: &RunWindow,
        window: &AnalysisWindow,
    ) -> Result<Vec<ForecastPrice>>;
}
