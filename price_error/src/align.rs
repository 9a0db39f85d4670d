//! The price error aligner.
//!
//! Joins the two NEM forecast streams (`P5MIN` and `PREDISPATCH`) against
//! realized dispatch prices and computes a forecast error per (target
//! interval, region, issue time). The two products overlap in the last
//! hour before dispatch; the superseded `PREDISPATCH` runs are removed so
//! every lead time is covered by exactly one stream.

use crate::error::{AlignmentError, Result};
use chrono::{Duration, NaiveDateTime};
use nem_data::{AnalysisWindow, ForecastPrice, ForecastType, PriceDataProvider};
use std::collections::HashMap;

/// One aligned price forecast error row.
///
/// `error` is `None` when no actual price matched the target interval
/// (future intervals, or gaps in the dispatch data); such rows are kept so
/// the output cardinality equals the forecast input cardinality.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceError {
    /// The settlement interval the forecast targeted
    pub forecasted_time: NaiveDateTime,
    /// NEM region identifier
    pub region: String,
    /// Lead time: `forecasted_time - actual_run_time`; never negative
    pub ahead_time: Duration,
    /// Actual price minus forecast price, `None` if no actual matched
    pub error: Option<f64>,
}

/// Forecast row after run-time normalisation, keyed by when the forecast
/// actually became available rather than its nominal run datetime.
#[derive(Debug, Clone)]
struct ForecastRow {
    forecasted_time: NaiveDateTime,
    actual_run_time: NaiveDateTime,
    region: String,
    forecast_price: f64,
}

/// Number of trailing `PREDISPATCH` runs per target that `P5MIN` fully
/// supersedes: the `P5MIN` horizon covers this many `PREDISPATCH` run
/// slots, so the overlap trim is derived from the cadence conventions
/// rather than hardcoded.
pub fn overlap_trim_count() -> usize {
    let p5_horizon = ForecastType::P5min.horizon().num_minutes();
    let pd_cadence = ForecastType::Predispatch.cadence().num_minutes();
    (p5_horizon / pd_cadence) as usize
}

/// Calculate the price error of `PREDISPATCH` and `P5MIN` forecasts for
/// every interval in `[window.start, window.end)`.
///
/// Output rows are exactly the union of overlap-trimmed `PREDISPATCH` and
/// all `P5MIN` forecast rows; the join against actual prices never drops
/// or invents rows.
pub fn calculate_price_error<P: PriceDataProvider>(
    provider: &P,
    window: &AnalysisWindow,
) -> Result<Vec<PriceError>> {
    let actual_prices = get_actual_price_data(provider, window)?;

    let p5_rows = get_forecast_rows(provider, ForecastType::P5min, window)?;
    let pd_rows = get_forecast_rows(provider, ForecastType::Predispatch, window)?;
    if p5_rows.is_empty() && pd_rows.is_empty() {
        return Err(AlignmentError::MissingData(format!(
            "no P5MIN or PREDISPATCH forecasts in {}",
            window
        )));
    }

    let forecast_prices = combine_pd_p5_forecasts(p5_rows, pd_rows);
    process_price_error(forecast_prices, &actual_prices)
}

/// Actual dispatch prices keyed by (settlement interval, region).
///
/// The window is extended backward by the `P5MIN` issue lag so the
/// earliest forecast in the window has a matching actual.
fn get_actual_price_data<P: PriceDataProvider>(
    provider: &P,
    window: &AnalysisWindow,
) -> Result<HashMap<(NaiveDateTime, String), f64>> {
    let fetch_window = window.extended_back(ForecastType::P5min.issue_lag());
    let rows = provider.actual_prices(&fetch_window)?;
    if rows.is_empty() {
        return Err(AlignmentError::MissingData(format!(
            "no actual prices in {}",
            fetch_window
        )));
    }
    Ok(rows
        .into_iter()
        .map(|row| ((row.settlement_time, row.region), row.price))
        .collect())
}

/// Forecasts of one type for the window, intervention rows removed,
/// normalised to actual run times.
fn get_forecast_rows<P: PriceDataProvider>(
    provider: &P,
    forecast_type: ForecastType,
    window: &AnalysisWindow,
) -> Result<Vec<ForecastRow>> {
    let run_window = forecast_type.run_window_for(window);
    let mut rows = provider.forecast_prices(forecast_type, &run_window, window)?;

    // Intervention periods are dropped only where the source table carries
    // the column; its presence is never assumed
    rows.retain(|row| row.intervention != Some(true));

    // Ordering required by the positional overlap trim downstream
    rows.sort_by(|a, b| {
        (a.forecasted_time, a.run_time).cmp(&(b.forecasted_time, b.run_time))
    });

    let lag = forecast_type.issue_lag();
    Ok(rows
        .into_iter()
        .map(|row| normalise_run_time(row, lag))
        .collect())
}

fn normalise_run_time(row: ForecastPrice, lag: Duration) -> ForecastRow {
    ForecastRow {
        forecasted_time: row.forecasted_time,
        actual_run_time: row.run_time - lag,
        region: row.region,
        forecast_price: row.price,
    }
}

/// Combine the two streams, removing the `PREDISPATCH` runs that `P5MIN`
/// supersedes, and re-sort by (forecasted_time, actual_run_time).
fn combine_pd_p5_forecasts(p5_rows: Vec<ForecastRow>, pd_rows: Vec<ForecastRow>) -> Vec<ForecastRow> {
    let mut forecasts = trim_predispatch_overlap(pd_rows);
    forecasts.extend(p5_rows);
    forecasts.sort_by(|a, b| {
        (a.forecasted_time, a.actual_run_time).cmp(&(b.forecasted_time, b.actual_run_time))
    });
    forecasts
}

/// Positional overlap trim: within each (forecasted_time, region) group,
/// sorted by ascending actual run time, drop the final `overlap_trim_count`
/// rows. Groups no larger than the trim count vanish entirely; that is
/// expected for targets near the start of the data, and reported rather
/// than treated as an error.
fn trim_predispatch_overlap(mut rows: Vec<ForecastRow>) -> Vec<ForecastRow> {
    let trim = overlap_trim_count();
    rows.sort_by(|a, b| {
        (a.forecasted_time, &a.region, a.actual_run_time)
            .cmp(&(b.forecasted_time, &b.region, b.actual_run_time))
    });

    let mut kept = Vec::with_capacity(rows.len());
    let mut vanished_groups = 0usize;
    let mut start = 0;
    while start < rows.len() {
        let mut end = start + 1;
        while end < rows.len()
            && rows[end].forecasted_time == rows[start].forecasted_time
            && rows[end].region == rows[start].region
        {
            end += 1;
        }
        let group_len = end - start;
        if group_len <= trim {
            vanished_groups += 1;
        } else {
            kept.extend_from_slice(&rows[start..end - trim]);
        }
        start = end;
    }

    if vanished_groups > 0 {
        tracing::warn!(
            vanished_groups,
            trim,
            "PREDISPATCH groups smaller than the overlap trim contributed no rows"
        );
    }
    kept
}

/// Left-join the merged forecasts to actual prices and derive the output
/// columns. Unmatched forecasts keep a null error.
fn process_price_error(
    forecast_prices: Vec<ForecastRow>,
    actual_prices: &HashMap<(NaiveDateTime, String), f64>,
) -> Result<Vec<PriceError>> {
    let mut output = Vec::with_capacity(forecast_prices.len());
    let mut unmatched = 0usize;

    for row in forecast_prices {
        let ahead_time = row.forecasted_time - row.actual_run_time;
        if ahead_time < Duration::zero() {
            return Err(AlignmentError::NegativeAheadTime {
                forecasted_time: row.forecasted_time,
                region: row.region,
            });
        }

        let key = (row.forecasted_time, row.region);
        let error = match actual_prices.get(&key) {
            Some(actual) => Some(actual - row.forecast_price),
            None => {
                unmatched += 1;
                None
            }
        };
        output.push(PriceError {
            forecasted_time: key.0,
            region: key.1,
            ahead_time,
            error,
        });
    }

    if unmatched > 0 {
        tracing::warn!(
            unmatched,
            total = output.len(),
            "forecast rows had no matching actual price; kept with null error"
        );
    }
    Ok(output)
}
