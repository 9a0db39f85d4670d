//! Daily price-spread statistics.
//!
//! The daily max-min spread of dispatch prices per region is the
//! volatility proxy used to characterise market conditions, usually
//! viewed on a log10 scale with a rolling average over two months.

use crate::{Result, StatsError};
use chrono::NaiveDate;
use nem_data::ActualPrice;
use std::collections::BTreeMap;

// Spreads below one cent are indistinguishable from flat days; the floor
// keeps the log scale finite for them
const SPREAD_FLOOR: f64 = 0.01;

/// Max-min dispatch price spread for one region-day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySpread {
    pub date: NaiveDate,
    pub region: String,
    pub spread: f64,
}

/// Daily price spread per (region, day), ordered by region then date.
pub fn daily_price_spread(actuals: &[ActualPrice]) -> Vec<DailySpread> {
    let mut extremes: BTreeMap<(String, NaiveDate), (f64, f64)> = BTreeMap::new();
    for row in actuals {
        let key = (row.region.clone(), row.settlement_time.date());
        let entry = extremes.entry(key).or_insert((row.price, row.price));
        entry.0 = entry.0.min(row.price);
        entry.1 = entry.1.max(row.price);
    }
    extremes
        .into_iter()
        .map(|((region, date), (min, max))| DailySpread {
            date,
            region,
            spread: max - min,
        })
        .collect()
}

/// Spreads on a log10 scale, floored to keep flat days finite.
pub fn log10_spreads(spreads: &[DailySpread]) -> Vec<f64> {
    spreads
        .iter()
        .map(|s| s.spread.max(SPREAD_FLOOR).log10())
        .collect()
}

/// Trailing rolling mean over a fixed window; output has
/// `len - window + 1` points.
pub fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<f64>> {
    if window == 0 {
        return Err(StatsError::InvalidInput(
            "window must be at least 1".to_string(),
        ));
    }
    if values.len() < window {
        return Err(StatsError::InsufficientData(format!(
            "need at least {} values, got {}",
            window,
            values.len()
        )));
    }
    Ok(values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDateTime;
    use nem_data::DATETIME_FORMAT;

    fn actual(time: &str, region: &str, price: f64) -> ActualPrice {
        ActualPrice {
            settlement_time: NaiveDateTime::parse_from_str(time, DATETIME_FORMAT).unwrap(),
            region: region.to_string(),
            price,
        }
    }

    #[test]
    fn test_daily_spread_per_region_day() {
        let actuals = vec![
            actual("2021/06/01 12:00:00", "NSW1", 40.0),
            actual("2021/06/01 18:00:00", "NSW1", 290.0),
            actual("2021/06/02 12:00:00", "NSW1", 60.0),
            actual("2021/06/01 12:00:00", "VIC1", 55.0),
        ];
        let spreads = daily_price_spread(&actuals);
        assert_eq!(spreads.len(), 3);
        assert_eq!(spreads[0].region, "NSW1");
        assert_eq!(spreads[0].spread, 250.0);
        assert_eq!(spreads[1].spread, 0.0);
        assert_eq!(spreads[2].region, "VIC1");
    }

    #[test]
    fn test_log10_floor_keeps_flat_days_finite() {
        let spreads = vec![
            DailySpread {
                date: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
                region: "TAS1".to_string(),
                spread: 0.0,
            },
            DailySpread {
                date: NaiveDate::from_ymd_opt(2021, 6, 2).unwrap(),
                region: "TAS1".to_string(),
                spread: 100.0,
            },
        ];
        let logs = log10_spreads(&spreads);
        assert!(logs[0].is_finite());
        assert_relative_eq!(logs[1], 2.0);
    }

    #[test]
    fn test_rolling_mean() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        let means = rolling_mean(&values, 2).unwrap();
        assert_eq!(means, vec![1.5, 2.5, 3.5]);
        assert!(rolling_mean(&values, 0).is_err());
        assert!(rolling_mean(&values, 5).is_err());
    }
}
