//! Threshold and exceedance counting over aligned price errors.
//!
//! The central question for forecast consumers is "how often is the
//! forecast wrong by more than X dollars, at a given lead time?". Rows
//! are bucketed by `ahead_time`, and each bucket counts errors whose
//! magnitude reaches the threshold. Rows with a null error (no matching
//! actual price) carry no information and are excluded from both counts.

use crate::{Result, StatsError};
use price_error::PriceError;
use statrs::statistics::{Data, OrderStatistics, Statistics};
use std::collections::BTreeMap;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// One lead-time bucket: `[lower_hours, upper_hours)` against the edges
/// it was built from (the final bucket is closed on the right).
#[derive(Debug, Clone, PartialEq)]
pub struct AheadTimeBin {
    pub lower_hours: f64,
    pub upper_hours: f64,
    /// Rows whose error magnitude reached the threshold
    pub exceeding: usize,
    /// All rows with a known error in the bucket
    pub total: usize,
}

impl AheadTimeBin {
    /// Exceedance fraction, `None` for an empty bucket.
    pub fn fraction(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.exceeding as f64 / self.total as f64)
        }
    }
}

/// Hourly lead-time edges out to one day, then the 39.5 hour PREDISPATCH
/// horizon.
pub fn default_ahead_time_edges() -> Vec<f64> {
    let mut edges: Vec<f64> = (0..=24).map(f64::from).collect();
    edges.push(39.5);
    edges
}

/// Count errors at or above `threshold` dollars magnitude per lead-time
/// bucket defined by `edges_hours`.
pub fn exceedance_by_ahead_time(
    rows: &[PriceError],
    threshold: f64,
    edges_hours: &[f64],
) -> Result<Vec<AheadTimeBin>> {
    if threshold <= 0.0 {
        return Err(StatsError::InvalidInput(format!(
            "threshold must be positive, got {}",
            threshold
        )));
    }
    if edges_hours.len() < 2 {
        return Err(StatsError::InvalidInput(
            "need at least two bin edges".to_string(),
        ));
    }
    if edges_hours.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(StatsError::InvalidInput(
            "bin edges must be strictly increasing".to_string(),
        ));
    }

    let mut bins: Vec<AheadTimeBin> = edges_hours
        .windows(2)
        .map(|pair| AheadTimeBin {
            lower_hours: pair[0],
            upper_hours: pair[1],
            exceeding: 0,
            total: 0,
        })
        .collect();

    let last = bins.len() - 1;
    for row in rows {
        let Some(error) = row.error else { continue };
        let hours = row.ahead_time.num_milliseconds() as f64 / MILLIS_PER_HOUR;
        let index = match bins.iter().position(|b| b.lower_hours <= hours && hours < b.upper_hours)
        {
            Some(i) => i,
            // The final bucket is closed so the horizon edge itself counts
            None if hours == bins[last].upper_hours => last,
            None => continue,
        };
        bins[index].total += 1;
        if error.abs() >= threshold {
            bins[index].exceeding += 1;
        }
    }
    Ok(bins)
}

/// A severity band `(lower, upper]` and the number of errors inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct BandCount {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Count signed errors per half-open `(lower, upper]` severity band.
pub fn count_errors_in_bands(rows: &[PriceError], bands: &[(f64, f64)]) -> Vec<BandCount> {
    bands
        .iter()
        .map(|&(lower, upper)| BandCount {
            lower,
            upper,
            count: rows
                .iter()
                .filter_map(|r| r.error)
                .filter(|e| lower < *e && *e <= upper)
                .count(),
        })
        .collect()
}

/// Split rows per region for region-by-region analysis.
pub fn split_by_region(rows: &[PriceError]) -> BTreeMap<String, Vec<PriceError>> {
    let mut by_region: BTreeMap<String, Vec<PriceError>> = BTreeMap::new();
    for row in rows {
        by_region
            .entry(row.region.clone())
            .or_default()
            .push(row.clone());
    }
    by_region
}

/// Summary statistics of the known errors in a row set.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSummary {
    pub mean: f64,
    pub std_dev: f64,
    /// 95th percentile of the error magnitude
    pub p95_abs: f64,
    pub samples: usize,
}

pub fn error_summary(rows: &[PriceError]) -> Result<ErrorSummary> {
    let errors: Vec<f64> = rows.iter().filter_map(|r| r.error).collect();
    if errors.is_empty() {
        return Err(StatsError::InsufficientData(
            "no rows with a known error".to_string(),
        ));
    }
    let mean = errors.iter().mean();
    let std_dev = if errors.len() > 1 {
        errors.iter().std_dev()
    } else {
        0.0
    };
    let mut magnitudes = Data::new(errors.iter().map(|e| e.abs()).collect::<Vec<f64>>());
    Ok(ErrorSummary {
        mean,
        std_dev,
        p95_abs: magnitudes.percentile(95),
        samples: errors.len(),
    })
}

/// The discount-fit input: lead times (bucket upper edges, in hours) and
/// max-scaled exceedance values `1 - fraction / max_fraction`.
///
/// The first lead-time bucket is excluded before scaling; the fit starts
/// from the second bucket. Empty buckets are skipped; a curve where no
/// remaining bucket exceeds is insufficient to fit against.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceedanceCurve {
    pub times_hours: Vec<f64>,
    pub values: Vec<f64>,
}

impl ExceedanceCurve {
    pub fn from_bins(bins: &[AheadTimeBin]) -> Result<Self> {
        let fractions: Vec<(f64, f64)> = bins
            .iter()
            .skip(1)
            .filter_map(|b| b.fraction().map(|f| (b.upper_hours, f)))
            .collect();
        let max_fraction = fractions.iter().map(|(_, f)| *f).fold(0.0, f64::max);
        if fractions.is_empty() || max_fraction == 0.0 {
            return Err(StatsError::InsufficientData(
                "no exceedances to scale against".to_string(),
            ));
        }
        let (times_hours, values) = fractions
            .into_iter()
            .map(|(t, f)| (t, 1.0 - f / max_fraction))
            .unzip();
        Ok(Self { times_hours, values })
    }

    pub fn len(&self) -> usize {
        self.times_hours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times_hours.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn row(ahead_minutes: i64, error: Option<f64>) -> PriceError {
        PriceError {
            forecasted_time: NaiveDate::from_ymd_opt(2021, 6, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            region: "NSW1".to_string(),
            ahead_time: Duration::minutes(ahead_minutes),
            error,
        }
    }

    #[test]
    fn test_exceedance_buckets_by_lead_time() {
        let rows = vec![
            row(30, Some(500.0)),   // first bucket, exceeds
            row(30, Some(-20.0)),   // first bucket, does not
            row(90, Some(-800.0)),  // second bucket, exceeds
            row(90, None),          // excluded entirely
        ];
        let bins = exceedance_by_ahead_time(&rows, 300.0, &[0.0, 1.0, 2.0]).unwrap();
        assert_eq!(bins.len(), 2);
        assert_eq!((bins[0].exceeding, bins[0].total), (1, 2));
        assert_eq!((bins[1].exceeding, bins[1].total), (1, 1));
        assert_eq!(bins[0].fraction(), Some(0.5));
    }

    #[test]
    fn test_exceedance_rejects_bad_edges() {
        assert!(exceedance_by_ahead_time(&[], 300.0, &[1.0]).is_err());
        assert!(exceedance_by_ahead_time(&[], 300.0, &[1.0, 1.0]).is_err());
        assert!(exceedance_by_ahead_time(&[], -5.0, &[0.0, 1.0]).is_err());
    }

    #[test]
    fn test_final_bucket_includes_horizon_edge() {
        let rows = vec![row((39.5 * 60.0) as i64, Some(400.0))];
        let bins = exceedance_by_ahead_time(&rows, 300.0, &default_ahead_time_edges()).unwrap();
        assert_eq!(bins.last().unwrap().total, 1);
    }

    #[test]
    fn test_band_counts_are_half_open() {
        let rows = vec![
            row(30, Some(300.0)),
            row(30, Some(1000.0)),
            row(30, Some(1000.1)),
        ];
        let bands = count_errors_in_bands(&rows, &[(300.0, 1000.0)]);
        // 300.0 itself is excluded, 1000.0 included
        assert_eq!(bands[0].count, 1);
    }

    #[test]
    fn test_error_summary() {
        let rows = vec![row(30, Some(4.0)), row(30, Some(-4.0)), row(30, None)];
        let summary = error_summary(&rows).unwrap();
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.mean, 0.0);
        assert_eq!(summary.p95_abs, 4.0);
        assert!(error_summary(&[row(30, None)]).is_err());
    }

    #[test]
    fn test_curve_is_max_scaled() {
        let bins = vec![
            AheadTimeBin { lower_hours: 0.0, upper_hours: 1.0, exceeding: 9, total: 10 },
            AheadTimeBin { lower_hours: 1.0, upper_hours: 2.0, exceeding: 4, total: 10 },
            AheadTimeBin { lower_hours: 2.0, upper_hours: 3.0, exceeding: 1, total: 10 },
            AheadTimeBin { lower_hours: 3.0, upper_hours: 4.0, exceeding: 0, total: 0 },
        ];
        let curve = ExceedanceCurve::from_bins(&bins).unwrap();
        // First bucket excluded (its 0.9 fraction does not set the max),
        // empty bucket dropped, values scaled against the 0.4 maximum
        assert_eq!(curve.times_hours, vec![2.0, 3.0]);
        assert_eq!(curve.values, vec![0.0, 0.75]);
    }

    #[test]
    fn test_curve_starts_at_the_second_bucket() {
        // Exceedances only in the first bucket leave nothing to fit
        let bins = vec![
            AheadTimeBin { lower_hours: 0.0, upper_hours: 1.0, exceeding: 5, total: 10 },
            AheadTimeBin { lower_hours: 1.0, upper_hours: 2.0, exceeding: 0, total: 10 },
        ];
        assert!(ExceedanceCurve::from_bins(&bins).is_err());
    }

    #[test]
    fn test_curve_needs_at_least_one_exceedance() {
        let bins = vec![
            AheadTimeBin { lower_hours: 0.0, upper_hours: 1.0, exceeding: 2, total: 10 },
            AheadTimeBin { lower_hours: 1.0, upper_hours: 2.0, exceeding: 0, total: 10 },
        ];
        assert!(ExceedanceCurve::from_bins(&bins).is_err());
    }

    #[test]
    fn test_split_by_region() {
        let mut rows = vec![row(30, Some(1.0)), row(60, Some(2.0))];
        rows[1].region = "VIC1".to_string();
        let by_region = split_by_region(&rows);
        assert_eq!(by_region.len(), 2);
        assert_eq!(by_region["NSW1"].len(), 1);
        assert_eq!(by_region["VIC1"].len(), 1);
    }
}
