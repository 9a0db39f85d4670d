//! Discount-curve fitting.
//!
//! Error-exceedance curves fall away with lead time in a way that
//! resembles temporal discounting, so two one-parameter decay models are
//! fitted to each max-scaled curve and compared by RMSD:
//!
//! - exponential: `exp(-rate * t)`
//! - hyperbolic: `1 / (1 + rate * t)`

use crate::threshold::ExceedanceCurve;
use crate::{Result, StatsError};
use serde::Serialize;
use std::path::Path;

/// Upper bound of the rate search. Observed rates are well below one per
/// hour; the bound only has to bracket the minimum.
const RATE_UPPER_BOUND: f64 = 100.0;
const GOLDEN_SECTION_ITERATIONS: usize = 200;

/// Exponential discount factor at lead time `t` hours.
pub fn exponential_discount(t: f64, rate: f64) -> f64 {
    (-rate * t).exp()
}

/// Hyperbolic discount factor at lead time `t` hours.
pub fn hyperbolic_discount(t: f64, rate: f64) -> f64 {
    1.0 / (1.0 + rate * t)
}

fn sum_squared_error<F>(model: &F, rate: f64, times: &[f64], values: &[f64]) -> f64
where
    F: Fn(f64, f64) -> f64,
{
    times
        .iter()
        .zip(values.iter())
        .map(|(&t, &v)| (model(t, rate) - v).powi(2))
        .sum()
}

/// Least-squares fit of a one-parameter discount model.
///
/// The squared-error surface of both models is unimodal in the rate, so a
/// golden-section search over `[0, RATE_UPPER_BOUND]` converges to the
/// least-squares rate without derivatives.
pub fn fit_discount_rate<F>(model: F, times: &[f64], values: &[f64]) -> Result<f64>
where
    F: Fn(f64, f64) -> f64,
{
    if times.len() != values.len() || times.is_empty() {
        return Err(StatsError::InvalidInput(
            "times and values must have the same non-zero length".to_string(),
        ));
    }
    if times.len() < 2 {
        return Err(StatsError::InsufficientData(
            "need at least two points to fit a rate".to_string(),
        ));
    }

    let golden = (5f64.sqrt() - 1.0) / 2.0;
    let mut lower = 0.0;
    let mut upper = RATE_UPPER_BOUND;
    for _ in 0..GOLDEN_SECTION_ITERATIONS {
        let mid_low = upper - golden * (upper - lower);
        let mid_high = lower + golden * (upper - lower);
        if sum_squared_error(&model, mid_low, times, values)
            < sum_squared_error(&model, mid_high, times, values)
        {
            upper = mid_high;
        } else {
            lower = mid_low;
        }
    }
    Ok((lower + upper) / 2.0)
}

/// Root-mean-square deviation of a fitted model from the data.
pub fn rmsd<F>(model: F, rate: f64, times: &[f64], values: &[f64]) -> f64
where
    F: Fn(f64, f64) -> f64,
{
    if times.is_empty() {
        return 0.0;
    }
    (sum_squared_error(&model, rate, times, values) / times.len() as f64).sqrt()
}

/// Fitted rates and deviations of both discount models for one threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountFit {
    pub threshold: f64,
    pub exp_rate: f64,
    pub hyp_rate: f64,
    pub exp_rmsd: f64,
    pub hyp_rmsd: f64,
}

/// Fit both discount models to a max-scaled exceedance curve.
///
/// The curve values `1 - frac/frac_max` start near one at short lead
/// times and decay towards zero where exceedances peak, which is exactly
/// the shape of a discount factor, so the models are fitted to the
/// values directly.
pub fn fit_discount_curves(threshold: f64, curve: &ExceedanceCurve) -> Result<DiscountFit> {
    let times = &curve.times_hours;
    let values = &curve.values;

    let exp_rate = fit_discount_rate(exponential_discount, times, values)?;
    let hyp_rate = fit_discount_rate(hyperbolic_discount, times, values)?;
    Ok(DiscountFit {
        threshold,
        exp_rate,
        hyp_rate,
        exp_rmsd: rmsd(exponential_discount, exp_rate, times, values),
        hyp_rmsd: rmsd(hyperbolic_discount, hyp_rate, times, values),
    })
}

/// Write the per-threshold fit summary as CSV, one row per threshold.
pub fn write_fit_summary<P: AsRef<Path>>(path: P, fits: &[DiscountFit]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for fit in fits {
        writer.serialize(fit)?;
    }
    writer.flush()?;
    Ok(())
}
