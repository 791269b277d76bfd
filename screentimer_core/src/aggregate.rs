//! Batch-level summary of per-sample features.
use tracing::debug;

use crate::error::AggregationError;
use crate::stats::{fit_normal, fit_uniform, mean, trim_both};
use crate::types::{Feature, SummaryStatistics};

/// Check that a trim fraction lies in `[0, 0.5)`.
pub fn validate_trim(trim_fraction: f64) -> Result<(), AggregationError> {
    if (0.0..0.5).contains(&trim_fraction) {
        Ok(())
    } else {
        Err(AggregationError::InvalidTrimFraction(trim_fraction))
    }
}

/// Summarize a batch of features.
///
/// Change times are sorted and trimmed by `trim_fraction` before the uniform
/// fit; rise times and signal deltas always use every feature.
pub fn summarize(
    features: &[Feature],
    trim_fraction: f64,
) -> Result<SummaryStatistics, AggregationError> {
    validate_trim(trim_fraction)?;

    let deltas: Vec<f64> = features.iter().map(|f| f.signal_delta).collect();
    let risetimes: Vec<f64> = features.iter().map(|f| f.risetime).collect();
    let mut changetimes: Vec<f64> = features.iter().map(|f| f.changetime).collect();
    changetimes.sort_by(f64::total_cmp);
    let kept = trim_both(&changetimes, trim_fraction);

    let signal_mean = mean(&deltas).ok_or(AggregationError::EmptyBatch)?;
    let (loc, scale) = fit_uniform(kept).ok_or(AggregationError::EmptyBatch)?;
    let (risetime_mean, risetime_stddev) =
        fit_normal(&risetimes).ok_or(AggregationError::EmptyBatch)?;

    debug!(
        features = features.len(),
        trimmed = changetimes.len() - kept.len(),
        "batch summarized"
    );
    Ok(SummaryStatistics {
        signal_mean,
        lag_min: loc,
        lag_max: loc + scale,
        risetime_mean,
        risetime_stddev,
    })
}
