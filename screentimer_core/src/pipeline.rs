//! Per-sample analysis followed by batch aggregation.
use tracing::{debug, info, warn};

use crate::aggregate::{summarize, validate_trim};
use crate::decoder::to_microseconds;
use crate::error::{AnalysisError, Result as CoreResult};
use crate::features::extract;
use crate::preprocess::preprocess;
use crate::types::{DeviceInfo, Feature, MeasurementBatch, Sample, SummaryStatistics, TimeUnit};

/// What to do with a sample whose light change is too small to measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QualityPolicy {
    /// Fail the whole batch.
    #[default]
    Abort,
    /// Leave the sample out and keep going.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    /// Convert tick time axes to microseconds when device info is available.
    pub apply_tick_conversion: bool,
    /// Fraction of change times trimmed (half from each tail) before fitting.
    pub trim_fraction: f64,
    pub quality_policy: QualityPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            apply_tick_conversion: true,
            trim_fraction: 0.0,
            quality_policy: QualityPolicy::Abort,
        }
    }
}

/// Outcome of analyzing one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Time unit of every time-valued field.
    pub unit: TimeUnit,
    pub features: Vec<Feature>,
    /// Batch indices left out under [`QualityPolicy::Skip`].
    pub skipped: Vec<usize>,
    pub summary: SummaryStatistics,
}

/// Preprocess and extract the features of one sample.
pub fn analyze_sample(index: usize, sample: &Sample) -> Result<Feature, AnalysisError> {
    let trace = preprocess(sample).map_err(|source| AnalysisError::Preprocess { index, source })?;
    extract(&trace).map_err(|source| AnalysisError::SignalQuality { index, source })
}

/// Analyze every sample of a batch and summarize the result.
///
/// `info` is only needed when the batch is still in device ticks and tick
/// conversion is requested.
pub fn analyze_batch(
    batch: &MeasurementBatch,
    info: Option<&DeviceInfo>,
    opts: &PipelineOptions,
) -> CoreResult<Report> {
    validate_trim(opts.trim_fraction)?;

    let convert = match (opts.apply_tick_conversion, batch.unit, info) {
        (true, TimeUnit::Cycles, Some(info)) => Some(info),
        (true, TimeUnit::Cycles, None) => {
            debug!("no device info, keeping tick time axis");
            None
        }
        _ => None,
    };
    let unit = if convert.is_some() {
        TimeUnit::Microseconds
    } else {
        batch.unit
    };

    let mut features = Vec::with_capacity(batch.len());
    let mut skipped = Vec::new();
    for (index, sample) in batch.samples.iter().enumerate() {
        let converted;
        let sample = match convert {
            Some(info) => {
                converted = to_microseconds(sample, info);
                &converted
            }
            None => sample,
        };
        match analyze_sample(index, sample) {
            Ok(feature) => features.push(feature),
            Err(AnalysisError::SignalQuality { index, source })
                if opts.quality_policy == QualityPolicy::Skip =>
            {
                warn!(index, error = %source, "skipping sample");
                skipped.push(index);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let summary = summarize(&features, opts.trim_fraction)?;
    info!(
        samples = batch.len(),
        analyzed = features.len(),
        skipped = skipped.len(),
        "batch analyzed"
    );
    Ok(Report {
        unit,
        features,
        skipped,
        summary,
    })
}
