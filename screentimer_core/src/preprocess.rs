//! Resampling and smoothing of raw traces.
//!
//! Device timestamps are jittery, so every trace is first put on a uniform
//! grid with the same number of points, then smoothed with a short trailing
//! moving average. The ends of the smoothed series carry the most
//! interpolation error and are cut off before feature extraction.
use tracing::trace;

use crate::error::PreprocessError;
use crate::types::Sample;

/// Moving-average window, in samples.
pub const SMOOTHING_WINDOW: usize = 5;
/// Points removed from each end of the smoothed series.
pub const EDGE_TRIM: usize = 2;

/// A trace on a uniform time grid with smoothed, real-valued light levels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UniformTrace {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl UniformTrace {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let (times, values) = points.into_iter().unzip();
        Self { times, values }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// `n` evenly spaced points from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n - 1).map(|i| start + step * i as f64).collect();
            out.push(stop);
            out
        }
    }
}

/// Piecewise-linear interpolation of `(xp, fp)` at `x`.
///
/// `xp` must be non-decreasing. Points outside the range take the value of
/// the nearest end; on duplicate timestamps the later value wins.
pub fn interpolate(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    let Some(&last) = fp.last() else {
        return f64::NAN;
    };
    let hi = xp.partition_point(|&t| t <= x);
    if hi == 0 {
        return fp[0];
    }
    if hi == xp.len() {
        return last;
    }
    let lo = hi - 1;
    // xp[lo] <= x < xp[hi], so the span is never zero
    let frac = (x - xp[lo]) / (xp[hi] - xp[lo]);
    fp[lo] + (fp[hi] - fp[lo]) * frac
}

/// Put a sample on a uniform grid of the same length spanning its time range.
pub fn resample(sample: &Sample) -> Result<UniformTrace, PreprocessError> {
    let times = sample.times();
    if times.len() < 2 {
        return Err(PreprocessError::InsufficientSamples { len: times.len() });
    }
    let values: Vec<f64> = sample.values().iter().map(|&v| v as f64).collect();
    let grid = linspace(times[0], times[times.len() - 1], times.len());
    Ok(UniformTrace::from_points(
        grid.into_iter()
            .map(|t| (t, interpolate(t, times, &values))),
    ))
}

/// Trailing moving average; the output is `window - 1` shorter than the input.
///
/// `out[i] = mean(values[i ..= i + window - 1])`. Returns an empty vector if
/// the input is shorter than the window.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }
    let n = window as f64;
    let mut out = Vec::with_capacity(values.len() - window + 1);
    let mut sum: f64 = values[..window].iter().sum();
    out.push(sum / n);
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out.push(sum / n);
    }
    out
}

/// Resample, smooth and edge-trim one trace.
///
/// Each smoothed value is placed at the centre of its window, and
/// [`EDGE_TRIM`] points are then dropped from both ends, so the result is
/// `SMOOTHING_WINDOW - 1 + 2 * EDGE_TRIM` points shorter than the input.
pub fn preprocess(sample: &Sample) -> Result<UniformTrace, PreprocessError> {
    let uniform = resample(sample)?;
    let len = uniform.len();
    let shrink = SMOOTHING_WINDOW - 1 + 2 * EDGE_TRIM;
    if len <= shrink {
        return Err(PreprocessError::TraceTooShort {
            len,
            window: SMOOTHING_WINDOW,
            edge: EDGE_TRIM,
        });
    }

    let smoothed = moving_average(uniform.values(), SMOOTHING_WINDOW);
    let kept = &smoothed[EDGE_TRIM..smoothed.len() - EDGE_TRIM];
    let offset = (SMOOTHING_WINDOW - 1) / 2 + EDGE_TRIM;
    let times = &uniform.times()[offset..offset + kept.len()];
    trace!(input = len, output = kept.len(), "preprocessed trace");
    Ok(UniformTrace::from_points(
        times.iter().copied().zip(kept.iter().copied()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn linspace_hits_both_ends() {
        assert_eq!(linspace(0.0, 4.0, 5), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(linspace(3.0, 3.0, 3), vec![3.0, 3.0, 3.0]);
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
        assert!(linspace(1.0, 2.0, 0).is_empty());
    }

    #[test]
    fn interpolate_between_and_beyond() {
        let xp = [0.0, 2.0, 4.0];
        let fp = [0.0, 10.0, 30.0];
        assert!(approx(interpolate(1.0, &xp, &fp), 5.0));
        assert!(approx(interpolate(3.0, &xp, &fp), 20.0));
        assert!(approx(interpolate(-1.0, &xp, &fp), 0.0));
        assert!(approx(interpolate(9.0, &xp, &fp), 30.0));
        assert!(approx(interpolate(2.0, &xp, &fp), 10.0));
    }

    #[test]
    fn interpolate_with_flat_timestamps() {
        let xp = [0.0, 1.0, 1.0, 2.0];
        let fp = [0.0, 4.0, 8.0, 10.0];
        assert!(approx(interpolate(1.0, &xp, &fp), 8.0));
        assert!(approx(interpolate(1.5, &xp, &fp), 9.0));
        assert!(approx(interpolate(0.5, &xp, &fp), 2.0));
    }

    #[test]
    fn resample_keeps_length_and_span() {
        let s = Sample::from_points(0, [(0.0, 0), (1.0, 10), (4.0, 40)]);
        let r = resample(&s).unwrap();
        assert_eq!(r.times(), &[0.0, 2.0, 4.0]);
        assert!(approx(r.values()[1], 20.0));
    }

    #[test]
    fn resample_needs_two_points() {
        let s = Sample::from_points(0, [(0.0, 1)]);
        assert_eq!(
            resample(&s),
            Err(PreprocessError::InsufficientSamples { len: 1 })
        );
    }

    #[test]
    fn moving_average_window_five() {
        let v: Vec<f64> = (0..7).map(f64::from).collect();
        assert_eq!(moving_average(&v, 5), vec![2.0, 3.0, 4.0]);
        assert!(moving_average(&v[..4], 5).is_empty());
    }

    #[test]
    fn preprocess_output_alignment() {
        let s = Sample::from_points(0, (0..12).map(|i| (f64::from(i), i64::from(i) * 10)));
        let p = preprocess(&s).unwrap();
        assert_eq!(p.len(), 4);
        // A linear ramp is unchanged by a centred average
        assert_eq!(p.times(), &[4.0, 5.0, 6.0, 7.0]);
        for (t, v) in p.times().iter().zip(p.values()) {
            assert!(approx(*v, t * 10.0));
        }
    }

    #[test]
    fn preprocess_length_boundary() {
        let nine = Sample::from_points(0, (0..9).map(|i| (f64::from(i), 0)));
        assert_eq!(preprocess(&nine).unwrap().len(), 1);

        let eight = Sample::from_points(0, (0..8).map(|i| (f64::from(i), 0)));
        assert_eq!(
            preprocess(&eight),
            Err(PreprocessError::TraceTooShort {
                len: 8,
                window: SMOOTHING_WINDOW,
                edge: EDGE_TRIM
            })
        );
    }
}
