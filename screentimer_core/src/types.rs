//! Value types shared across the acquisition and analysis stages.
use std::fmt;
use std::str::FromStr;

use crate::util::us_per_tick;

/// Device parameters reported by the `I` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Timer ticks per second.
    pub resolution: u32,
}

impl DeviceInfo {
    pub fn us_per_tick(&self) -> f64 {
        us_per_tick(self.resolution)
    }
}

/// Unit of a sample's time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    /// Raw device timer ticks.
    #[default]
    Cycles,
    Microseconds,
}

impl TimeUnit {
    pub fn label(self) -> &'static str {
        match self {
            TimeUnit::Cycles => "cycles",
            TimeUnit::Microseconds => "us",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cycles" => Ok(TimeUnit::Cycles),
            "us" => Ok(TimeUnit::Microseconds),
            other => Err(format!("unknown time unit '{other}'")),
        }
    }
}

/// One light-level trace as captured by the device.
///
/// `times` and `values` always have the same length. A `Sample` is never
/// modified after construction; conversions return a new one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sample {
    variance: u16,
    times: Vec<f64>,
    values: Vec<i64>,
}

impl Sample {
    pub fn from_points(variance: u16, points: impl IntoIterator<Item = (f64, i64)>) -> Self {
        let (times, values) = points.into_iter().unzip();
        Self {
            variance,
            times,
            values,
        }
    }

    pub fn variance(&self) -> u16 {
        self.variance
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, i64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// Same values on a rescaled time axis.
    pub(crate) fn map_times(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            variance: self.variance,
            times: self.times.iter().map(|&t| f(t)).collect(),
            values: self.values.clone(),
        }
    }
}

/// Every sample captured in one acquisition run, sharing one time unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeasurementBatch {
    pub unit: TimeUnit,
    pub samples: Vec<Sample>,
}

impl MeasurementBatch {
    pub fn new(unit: TimeUnit) -> Self {
        Self {
            unit,
            samples: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Latency features of one transition trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feature {
    /// Total light change between the first and last point.
    pub signal_delta: f64,
    /// Time from leaving the initial 10% band to entering the final one.
    pub risetime: f64,
    /// Time of the 50% crossing.
    pub changetime: f64,
}

/// Batch-level latency report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStatistics {
    pub signal_mean: f64,
    pub lag_min: f64,
    pub lag_max: f64,
    pub risetime_mean: f64,
    pub risetime_stddev: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_keeps_lengths_equal() {
        let s = Sample::from_points(3, [(0.0, 10), (1.5, 12), (4.0, 30)]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.times(), &[0.0, 1.5, 4.0]);
        assert_eq!(s.values(), &[10, 12, 30]);
        assert_eq!(s.variance(), 3);
    }

    #[test]
    fn time_unit_labels_round_trip() {
        for unit in [TimeUnit::Cycles, TimeUnit::Microseconds] {
            assert_eq!(unit.label().parse::<TimeUnit>(), Ok(unit));
        }
        assert!("ms".parse::<TimeUnit>().is_err());
    }
}
