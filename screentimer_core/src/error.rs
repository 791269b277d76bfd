use thiserror::Error;

use crate::status::SessionState;
use crate::types::TimeUnit;

/// Device conversation failures. Always fatal to the current session.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("device did not greet with HELO (got {actual:?}); is this a ScreenTimer?")]
    UnexpectedGreeting { actual: String },
    #[error("device rejected command {command} (expected \"ACPT\\n\", got {actual:?})")]
    Rejected {
        command: &'static str,
        actual: String,
    },
    #[error("unexpected response to {command}: expected {expected:?}, got {actual:?}")]
    UnexpectedResponse {
        command: &'static str,
        expected: &'static str,
        actual: String,
    },
    #[error("malformed info response {actual:?}")]
    MalformedInfo { actual: String },
    #[error("malformed calibration line {actual:?}")]
    MalformedFrame { actual: String },
    #[error("device reported calibration failure")]
    CalibrationFailed,
    #[error("device reported measurement failure after {frames_received} frames")]
    MeasurementFailed { frames_received: usize },
    #[error("timeout waiting for device")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("command {command} not allowed while the session is {state}")]
    OutOfSequence {
        command: &'static str,
        state: SessionState,
    },
    #[error("session already failed; open a new one")]
    SessionFailed,
}

/// Resampling/smoothing cannot run on this trace.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PreprocessError {
    #[error("need at least 2 samples to resample, got {len}")]
    InsufficientSamples { len: usize },
    #[error("trace of {len} samples leaves nothing after smoothing (window {window}, edge trim {edge})")]
    TraceTooShort {
        len: usize,
        window: usize,
        edge: usize,
    },
}

/// The trace is well-formed but unusable as a light transition.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignalQualityError {
    #[error("no significant change in light level (rise {rise}, need at least {threshold})")]
    InsufficientContrast { rise: f64, threshold: f64 },
    #[error("non-finite value {value} at index {index}")]
    NonFinite { index: usize, value: f64 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AggregationError {
    #[error("cannot summarize an empty batch")]
    EmptyBatch,
    #[error("trim fraction {0} outside [0, 0.5)")]
    InvalidTrimFraction(f64),
}

/// Per-sample analysis failure, tagged with the sample's batch index.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("sample {index}: {source}")]
    Preprocess {
        index: usize,
        #[source]
        source: PreprocessError,
    },
    #[error("sample {index}: {source}")]
    SignalQuality {
        index: usize,
        #[source]
        source: SignalQualityError,
    },
}

/// Measurement log could not be parsed.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("measurement log line {line}: {kind}")]
pub struct LogFormatError {
    pub line: usize,
    pub kind: LogFormatErrorKind,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LogFormatErrorKind {
    #[error("expected \"Measurement <index>\", got {0:?}")]
    MissingHeader(String),
    #[error("expected \"variance = <uint>\", got {0:?}")]
    MissingVariance(String),
    #[error("expected \"Time(<unit>);Light(unitless)\", got {0:?}")]
    MissingColumns(String),
    #[error("expected \"<time>;<value>\", got {0:?}")]
    BadRow(String),
    #[error("time {actual} is earlier than the previous row's {previous}")]
    TimeWentBackwards { previous: f64, actual: f64 },
    #[error("block is in {actual} but the batch is in {expected}")]
    MixedUnits { expected: TimeUnit, actual: TimeUnit },
    #[error("unexpected end of log")]
    UnexpectedEnd,
    #[error("read failed: {0}")]
    Io(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
