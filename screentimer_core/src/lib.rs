#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Display latency measurement core (hardware-agnostic).
//!
//! The device presses a key on the host and records the light level seen by
//! a sensor taped to the screen. This crate talks to it through the
//! `screentimer_traits::DeviceLink` trait and turns the recorded traces into
//! latency figures.
//!
//! ## Stages
//!
//! - **Protocol**: handshake, key setup, info, calibration and measurement
//!   commands (`protocol` module), with binary frame decoding in `decoder`
//! - **Preprocessing**: uniform resampling and moving-average smoothing
//! - **Features**: rise, risetime and 50% crossing per trace
//! - **Aggregation**: uniform fit of change times, normal fit of rise times
//! - **Log codec**: the text format passed from acquisition to analysis
//!
//! `session` and `pipeline` chain the stages for the CLI.

pub mod aggregate;
pub mod conversions;
pub mod decoder;
pub mod error;
pub mod features;
pub mod link_error;
pub mod logfmt;
pub mod mocks;
pub mod pipeline;
pub mod preprocess;
pub mod protocol;
pub mod session;
pub mod stats;
pub mod status;
pub mod types;
pub mod util;

pub use aggregate::summarize;
pub use decoder::{decode_frames, to_microseconds};
pub use error::{
    AggregationError, AnalysisError, LogFormatError, LogFormatErrorKind, PreprocessError,
    ProtocolError, SignalQualityError,
};
pub use features::extract;
pub use logfmt::{read_measurement_log, write_measurement_log};
pub use pipeline::{PipelineOptions, QualityPolicy, Report, analyze_batch, analyze_sample};
pub use preprocess::{UniformTrace, preprocess};
pub use protocol::ProtocolClient;
pub use session::{Acquisition, SessionCfg, query_device, run_calibration, run_session};
pub use status::SessionState;
pub use types::{DeviceInfo, Feature, MeasurementBatch, Sample, SummaryStatistics, TimeUnit};
