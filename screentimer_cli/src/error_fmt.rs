//! Human-readable error descriptions and structured JSON error formatting.

use screentimer_core::{
    AggregationError, AnalysisError, LogFormatError, PreprocessError, ProtocolError,
    SignalQualityError,
};
use screentimer_hardware::HwError;
use serde_json::{Value, json};

use crate::cli::CliError;

fn explain(what: impl std::fmt::Display, causes: &str, fix: &str) -> String {
    format!("What happened: {what}.\nLikely causes: {causes}\nHow to fix: {fix}")
}

fn humanize_protocol(pe: &ProtocolError) -> String {
    match pe {
        ProtocolError::UnexpectedGreeting { actual } => explain(
            format!("The device did not greet with HELO (got {actual:?})"),
            "Wrong serial port, another program holds the device, or the firmware is not ScreenTimer.",
            "Set device.port to the ScreenTimer port or unplug other Teensy boards, then reconnect.",
        ),
        ProtocolError::Rejected { command, .. } => explain(
            format!("The device rejected the {command} command"),
            "Key codes out of range or the firmware did not understand the command.",
            "Check [keys] test/reset in the config (HID usage codes 0-255).",
        ),
        ProtocolError::Timeout => explain(
            "The device stopped answering",
            "USB cable unplugged, device reset, or device.read_timeout_ms too low.",
            "Reconnect the device and consider raising device.read_timeout_ms.",
        ),
        ProtocolError::CalibrationFailed => explain(
            "The device reported a calibration failure",
            "The light sensor is not attached or saturated.",
            "Check the sensor placement and rerun `screentimer calibrate`.",
        ),
        ProtocolError::MeasurementFailed { frames_received } => explain(
            format!("The device aborted the measurement after {frames_received} frames"),
            "The key press was not delivered or the sensor read failed on the device.",
            "Make sure the host accepts the device keyboard and the test window has focus.",
        ),
        ProtocolError::Transport(msg) => explain(
            format!("Talking to the device failed ({msg})"),
            "The device disconnected or sent a truncated response.",
            "Reconnect the device and start a new run.",
        ),
        other => explain(
            other,
            "The device and this tool disagree on the protocol.",
            "Update the firmware and re-run with --log-level=debug to see the exchange.",
        ),
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::Config(msg) => explain(
                format!("Invalid configuration ({msg})"),
                "Missing or out-of-range values in the TOML.",
                "Edit the config file, then rerun.",
            ),
            CliError::Usage(msg) => explain(
                format!("Invalid argument ({msg})"),
                "A command-line value is out of range.",
                "See `screentimer --help`.",
            ),
        };
    }

    if let Some(pe) = err.downcast_ref::<ProtocolError>() {
        return humanize_protocol(pe);
    }

    if let Some(HwError::DeviceNotFound { vid, pid }) = err.downcast_ref::<HwError>() {
        return explain(
            format!("No ScreenTimer found (USB {vid:04x}:{pid:04x})"),
            "The device is unplugged or enumerates with different IDs.",
            "Plug in the device or set device.port explicitly.",
        );
    }

    if let Some(ae) = err.downcast_ref::<AnalysisError>() {
        return match ae {
            AnalysisError::SignalQuality {
                index,
                source: SignalQualityError::InsufficientContrast { .. },
            } => explain(
                format!("Sample {index} shows no significant change in light level"),
                "The sensor is not over the area that changes, or the key press had no visible effect.",
                "Reposition the sensor over the area that changes. For a batch, `screentimer analyze --skip-low-contrast` leaves such samples out.",
            ),
            AnalysisError::SignalQuality { index, source } => explain(
                format!("Sample {index} is unusable ({source})"),
                "The measurement log was edited or corrupted.",
                "Re-record the batch with `screentimer measure`.",
            ),
            AnalysisError::Preprocess { index, source } => explain(
                format!("Sample {index} could not be preprocessed ({source})"),
                "The trace is too short to resample and smooth.",
                "Re-record the batch; every trace needs at least 9 points.",
            ),
        };
    }

    if let Some(pe) = err.downcast_ref::<PreprocessError>() {
        return explain(
            format!("The trace could not be preprocessed ({pe})"),
            "The trace is too short to resample and smooth.",
            "Record a longer trace.",
        );
    }

    if let Some(se) = err.downcast_ref::<SignalQualityError>() {
        return explain(
            format!("The trace is unusable ({se})"),
            "The sensor saw no significant change in light level.",
            "Reposition the sensor over the changing area and record again.",
        );
    }

    if let Some(ag) = err.downcast_ref::<AggregationError>() {
        return match ag {
            AggregationError::EmptyBatch => explain(
                "No samples were left to summarize",
                "The log is empty or every sample was skipped.",
                "Record more samples or check sensor placement.",
            ),
            AggregationError::InvalidTrimFraction(t) => explain(
                format!("Trim fraction {t} is out of range"),
                "The fraction must be at least 0 and below 0.5.",
                "Pass e.g. --trim 0.1.",
            ),
        };
    }

    if let Some(le) = err.downcast_ref::<LogFormatError>() {
        return explain(
            format!("The measurement log is malformed at line {} ({})", le.line, le.kind),
            "The file was not produced by `screentimer measure` or was truncated.",
            "Re-record the batch or fix the reported line.",
        );
    }

    // String-based heuristics over the whole chain for errors coming from file handling
    let msg = err.to_string();
    let lower = format!("{err:#}").to_ascii_lowercase();
    if lower.contains("trace csv must have headers") {
        return "Invalid headers in trace CSV. Expected 'Time(us);Light(unitless)' or 'Time(cycles);Light(unitless)'.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable process exit codes per error family.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::Config(_) => 7,
            CliError::Usage(_) => 2,
        };
    }
    if err.downcast_ref::<ProtocolError>().is_some() {
        return 3;
    }
    if err.downcast_ref::<AnalysisError>().is_some()
        || err.downcast_ref::<PreprocessError>().is_some()
        || err.downcast_ref::<SignalQualityError>().is_some()
    {
        return 4;
    }
    if err.downcast_ref::<AggregationError>().is_some() {
        return 5;
    }
    if err.downcast_ref::<LogFormatError>().is_some() {
        return 6;
    }
    1
}

fn reason_and_details(err: &eyre::Report) -> (&'static str, Option<Value>) {
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::Config(_) => ("Config", None),
            CliError::Usage(_) => ("Usage", None),
        };
    }
    if let Some(pe) = err.downcast_ref::<ProtocolError>() {
        let details = match pe {
            ProtocolError::MeasurementFailed { frames_received } => {
                Some(json!({ "frames_received": frames_received }))
            }
            ProtocolError::UnexpectedGreeting { actual }
            | ProtocolError::Rejected { actual, .. }
            | ProtocolError::UnexpectedResponse { actual, .. }
            | ProtocolError::MalformedInfo { actual }
            | ProtocolError::MalformedFrame { actual } => Some(json!({ "actual": actual })),
            _ => None,
        };
        return ("Protocol", details);
    }
    if let Some(ae) = err.downcast_ref::<AnalysisError>() {
        let index = match ae {
            AnalysisError::Preprocess { index, .. } | AnalysisError::SignalQuality { index, .. } => {
                *index
            }
        };
        return ("Analysis", Some(json!({ "sample": index })));
    }
    if err.downcast_ref::<PreprocessError>().is_some()
        || err.downcast_ref::<SignalQualityError>().is_some()
    {
        return ("Analysis", None);
    }
    if err.downcast_ref::<AggregationError>().is_some() {
        return ("Aggregation", None);
    }
    if let Some(le) = err.downcast_ref::<LogFormatError>() {
        return ("LogFormat", Some(json!({ "line": le.line })));
    }
    ("Error", None)
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    let (reason, details) = reason_and_details(err);
    let msg = humanize(err);
    let obj = match details {
        Some(d) => json!({ "reason": reason, "details": d, "message": msg }),
        None => json!({ "reason": reason, "message": msg }),
    };
    obj.to_string()
}
