//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Environment variable selecting a simulator fault (greeting|keys|calibration|measurement|truncate).
pub const SIM_FAULT_ENV: &str = "SCREENTIMER_SIM_FAULT";

#[derive(Parser, Debug)]
#[command(
    name = "screentimer",
    version,
    about = "Measure input-to-display latency with a ScreenTimer device"
)]
pub struct Cli {
    /// Path to config TOML; a missing file means defaults
    #[arg(long, value_name = "FILE", default_value = "etc/screentimer.toml")]
    pub config: PathBuf,

    /// Print reports, logs and errors as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to the device and print its timer resolution
    Info,
    /// Record the resting light level as a trace CSV
    Calibrate {
        /// Write the trace here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Take a batch of latency measurements and write the measurement log
    Measure {
        /// Number of measurements (overrides acquisition.samples)
        #[arg(short = 'n', long, value_name = "N")]
        samples: Option<usize>,
        /// Wait this many seconds before each measurement
        #[arg(short, long, value_name = "SECONDS")]
        delay: Option<f64>,
        /// Keep device timer ticks instead of converting to microseconds
        #[arg(long, action = ArgAction::SetTrue)]
        raw_ticks: bool,
        /// Write the log here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Summarize a measurement log (stdin when FILE is omitted)
    Analyze {
        /// Measurement log produced by `measure`
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
        /// Fraction of change times to discard before the lag fit, in [0, 0.5)
        #[arg(short, long, value_name = "FRACTION")]
        trim: Option<f64>,
        /// Leave out low-contrast samples instead of failing
        #[arg(long, action = ArgAction::SetTrue)]
        skip_low_contrast: bool,
        /// Write the report here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Extract the latency features of a single trace CSV
    Trace {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Errors raised by the CLI itself before any device or analysis work.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid argument: {0}")]
    Usage(String),
}
