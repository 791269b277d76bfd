#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and trace CSV handling for the ScreenTimer tools.
//!
//! - `Config` and its sections are deserialized from TOML; every field has a
//!   default so an empty file is a valid configuration.
//! - Trace CSV files are `;`-delimited with a `Time(<unit>);Light(unitless)`
//!   header.
use std::io::{Read, Write};
use std::path::Path;

use serde::Deserialize;

/// Teensy USB vendor ID used by the ScreenTimer firmware.
pub const DEFAULT_USB_VID: u16 = 0x16C0;
/// USB product ID of the ScreenTimer serial+keyboard interface.
pub const DEFAULT_USB_PID: u16 = 0x047A;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Device {
    /// Serial port path. When absent the device is found by USB ID.
    pub port: Option<String>,
    pub usb_vid: u16,
    pub usb_pid: u16,
    pub baud: u32,
    /// Per-read timeout on the serial port (ms)
    pub read_timeout_ms: u64,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            port: None,
            usb_vid: DEFAULT_USB_VID,
            usb_pid: DEFAULT_USB_PID,
            baud: 115_200,
            read_timeout_ms: 5000,
        }
    }
}

/// HID key codes the device presses during a measurement.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Keys {
    pub test: u8,
    pub reset: u8,
}

impl Default for Keys {
    fn default() -> Self {
        Self { test: 4, reset: 42 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Acquisition {
    pub samples: usize,
    /// Pause before each measurement (ms)
    pub delay_ms: u64,
    /// Report time axes in microseconds instead of device ticks
    pub tick_conversion: bool,
}

impl Default for Acquisition {
    fn default() -> Self {
        Self {
            samples: 1,
            delay_ms: 0,
            tick_conversion: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct Analysis {
    /// Fraction of change times discarded before the lag fit, in [0, 0.5)
    pub trim_fraction: f64,
    /// Skip low-contrast samples instead of failing the batch
    pub skip_low_contrast: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub device: Device,
    pub keys: Keys,
    pub acquisition: Acquisition,
    pub analysis: Analysis,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Load a config file; a missing file yields the defaults.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.device.baud == 0 {
            eyre::bail!("device.baud must be > 0");
        }
        if self.device.read_timeout_ms == 0 {
            eyre::bail!("device.read_timeout_ms must be > 0");
        }
        if self.acquisition.samples == 0 {
            eyre::bail!("acquisition.samples must be > 0");
        }
        let t = self.analysis.trim_fraction;
        if !(0.0..0.5).contains(&t) {
            eyre::bail!("analysis.trim_fraction must be in [0, 0.5), got {t}");
        }
        if let Some(rotation) = self.logging.rotation.as_deref()
            && !matches!(rotation, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got '{rotation}'");
        }
        Ok(())
    }
}

/// One row of a trace CSV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceRow {
    pub time: f64,
    pub value: i64,
}

/// A single light trace loaded from CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceCsv {
    /// Time unit from the header: "us" or "cycles".
    pub unit: String,
    pub rows: Vec<TraceRow>,
}

const TRACE_UNITS: [&str; 2] = ["us", "cycles"];

fn parse_time_header(col: &str) -> Option<&str> {
    let unit = col.strip_prefix("Time(")?.strip_suffix(')')?;
    TRACE_UNITS.contains(&unit).then_some(unit)
}

pub fn read_trace_csv<R: Read>(reader: R) -> eyre::Result<TraceCsv> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .from_reader(reader);

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read trace CSV headers: {}", e))?
        .clone();
    let actual: Vec<&str> = headers.iter().collect();
    let unit = match actual.as_slice() {
        [time, "Light(unitless)"] => parse_time_header(time),
        _ => None,
    };
    let Some(unit) = unit else {
        eyre::bail!(
            "trace CSV must have headers 'Time(us|cycles);Light(unitless)', got: {}",
            actual.join(";")
        );
    };
    let unit = unit.to_string();

    let mut rows: Vec<TraceRow> = Vec::new();
    for (idx, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e))?;
        let row = match (rec.get(0), rec.get(1)) {
            (Some(t), Some(v)) => t
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|t| t.is_finite())
                .zip(v.trim().parse::<i64>().ok())
                .map(|(time, value)| TraceRow { time, value }),
            _ => None,
        };
        let Some(row) = row else {
            eyre::bail!("invalid CSV row {}: expected '<time>;<value>'", idx + 2);
        };
        if let Some(prev) = rows.last()
            && row.time < prev.time
        {
            eyre::bail!(
                "invalid CSV row {}: time {} is earlier than the previous row's {}",
                idx + 2,
                row.time,
                prev.time
            );
        }
        rows.push(row);
    }
    Ok(TraceCsv { unit, rows })
}

pub fn load_trace_csv(path: &Path) -> eyre::Result<TraceCsv> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open trace CSV {:?}: {}", path, e))?;
    read_trace_csv(file).map_err(|e| e.wrap_err(format!("in {}", path.display())))
}

pub fn write_trace_csv<W: Write>(
    writer: W,
    unit: &str,
    rows: impl IntoIterator<Item = TraceRow>,
) -> eyre::Result<()> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);
    wtr.write_record([format!("Time({unit})").as_str(), "Light(unitless)"])?;
    for row in rows {
        wtr.write_record([row.time.to_string(), row.value.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
