//! Text measurement log shared by acquisition and analysis.
//!
//! One block per sample:
//!
//! ```text
//! Measurement 0
//! variance = 12 cycles
//! Time(us);Light(unitless)
//! 62.5;40
//! 125;41
//!
//! ```
//!
//! Times are written with the shortest `f64` display that reads back to the
//! same value, so whole numbers have no fractional part (`125`, not `125.0`).
//! The reader accepts either form. Every block of a log shares one time unit
//! and times never decrease within a block.
use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::error::{LogFormatError, LogFormatErrorKind};
use crate::types::{MeasurementBatch, Sample, TimeUnit};

/// Column header line for a given time unit.
pub fn column_header(unit: TimeUnit) -> String {
    format!("Time({unit});Light(unitless)")
}

pub fn write_measurement_log<W: Write>(mut out: W, batch: &MeasurementBatch) -> io::Result<()> {
    let header = column_header(batch.unit);
    for (index, sample) in batch.samples.iter().enumerate() {
        writeln!(out, "Measurement {index}")?;
        writeln!(out, "variance = {} cycles", sample.variance())?;
        writeln!(out, "{header}")?;
        for (time, value) in sample.points() {
            writeln!(out, "{time};{value}")?;
        }
        writeln!(out)?;
    }
    out.flush()
}

struct LineReader<R> {
    inner: io::Lines<R>,
    line: usize,
}

impl<R: BufRead> LineReader<R> {
    fn next(&mut self) -> Result<Option<String>, LogFormatError> {
        match self.inner.next() {
            None => Ok(None),
            Some(Ok(text)) => {
                self.line += 1;
                Ok(Some(text))
            }
            Some(Err(e)) => Err(self.error(LogFormatErrorKind::Io(e.to_string()))),
        }
    }

    fn require(&mut self) -> Result<String, LogFormatError> {
        match self.next()? {
            Some(text) => Ok(text),
            None => Err(LogFormatError {
                line: self.line + 1,
                kind: LogFormatErrorKind::UnexpectedEnd,
            }),
        }
    }

    fn error(&self, kind: LogFormatErrorKind) -> LogFormatError {
        LogFormatError {
            line: self.line,
            kind,
        }
    }
}

fn leading_digits(s: &str) -> &str {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    &s[..end]
}

fn parse_header(text: &str) -> Option<usize> {
    leading_digits(text.strip_prefix("Measurement ")?).parse().ok()
}

fn parse_variance(text: &str) -> Option<u16> {
    leading_digits(text.strip_prefix("variance = ")?).parse().ok()
}

fn parse_columns(text: &str) -> Option<TimeUnit> {
    let (unit, rest) = text.strip_prefix("Time(")?.split_once(')')?;
    if !rest.starts_with(";Light") {
        return None;
    }
    unit.parse().ok()
}

fn parse_row(text: &str) -> Option<(f64, i64)> {
    let (time, value) = text.split_once(';')?;
    let time: f64 = time.trim().parse().ok()?;
    if !time.is_finite() {
        return None;
    }
    Some((time, value.trim().parse().ok()?))
}

/// Parse a measurement log. An empty input is an empty batch.
///
/// The batch takes the time unit of the first block.
pub fn read_measurement_log<R: BufRead>(reader: R) -> Result<MeasurementBatch, LogFormatError> {
    let mut lines = LineReader {
        inner: reader.lines(),
        line: 0,
    };
    let mut batch = MeasurementBatch::default();

    while let Some(text) = lines.next()? {
        if text.trim().is_empty() {
            continue;
        }
        let index = parse_header(&text)
            .ok_or_else(|| lines.error(LogFormatErrorKind::MissingHeader(text.clone())))?;

        let text = lines.require()?;
        let variance = parse_variance(&text)
            .ok_or_else(|| lines.error(LogFormatErrorKind::MissingVariance(text.clone())))?;

        let text = lines.require()?;
        let unit = parse_columns(&text)
            .ok_or_else(|| lines.error(LogFormatErrorKind::MissingColumns(text.clone())))?;
        if batch.samples.is_empty() {
            batch.unit = unit;
        } else if unit != batch.unit {
            return Err(lines.error(LogFormatErrorKind::MixedUnits {
                expected: batch.unit,
                actual: unit,
            }));
        }

        let mut points: Vec<(f64, i64)> = Vec::new();
        while let Some(text) = lines.next()? {
            if text.trim().is_empty() {
                break;
            }
            let point = parse_row(&text)
                .ok_or_else(|| lines.error(LogFormatErrorKind::BadRow(text.clone())))?;
            if let Some(&(previous, _)) = points.last()
                && point.0 < previous
            {
                return Err(lines.error(LogFormatErrorKind::TimeWentBackwards {
                    previous,
                    actual: point.0,
                }));
            }
            points.push(point);
        }
        debug!(index, points = points.len(), "read measurement block");
        batch.samples.push(Sample::from_points(variance, points));
    }
    Ok(batch)
}
