//! Correlation with the in-vitro application's process log.
//!
//! The log is append-only text written by another process. Every call rescans
//! the whole file and keeps the last complete line carrying each marker; a
//! trailing line without a newline is still being written and is ignored.
//!
//! ```text
//! 02/05/2024 09:30 [Info] Current concentration 50
//! 02/05/2024 09:30 [Info] Current volume 42.5
//! 02/05/2024 09:12 [Info] Temperature step function set to 37 degrees
//! 02/05/2024 09:00 [Info] Concentration step change to 50 in 3 steps
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::LogCorrelationError;
use crate::util::abs_whole_minutes;

pub const CONCENTRATION_MARKER: &str = "Current concentration";
pub const VOLUME_MARKER: &str = "Current volume";
pub const TEMPERATURE_MARKER: &str = "Temperature step function";
pub const TARGET_MARKER: &str = "Concentration step change to ";
/// Timestamp prefix of every log line, terminated by `" ["`.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Process variables correlated with one measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessValues {
    /// mg/dL
    pub concentration: f64,
    /// mg/dL
    pub target_concentration: f64,
    /// mL
    pub volume: f64,
    /// Celsius
    pub temperature: f64,
}

/// Outcome of one log correlation. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum LogSnapshot {
    Valid(ProcessValues),
    Invalid(LogCorrelationError),
}

impl LogSnapshot {
    pub fn is_valid(&self) -> bool {
        matches!(self, LogSnapshot::Valid(_))
    }

    pub fn values(&self) -> Option<&ProcessValues> {
        match self {
            LogSnapshot::Valid(v) => Some(v),
            LogSnapshot::Invalid(_) => None,
        }
    }
}

/// Anything able to produce the latest process snapshot as of a timestamp.
pub trait ProcessLogSource {
    fn snapshot(&self, as_of: NaiveDateTime) -> LogSnapshot;
}

impl<F> ProcessLogSource for F
where
    F: Fn(NaiveDateTime) -> LogSnapshot,
{
    fn snapshot(&self, as_of: NaiveDateTime) -> LogSnapshot {
        self(as_of)
    }
}

/// Reads the process log file from disk on every call, without locking.
#[derive(Debug, Clone)]
pub struct ProcessLogReader {
    path: PathBuf,
    staleness_minutes: u64,
}

impl ProcessLogReader {
    pub fn new(path: impl Into<PathBuf>, staleness_minutes: u64) -> Self {
        Self {
            path: path.into(),
            staleness_minutes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_latest(&self, as_of: NaiveDateTime) -> LogSnapshot {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) => {
                return LogSnapshot::Invalid(LogCorrelationError::Io(format!(
                    "{}: {e}",
                    self.path.display()
                )));
            }
        };
        // A racing append may cut a multi-byte character; only the last line is affected.
        let text = String::from_utf8_lossy(&bytes);
        tracing::trace!(path = %self.path.display(), bytes = bytes.len(), "process log scanned");
        parse_snapshot(&text, as_of, self.staleness_minutes)
    }
}

impl ProcessLogSource for ProcessLogReader {
    fn snapshot(&self, as_of: NaiveDateTime) -> LogSnapshot {
        self.read_latest(as_of)
    }
}

/// Extract the latest snapshot from the full log text.
pub fn parse_snapshot(text: &str, as_of: NaiveDateTime, staleness_minutes: u64) -> LogSnapshot {
    match try_parse(text, as_of, staleness_minutes) {
        Ok(v) => LogSnapshot::Valid(v),
        Err(e) => LogSnapshot::Invalid(e),
    }
}

#[derive(Default)]
struct LatestLines<'a> {
    concentration: Option<&'a str>,
    volume: Option<&'a str>,
    temperature: Option<&'a str>,
    target: Option<&'a str>,
}

fn complete_lines(text: &str) -> impl Iterator<Item = &str> {
    let complete = match text.rfind('\n') {
        Some(i) => &text[..=i],
        None => "",
    };
    complete.lines()
}

fn try_parse(
    text: &str,
    as_of: NaiveDateTime,
    staleness_minutes: u64,
) -> Result<ProcessValues, LogCorrelationError> {
    let mut latest = LatestLines::default();
    for line in complete_lines(text) {
        if line.contains(CONCENTRATION_MARKER) {
            latest.concentration = Some(line);
        }
        if line.contains(VOLUME_MARKER) {
            latest.volume = Some(line);
        }
        if line.contains(TEMPERATURE_MARKER) {
            latest.temperature = Some(line);
        }
        if line.contains(TARGET_MARKER) {
            latest.target = Some(line);
        }
    }

    let conc_line = latest
        .concentration
        .ok_or(LogCorrelationError::MissingMarker(CONCENTRATION_MARKER))?;
    let volume_line = latest
        .volume
        .ok_or(LogCorrelationError::MissingMarker(VOLUME_MARKER))?;
    let temp_line = latest
        .temperature
        .ok_or(LogCorrelationError::MissingMarker(TEMPERATURE_MARKER))?;
    let target_line = latest
        .target
        .ok_or(LogCorrelationError::MissingMarker(TARGET_MARKER))?;

    let stamp = line_timestamp(conc_line)?;
    let age_minutes = abs_whole_minutes(as_of, stamp);
    if age_minutes > i64::try_from(staleness_minutes).unwrap_or(i64::MAX) {
        return Err(LogCorrelationError::Stale {
            age_minutes,
            limit_minutes: staleness_minutes,
        });
    }

    let concentration = number(
        "concentration",
        field(conc_line, CONCENTRATION_MARKER, None),
    )?;
    let volume = number("volume", field(volume_line, VOLUME_MARKER, None))?;
    let temperature = number("temperature", field(temp_line, "to ", Some("degrees")))?;
    let target_concentration = number(
        "target concentration",
        field(target_line, TARGET_MARKER, Some(" in")),
    )?;

    Ok(ProcessValues {
        concentration,
        target_concentration,
        volume,
        temperature,
    })
}

/// Parse the `DD/MM/YYYY HH:MM` prefix of a log line.
pub fn line_timestamp(line: &str) -> Result<NaiveDateTime, LogCorrelationError> {
    let prefix = line.split(" [").next().unwrap_or_default().trim();
    NaiveDateTime::parse_from_str(prefix, TIMESTAMP_FORMAT)
        .map_err(|_| LogCorrelationError::BadTimestamp(prefix.to_string()))
}

/// Text between the first occurrence of `start` and the next `start` or `end`.
fn field<'a>(line: &'a str, start: &str, end: Option<&str>) -> Option<&'a str> {
    let after = line.split(start).nth(1)?;
    Some(match end {
        Some(end) => after.split(end).next().unwrap_or(after),
        None => after,
    })
}

fn number(name: &'static str, raw: Option<&str>) -> Result<f64, LogCorrelationError> {
    let raw = raw.unwrap_or_default();
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LogCorrelationError::BadField {
            field: name,
            raw: raw.to_string(),
        })
}
