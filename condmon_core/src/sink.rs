//! Persistence of validated measurements.
//!
//! One CSV file per run, created with its header at start-up. Each accepted
//! measurement is written and flushed before the loop continues, so an
//! interrupt never loses a point that was reported as persisted.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::MonitorError;
use crate::measurement::Measurement;

/// Column order of the persisted file.
pub const HEADER: [&str; 11] = [
    "concentration [mg/dL]",
    "target concentration [mg/dL]",
    "volume [mL]",
    "temperature [Celsius]",
    "V2 mean [mV]",
    "V2 std [uV]",
    "I mean [mA]",
    "I std [uA]",
    "conductivity [mS]",
    "compensated conductivity [mS]",
    "timestamp",
];

pub trait MeasurementSink {
    fn append(&mut self, m: &Measurement) -> Result<(), MonitorError>;
}

/// Output file name for a run started at `started`.
pub fn output_path(dir: &Path, started: NaiveDateTime) -> PathBuf {
    dir.join(started.format("Picoresults_%Y_%m_%d_%H_%M.csv").to_string())
}

#[derive(Debug, Serialize)]
struct Row {
    concentration: f64,
    target_concentration: f64,
    volume: f64,
    temperature: f64,
    v2_mean: f64,
    v2_std: f64,
    i_mean: f64,
    i_std: f64,
    conductivity: f64,
    compensated_conductivity: f64,
    timestamp: String,
}

impl From<&Measurement> for Row {
    fn from(m: &Measurement) -> Self {
        Self {
            concentration: m.concentration(),
            target_concentration: m.target_concentration(),
            volume: m.volume(),
            temperature: m.temperature(),
            v2_mean: m.stats.voltage_mean,
            v2_std: m.stats.voltage_std,
            i_mean: m.stats.current_mean,
            i_std: m.stats.current_std,
            conductivity: m.conductivity,
            compensated_conductivity: m.compensated(),
            timestamp: m.timestring(),
        }
    }
}

pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: u64,
}

impl core::fmt::Debug for CsvSink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CsvSink")
            .field("path", &self.path)
            .field("rows", &self.rows)
            .finish()
    }
}

impl CsvSink {
    /// Create (truncate) the file and write the header row.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, MonitorError> {
        let path = path.into();
        let err = |e: &dyn std::fmt::Display| {
            MonitorError::Persistence(format!("{}: {e}", path.display()))
        };
        let file = File::create(&path).map_err(|e| err(&e))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(HEADER).map_err(|e| err(&e))?;
        writer.flush().map_err(|e| err(&e))?;
        tracing::info!(path = %path.display(), "output file created");
        Ok(Self {
            path,
            writer,
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }
}

impl MeasurementSink for CsvSink {
    fn append(&mut self, m: &Measurement) -> Result<(), MonitorError> {
        let err = |e: &dyn std::fmt::Display| {
            MonitorError::Persistence(format!("{}: {e}", self.path.display()))
        };
        self.writer.serialize(Row::from(m)).map_err(|e| err(&e))?;
        self.writer.flush().map_err(|e| err(&e))?;
        self.rows += 1;
        Ok(())
    }
}

/// Sink used when persistence is disabled; accepts and drops every point.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MeasurementSink for NullSink {
    fn append(&mut self, _m: &Measurement) -> Result<(), MonitorError> {
        Ok(())
    }
}
