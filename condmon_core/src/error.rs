use thiserror::Error;

/// Fatal failures of the acquisition pipeline.
#[derive(Debug, Error, Clone)]
pub enum MonitorError {
    #[error("instrument error: {0}")]
    Instrument(String),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

/// A finalized point that cannot be compensated; it is discarded, never persisted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeasurementError {
    #[error("voltage window mean {voltage_mv} mV is too close to zero for conductivity")]
    ZeroVoltage { voltage_mv: f64 },
    #[error("measurement precedes evaporation reference by {minutes:.2} min")]
    NegativeElapsed { minutes: f64 },
    #[error("compensation denominator vanished ({0})")]
    DegenerateCompensation(&'static str),
}

/// Why a process-log snapshot could not be correlated. Carried by
/// `LogSnapshot::Invalid`; never raised.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LogCorrelationError {
    #[error("process log unreadable: {0}")]
    Io(String),
    #[error("no {0:?} entry in process log")]
    MissingMarker(&'static str),
    #[error("unparseable timestamp {0:?}")]
    BadTimestamp(String),
    #[error("unparseable {field} value {raw:?}")]
    BadField { field: &'static str, raw: String },
    #[error("concentration entry is {age_minutes} min old (limit {limit_minutes})")]
    Stale { age_minutes: i64, limit_minutes: u64 },
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing instrument")]
    MissingInstrument,
    #[error("missing plot sink")]
    MissingPlot,
    #[error("missing measurement sink")]
    MissingSink,
    #[error("missing process log")]
    MissingProcessLog,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
