#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Conductivity monitor core (hardware-agnostic).
//!
//! All instrument and display interactions go through the
//! `condmon_traits::Instrument` and `condmon_traits::PlotSink` traits.
//!
//! ## Architecture
//!
//! - **Window**: sliding per-burst RMS statistics (`window` module)
//! - **Compensation**: conductivity, evaporation and temperature correction
//! - **Process log**: correlation with the externally written process log
//! - **Measurement**: assembly of finalized points and the validity gate
//! - **Controller**: cadence/validity state machine driving the loop
//! - **Plot / Sink**: fire-and-forget display channel and CSV persistence
//!
//! Units: voltages in mV, currents in mA, standard deviations in uV / uA,
//! conductivity in mS, times in ms of acquired signal.

pub mod compensation;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod measurement;
pub mod mocks;
pub mod plot;
pub mod process_log;
pub mod sink;
pub mod util;
pub mod window;

pub use config::{CadenceCfg, CompensationCfg, GateCfg, WindowCfg};
pub use controller::{
    AcquisitionController, CadenceCounter, ControllerBuilder, ControllerState, RunSummary,
    StepOutcome,
};
pub use error::{BuildError, LogCorrelationError, MeasurementError, MonitorError};
pub use measurement::{
    INVALID_SENTINEL, Measurement, MeasurementAssembler, RejectReason, ValidityGate,
};
pub use plot::{PlotChannel, PlotMsg, PlotWorker};
pub use process_log::{LogSnapshot, ProcessLogReader, ProcessLogSource, ProcessValues};
pub use sink::{CsvSink, MeasurementSink, NullSink};
pub use window::{StatsWindow, WindowStats};
