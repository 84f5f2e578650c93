//! The acquisition loop and its cadence/validity state machine.
//!
//! ```text
//!  Acquiring ──[cadence expired]──▶ Finalizing ──[gate passed, row written]──▶ Acquiring
//!      ▲                               │
//!      └───────[next burst]────────────┘  gate failed / invalid: retry on every burst
//!
//!  any state ──[interrupt or fatal error]──▶ Shutdown
//! ```
//!
//! The controller exclusively owns the window, the cadence counter and the
//! evaporation reference; nothing here is shared across threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::NaiveDateTime;
use condmon_traits::{Clock, Instrument, PlotSink, SystemClock};

use crate::config::{CadenceCfg, CompensationCfg, GateCfg, WindowCfg};
use crate::error::{BuildError, MeasurementError, MonitorError, Result};
use crate::hw_error::map_hw_error;
use crate::measurement::{Measurement, MeasurementAssembler, RejectReason, ValidityGate};
use crate::process_log::{LogSnapshot, ProcessLogSource};
use crate::sink::MeasurementSink;
use crate::window::StatsWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Counting down the cadence while feeding the window.
    Acquiring,
    /// Cadence expired; every burst attempts to finalize a measurement.
    Finalizing,
    /// Instrument released and display notified. Terminal.
    Shutdown,
}

/// Countdown in ms of acquired signal until the next measurement is due.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CadenceCounter {
    rate_ms: f64,
    remaining_ms: f64,
}

impl CadenceCounter {
    pub fn new(rate_ms: u64) -> Self {
        let rate_ms = rate_ms as f64;
        Self {
            rate_ms,
            remaining_ms: rate_ms,
        }
    }

    pub fn remaining_ms(&self) -> f64 {
        self.remaining_ms
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_ms < 1.0
    }

    /// Count down by `elapsed_ms`. Once expired the counter holds its value
    /// until `reset`. Returns whether a measurement is due.
    pub fn tick(&mut self, elapsed_ms: f64) -> bool {
        if !self.is_expired() {
            self.remaining_ms -= elapsed_ms;
        }
        self.is_expired()
    }

    pub fn reset(&mut self) {
        self.remaining_ms = self.rate_ms;
    }
}

/// Result of one loop iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Burst folded into the window; no measurement due yet.
    Acquired,
    /// Measurement passed the gate and was written.
    Persisted(Measurement),
    /// Measurement failed the gate; it will be retried on the next burst.
    Rejected(Measurement, RejectReason),
    /// Measurement could not be computed; retried on the next burst.
    Discarded(MeasurementError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub bursts: u64,
    pub attempts: u64,
    pub persisted: u64,
    pub rejected: u64,
    pub discarded: u64,
    pub interrupted: bool,
}

pub struct AcquisitionController {
    instrument: Box<dyn Instrument>,
    plot: Box<dyn PlotSink>,
    sink: Box<dyn MeasurementSink>,
    process_log: Box<dyn ProcessLogSource>,
    clock: Box<dyn Clock>,
    window: StatsWindow,
    assembler: MeasurementAssembler,
    gate: ValidityGate,
    cadence: CadenceCounter,
    evaporation_reference: NaiveDateTime,
    evaporation_started: Instant,
    last_concentration: f64,
    state: ControllerState,
    summary: RunSummary,
}

impl core::fmt::Debug for AcquisitionController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AcquisitionController")
            .field("state", &self.state)
            .field("cadence", &self.cadence)
            .field("window_len", &self.window.len())
            .field("evaporation_reference", &self.evaporation_reference)
            .field("last_concentration", &self.last_concentration)
            .finish()
    }
}

impl AcquisitionController {
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::default()
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn cadence(&self) -> &CadenceCounter {
        &self.cadence
    }

    pub fn window(&self) -> &StatsWindow {
        &self.window
    }

    pub fn evaporation_reference(&self) -> NaiveDateTime {
        self.evaporation_reference
    }

    pub fn last_concentration(&self) -> f64 {
        self.last_concentration
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// One iteration: acquire a burst, forward it, and finalize when due.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if self.state == ControllerState::Shutdown {
            return Err(MonitorError::State("controller is shut down".into()).into());
        }
        let burst = self
            .instrument
            .get_data()
            .map_err(|e| map_hw_error(&*e))?;
        self.summary.bursts += 1;
        if !self.window.add_sample(&burst.channel_a, &burst.channel_b) {
            tracing::warn!(
                a = burst.channel_a.len(),
                b = burst.channel_b.len(),
                "empty burst skipped"
            );
        }
        let elapsed_ms = burst.elapsed_ms();
        self.plot.update_data(burst);

        if !self.cadence.tick(elapsed_ms) {
            self.state = ControllerState::Acquiring;
            return Ok(StepOutcome::Acquired);
        }
        self.state = ControllerState::Finalizing;
        self.finalize()
    }

    fn finalize(&mut self) -> Result<StepOutcome> {
        self.summary.attempts += 1;
        let now = self.clock.now();
        let snapshot = self.process_log.snapshot(now);
        match &snapshot {
            LogSnapshot::Valid(v) => self.track_concentration(v.concentration, now),
            LogSnapshot::Invalid(reason) => {
                tracing::warn!(%reason, "process log correlation failed");
            }
        }

        let m = match self.assembler.assemble(
            now,
            self.window.stats(),
            &snapshot,
            self.evaporation_minutes(),
        ) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "measurement discarded");
                self.summary.discarded += 1;
                return Ok(StepOutcome::Discarded(e));
            }
        };
        m.log_summary();

        match self.gate.check(&m) {
            Ok(()) => {
                self.sink.append(&m)?;
                self.summary.persisted += 1;
                self.cadence.reset();
                self.state = ControllerState::Acquiring;
                Ok(StepOutcome::Persisted(m))
            }
            Err(reason) => {
                tracing::debug!(%reason, "measurement rejected, retrying on next burst");
                self.summary.rejected += 1;
                Ok(StepOutcome::Rejected(m, reason))
            }
        }
    }

    /// Minutes since the last concentration change, on the monotonic clock.
    fn evaporation_minutes(&self) -> f64 {
        self.clock
            .instant()
            .saturating_duration_since(self.evaporation_started)
            .as_secs_f64()
            / 60.0
    }

    /// A new concentration means the liquid was replaced: evaporation restarts.
    fn track_concentration(&mut self, concentration: f64, now: NaiveDateTime) {
        if concentration != self.last_concentration {
            tracing::info!(
                from = self.last_concentration,
                to = concentration,
                "concentration changed, evaporation reference reset"
            );
            self.last_concentration = concentration;
            self.evaporation_reference = now;
            self.evaporation_started = self.clock.instant();
        }
    }

    /// Loop until `interrupt` is raised, `max_bursts` is reached, or a fatal
    /// error occurs. The instrument and display are released in every case.
    pub fn run(&mut self, interrupt: &AtomicBool, max_bursts: Option<u64>) -> Result<RunSummary> {
        tracing::info!(
            rate_ms = self.cadence.rate_ms,
            window = self.window.capacity(),
            "acquisition start"
        );
        let result = loop {
            if interrupt.load(Ordering::Relaxed) {
                self.summary.interrupted = true;
                break Ok(());
            }
            if let Some(max) = max_bursts
                && self.summary.bursts >= max
            {
                break Ok(());
            }
            if let Err(e) = self.step() {
                tracing::error!(error = %e, "acquisition aborted");
                break Err(e);
            }
        };
        self.shutdown();
        result.map(|()| self.summary)
    }

    /// Notify the display and release the instrument. Idempotent.
    pub fn shutdown(&mut self) {
        if self.state == ControllerState::Shutdown {
            return;
        }
        self.plot.send_finished();
        if let Err(e) = self.instrument.close() {
            tracing::warn!(error = %e, "failed to close instrument");
        }
        self.state = ControllerState::Shutdown;
        tracing::info!(
            bursts = self.summary.bursts,
            attempts = self.summary.attempts,
            persisted = self.summary.persisted,
            rejected = self.summary.rejected,
            discarded = self.summary.discarded,
            "acquisition stopped"
        );
    }
}

/// Collects collaborators and configuration for `AcquisitionController`.
#[derive(Default)]
pub struct ControllerBuilder {
    instrument: Option<Box<dyn Instrument>>,
    plot: Option<Box<dyn PlotSink>>,
    sink: Option<Box<dyn MeasurementSink>>,
    process_log: Option<Box<dyn ProcessLogSource>>,
    clock: Option<Box<dyn Clock>>,
    window: WindowCfg,
    compensation: CompensationCfg,
    gate: GateCfg,
    cadence: CadenceCfg,
}

impl ControllerBuilder {
    pub fn with_instrument(mut self, instrument: impl Instrument + 'static) -> Self {
        self.instrument = Some(Box::new(instrument));
        self
    }

    pub fn with_plot(mut self, plot: impl PlotSink + 'static) -> Self {
        self.plot = Some(Box::new(plot));
        self
    }

    pub fn with_sink(mut self, sink: impl MeasurementSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn with_boxed_sink(mut self, sink: Box<dyn MeasurementSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_process_log(mut self, log: impl ProcessLogSource + 'static) -> Self {
        self.process_log = Some(Box::new(log));
        self
    }

    /// Defaults to the local system clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn with_window(mut self, cfg: WindowCfg) -> Self {
        self.window = cfg;
        self
    }

    pub fn with_compensation(mut self, cfg: CompensationCfg) -> Self {
        self.compensation = cfg;
        self
    }

    pub fn with_gate(mut self, cfg: GateCfg) -> Self {
        self.gate = cfg;
        self
    }

    pub fn with_cadence(mut self, cfg: CadenceCfg) -> Self {
        self.cadence = cfg;
        self
    }

    pub fn build(self) -> Result<AcquisitionController> {
        let instrument = self.instrument.ok_or(BuildError::MissingInstrument)?;
        let plot = self.plot.ok_or(BuildError::MissingPlot)?;
        let sink = self.sink.ok_or(BuildError::MissingSink)?;
        let process_log = self.process_log.ok_or(BuildError::MissingProcessLog)?;
        if self.cadence.measurement_rate_ms == 0 {
            return Err(BuildError::InvalidConfig("measurement rate must be >= 1 ms").into());
        }
        if !self.cadence.default_concentration.is_finite() {
            return Err(BuildError::InvalidConfig("default concentration must be finite").into());
        }
        let window = StatsWindow::new(self.window)?;
        let clock = self.clock.unwrap_or_else(|| Box::new(SystemClock::new()));
        let evaporation_reference = clock.now();
        let evaporation_started = clock.instant();

        Ok(AcquisitionController {
            instrument,
            plot,
            sink,
            process_log,
            clock,
            window,
            assembler: MeasurementAssembler::new(self.compensation),
            gate: ValidityGate::new(self.gate),
            cadence: CadenceCounter::new(self.cadence.measurement_rate_ms),
            evaporation_reference,
            evaporation_started,
            last_concentration: self.cadence.default_concentration,
            state: ControllerState::Acquiring,
            summary: RunSummary::default(),
        })
    }
}
