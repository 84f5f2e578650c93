//! Instrument backends.
//!
//! The bench oscilloscope driver lives outside this workspace; what ships here
//! is a signal-level simulation of the same two-channel block acquisition so
//! the monitor can run end to end without hardware.
pub mod error;

use condmon_traits::{Burst, Instrument};
use error::HwError;
use std::f64::consts::PI;
use std::time::Duration;

/// Parameters of the simulated measurement cell.
#[derive(Debug, Clone)]
pub struct SimulatedCell {
    /// Generator peak-to-peak amplitude (uV).
    pub amplitude_uv_pp: u32,
    pub frequency_hz: f64,
    /// Generator output impedance (ohm).
    pub output_impedance_ohm: f64,
    /// Cell resistance seen by the generator (ohm).
    pub cell_resistance_ohm: f64,
    /// Share of the cell voltage seen by the inner (sense) electrodes.
    pub sense_fraction: f64,
    /// Relative amplitude ripple, alternating sign per burst.
    pub ripple: f64,
}

impl Default for SimulatedCell {
    fn default() -> Self {
        Self {
            amplitude_uv_pp: 2_000_000,
            frequency_hz: 1000.0,
            output_impedance_ohm: 600.0,
            cell_resistance_ohm: 900.0,
            sense_fraction: 0.5,
            ripple: 0.0,
        }
    }
}

/// Simulated two-channel oscilloscope with a built-in sine generator.
///
/// Channel B sees the generator terminal after its output impedance, channel A
/// the sense electrodes, so `(source_rms - rms(B)) / Z` recovers the cell
/// current in mA the same way the bench wiring does.
pub struct SimulatedInstrument {
    cell: SimulatedCell,
    samples: usize,
    time_interval_ns: f64,
    pace: bool,
    bursts: u64,
    open: bool,
}

impl SimulatedInstrument {
    pub fn new(
        cell: SimulatedCell,
        samples: usize,
        time_interval_ns: f64,
    ) -> Result<Self, HwError> {
        if samples == 0 {
            return Err(HwError::Setup("samples must be >= 1".into()));
        }
        if !(time_interval_ns.is_finite() && time_interval_ns > 0.0) {
            return Err(HwError::Setup("time interval must be > 0".into()));
        }
        if cell.cell_resistance_ohm + cell.output_impedance_ohm <= 0.0 {
            return Err(HwError::Setup("total impedance must be > 0".into()));
        }
        tracing::info!(
            samples,
            time_interval_ns,
            amplitude_uv_pp = cell.amplitude_uv_pp,
            "simulated instrument opened"
        );
        Ok(Self {
            cell,
            samples,
            time_interval_ns,
            pace: false,
            bursts: 0,
            open: true,
        })
    }

    /// Sleep for the real duration of each burst, like a blocking block-mode read.
    pub fn paced(mut self, pace: bool) -> Self {
        self.pace = pace;
        self
    }

    pub fn bursts(&self) -> u64 {
        self.bursts
    }

    fn acquire(&mut self) -> Result<Burst, HwError> {
        if !self.open {
            return Err(HwError::Closed);
        }
        let peak_mv = f64::from(self.cell.amplitude_uv_pp) / 2000.0;
        let total = self.cell.cell_resistance_ohm + self.cell.output_impedance_ohm;
        let ripple = if self.bursts % 2 == 0 {
            1.0 + self.cell.ripple
        } else {
            1.0 - self.cell.ripple
        };
        let node_peak = peak_mv * self.cell.cell_resistance_ohm / total * ripple;
        let sense_peak = node_peak * self.cell.sense_fraction;
        let omega = 2.0 * PI * self.cell.frequency_hz;

        let mut time_ms = Vec::with_capacity(self.samples);
        let mut channel_a = Vec::with_capacity(self.samples);
        let mut channel_b = Vec::with_capacity(self.samples);
        for i in 0..self.samples {
            let t_ns = i as f64 * self.time_interval_ns;
            let s = (omega * t_ns * 1e-9).sin();
            time_ms.push(t_ns / 1_000_000.0);
            channel_a.push(sense_peak * s);
            channel_b.push(node_peak * s);
        }
        self.bursts += 1;

        let burst = Burst {
            time_ms,
            channel_a,
            channel_b,
            time_interval_ns: self.time_interval_ns,
        };
        if self.pace {
            let ms = burst.elapsed_ms();
            std::thread::sleep(Duration::from_secs_f64(ms / 1000.0));
        }
        Ok(burst)
    }
}

impl Instrument for SimulatedInstrument {
    fn get_data(&mut self) -> Result<Burst, Box<dyn std::error::Error + Send + Sync>> {
        self.acquire().map_err(|e| {
            tracing::error!(error = %e, "simulated acquisition failed");
            Box::new(e) as Box<dyn std::error::Error + Send + Sync>
        })
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.open {
            self.open = false;
            tracing::info!(bursts = self.bursts, "simulated instrument closed");
        }
        Ok(())
    }
}
