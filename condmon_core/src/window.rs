//! Fixed-capacity sliding window of per-burst RMS values.
//!
//! Each burst is reduced to one voltage RMS (channel A) and one derived
//! current (channel B) before insertion. Once full, every insertion evicts
//! the oldest entry, so statistics always describe the most recent
//! `capacity` bursts.

use std::collections::VecDeque;

use crate::config::WindowCfg;
use crate::error::BuildError;
use crate::util::{MILLI_TO_MICRO, mean_std, rms};

/// Running statistics over the current window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowStats {
    /// Mean sense-electrode voltage (mV).
    pub voltage_mean: f64,
    /// Voltage standard deviation (uV).
    pub voltage_std: f64,
    /// Mean cell current (mA).
    pub current_mean: f64,
    /// Current standard deviation (uA).
    pub current_std: f64,
}

#[derive(Debug, Clone)]
pub struct StatsWindow {
    cfg: WindowCfg,
    voltage: VecDeque<f64>,
    current: VecDeque<f64>,
}

impl StatsWindow {
    pub fn new(cfg: WindowCfg) -> Result<Self, BuildError> {
        if cfg.capacity == 0 {
            return Err(BuildError::InvalidConfig("window capacity must be >= 1"));
        }
        if !(cfg.output_impedance_ohm.is_finite() && cfg.output_impedance_ohm > 0.0) {
            return Err(BuildError::InvalidConfig("output impedance must be > 0"));
        }
        Ok(Self {
            voltage: VecDeque::with_capacity(cfg.capacity),
            current: VecDeque::with_capacity(cfg.capacity),
            cfg,
        })
    }

    pub fn capacity(&self) -> usize {
        self.cfg.capacity
    }

    /// Number of filled entries, at most `capacity`.
    pub fn len(&self) -> usize {
        self.voltage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voltage.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.voltage.len() == self.cfg.capacity
    }

    /// Current through the cell (mA) from the generator-side RMS (mV):
    /// `(source_rms - measured_rms) / output_impedance`.
    #[inline]
    pub fn derive_current(&self, measured_rms_mv: f64) -> f64 {
        (self.cfg.source_rms_mv - measured_rms_mv) / self.cfg.output_impedance_ohm
    }

    /// Reduce one burst to RMS scalars and insert them.
    ///
    /// A burst with an empty channel carries no RMS and is skipped; returns
    /// whether the window changed.
    pub fn add_sample(&mut self, channel_a: &[f64], channel_b: &[f64]) -> bool {
        if channel_a.is_empty() || channel_b.is_empty() {
            return false;
        }
        let v_rms = rms(channel_a);
        let current = self.derive_current(rms(channel_b));
        self.push(v_rms, current);
        true
    }

    /// Insert already reduced values, evicting the oldest pair when full.
    pub fn push(&mut self, voltage_rms: f64, current: f64) {
        if self.is_full() {
            self.voltage.pop_front();
            self.current.pop_front();
        }
        self.voltage.push_back(voltage_rms);
        self.current.push_back(current);
    }

    /// Statistics over the filled portion of the window. Both standard
    /// deviations are reported in micro-units; an empty window yields zeros.
    pub fn stats(&self) -> WindowStats {
        let (voltage_mean, v_std) = mean_std(self.voltage.iter());
        let (current_mean, i_std) = mean_std(self.current.iter());
        WindowStats {
            voltage_mean,
            voltage_std: v_std * MILLI_TO_MICRO,
            current_mean,
            current_std: i_std * MILLI_TO_MICRO,
        }
    }

    /// Voltage entries, oldest first.
    pub fn voltages(&self) -> impl Iterator<Item = f64> + '_ {
        self.voltage.iter().copied()
    }

    /// Current entries, oldest first.
    pub fn currents(&self) -> impl Iterator<Item = f64> + '_ {
        self.current.iter().copied()
    }
}
