//! Finalized measurement points, their assembly, and the validity gate.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::compensation::{compensate_elapsed, conductivity};
use crate::config::{CompensationCfg, GateCfg};
use crate::error::MeasurementError;
use crate::process_log::{LogSnapshot, ProcessValues};
use crate::window::WindowStats;

/// Written in place of process values that could not be correlated.
pub const INVALID_SENTINEL: f64 = -1.0;
/// Timestamp format of persisted rows.
pub const ROW_TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// One finalized measurement point. Immutable once assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub timestamp: NaiveDateTime,
    pub stats: WindowStats,
    /// mS
    pub conductivity: f64,
    /// mS; absent when the process log could not be correlated.
    pub compensated_conductivity: Option<f64>,
    /// All four process variables, or none of them.
    pub process: Option<ProcessValues>,
}

impl Measurement {
    pub fn concentration(&self) -> f64 {
        self.process.map_or(INVALID_SENTINEL, |p| p.concentration)
    }

    pub fn target_concentration(&self) -> f64 {
        self.process
            .map_or(INVALID_SENTINEL, |p| p.target_concentration)
    }

    pub fn volume(&self) -> f64 {
        self.process.map_or(INVALID_SENTINEL, |p| p.volume)
    }

    pub fn temperature(&self) -> f64 {
        self.process.map_or(INVALID_SENTINEL, |p| p.temperature)
    }

    pub fn compensated(&self) -> f64 {
        self.compensated_conductivity.unwrap_or(INVALID_SENTINEL)
    }

    pub fn timestring(&self) -> String {
        self.timestamp.format(ROW_TIMESTAMP_FORMAT).to_string()
    }

    /// Per-measurement diagnostic line, emitted whether or not it is persisted.
    pub fn log_summary(&self) {
        tracing::info!(
            at = %self.timestring(),
            concentration = self.concentration(),
            temperature = self.temperature(),
            volume_ml = self.volume(),
            v2_mv = self.stats.voltage_mean,
            i_ma = self.stats.current_mean,
            g_ms = self.conductivity,
            g_comp_ms = self.compensated(),
            "measurement"
        );
    }
}

/// Combines window statistics, process values and compensation.
#[derive(Debug, Clone, Default)]
pub struct MeasurementAssembler {
    compensation: CompensationCfg,
}

impl MeasurementAssembler {
    pub fn new(compensation: CompensationCfg) -> Self {
        Self { compensation }
    }

    pub fn compensation(&self) -> &CompensationCfg {
        &self.compensation
    }

    /// Build the measurement for `timestamp`. Compensation is skipped when the
    /// snapshot is invalid since there is no temperature to normalize against.
    /// `evaporation_minutes` is the span since the last concentration change.
    pub fn assemble(
        &self,
        timestamp: NaiveDateTime,
        stats: WindowStats,
        snapshot: &LogSnapshot,
        evaporation_minutes: f64,
    ) -> Result<Measurement, MeasurementError> {
        let g = conductivity(stats.voltage_mean, stats.current_mean)?;
        let process = snapshot.values().copied();
        let compensated_conductivity = match &process {
            Some(p) => Some(compensate_elapsed(
                g,
                evaporation_minutes,
                p.temperature,
                &self.compensation,
            )?),
            None => None,
        };
        Ok(Measurement {
            timestamp,
            stats,
            conductivity: g,
            compensated_conductivity,
            process,
        })
    }
}

/// Why a measurement did not pass the validity gate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RejectReason {
    #[error("process values unavailable")]
    MissingProcessValues,
    #[error("volume {volume} mL below {min} mL")]
    LowVolume { volume: f64, min: f64 },
    #[error("voltage std {std} uV not below {max}")]
    NoisyVoltage { std: f64, max: f64 },
    #[error("current std {std} uA not below {max}")]
    NoisyCurrent { std: f64, max: f64 },
}

#[derive(Debug, Clone, Default)]
pub struct ValidityGate {
    cfg: GateCfg,
}

impl ValidityGate {
    pub fn new(cfg: GateCfg) -> Self {
        Self { cfg }
    }

    pub fn check(&self, m: &Measurement) -> Result<(), RejectReason> {
        let p = m.process.ok_or(RejectReason::MissingProcessValues)?;
        if p.volume.is_nan() || p.volume < self.cfg.min_volume_ml {
            return Err(RejectReason::LowVolume {
                volume: p.volume,
                min: self.cfg.min_volume_ml,
            });
        }
        if m.stats.voltage_std.is_nan() || m.stats.voltage_std >= self.cfg.std_max {
            return Err(RejectReason::NoisyVoltage {
                std: m.stats.voltage_std,
                max: self.cfg.std_max,
            });
        }
        if m.stats.current_std.is_nan() || m.stats.current_std >= self.cfg.std_max {
            return Err(RejectReason::NoisyCurrent {
                std: m.stats.current_std,
                max: self.cfg.std_max,
            });
        }
        Ok(())
    }
}
