//! `From` implementations bridging `condmon_config` types to `condmon_core` types.

use crate::config::{CadenceCfg, CompensationCfg, GateCfg, WindowCfg};

// ── WindowCfg ────────────────────────────────────────────────────────────────

impl From<&condmon_config::Config> for WindowCfg {
    fn from(c: &condmon_config::Config) -> Self {
        Self {
            capacity: c.acquisition.window,
            source_rms_mv: c.signal.source_rms_mv(),
            output_impedance_ohm: c.signal.output_impedance_ohm,
        }
    }
}

// ── CompensationCfg ──────────────────────────────────────────────────────────

impl From<&condmon_config::Config> for CompensationCfg {
    fn from(c: &condmon_config::Config) -> Self {
        Self {
            evaporation_coeff: c.compensation.evaporation_coeff,
            temperature_coeff: c.compensation.temperature_coeff,
            reference_temp_c: c.defaults.temperature_c,
        }
    }
}

// ── GateCfg ──────────────────────────────────────────────────────────────────

impl From<&condmon_config::Thresholds> for GateCfg {
    fn from(c: &condmon_config::Thresholds) -> Self {
        Self {
            std_max: c.std_max,
            min_volume_ml: c.min_volume_ml,
        }
    }
}

// ── CadenceCfg ───────────────────────────────────────────────────────────────

impl From<&condmon_config::Config> for CadenceCfg {
    fn from(c: &condmon_config::Config) -> Self {
        Self {
            measurement_rate_ms: c.acquisition.measurement_rate_ms,
            default_concentration: c.defaults.concentration,
        }
    }
}
