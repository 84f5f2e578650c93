//! Runtime configuration for the monitor core.
//!
//! These are the structs the core operates on. They are separate from the
//! TOML-deserialized config in `condmon_config`; see `conversions`.

/// Sliding-window statistics and current derivation.
#[derive(Debug, Clone)]
pub struct WindowCfg {
    /// Number of burst RMS values retained per channel.
    pub capacity: usize,
    /// RMS of the generator output (mV).
    pub source_rms_mv: f64,
    /// Generator output impedance (ohm).
    pub output_impedance_ohm: f64,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            capacity: 100,
            source_rms_mv: 1000.0 / std::f64::consts::SQRT_2,
            output_impedance_ohm: 600.0,
        }
    }
}

/// Evaporation and temperature compensation coefficients.
#[derive(Debug, Clone)]
pub struct CompensationCfg {
    /// Per minute since the evaporation reference.
    pub evaporation_coeff: f64,
    /// Per degree Celsius away from `reference_temp_c`.
    pub temperature_coeff: f64,
    pub reference_temp_c: f64,
}

impl Default for CompensationCfg {
    fn default() -> Self {
        Self {
            evaporation_coeff: 0.000_020_565,
            temperature_coeff: 0.0162,
            reference_temp_c: 33.0,
        }
    }
}

/// Validity gate applied before a measurement is persisted.
#[derive(Debug, Clone)]
pub struct GateCfg {
    /// Both channel standard deviations must be strictly below this (uV / uA).
    pub std_max: f64,
    /// Volume must be at least this (mL).
    pub min_volume_ml: f64,
}

impl Default for GateCfg {
    fn default() -> Self {
        Self {
            std_max: 1500.0,
            min_volume_ml: 30.0,
        }
    }
}

/// Measurement cadence and initial correlation state.
#[derive(Debug, Clone)]
pub struct CadenceCfg {
    /// Acquired signal time between finalized measurements (ms).
    pub measurement_rate_ms: u64,
    /// Concentration assumed before the first correlated log entry.
    pub default_concentration: f64,
}

impl Default for CadenceCfg {
    fn default() -> Self {
        Self {
            measurement_rate_ms: 30_000,
            default_concentration: 400.0,
        }
    }
}
