#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the conductivity monitor.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; defaults match the calibration bench.
//! - `debug = true` switches paths, persistence and cadence to the local
//!   testing profile (see `Config::apply_debug_profile`).
use serde::Deserialize;
use std::path::PathBuf;

/// Cadence used by the debug profile (ms).
pub const DEBUG_MEASUREMENT_RATE_MS: u64 = 2000;
/// Process log looked up in the working directory by the debug profile.
pub const DEBUG_LOG_FILE: &str = "InVitroApp.txt";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Paths {
    /// Directory receiving `Picoresults_*.csv` files.
    pub output_dir: PathBuf,
    /// Append-only process log written by the in-vitro application.
    pub log_file: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("C:/GluSense/Calibration/"),
            log_file: PathBuf::from("C:/GluSense/GluSense Monitoring Software/Log/InVitroApp.txt"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Output {
    /// Write validated measurements to CSV
    pub enabled: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Acquisition {
    /// Time between finalized measurements, in ms of acquired signal.
    /// Also accepts alias "rate_ms".
    #[serde(alias = "rate_ms")]
    pub measurement_rate_ms: u64,
    /// Number of burst RMS values kept for the running statistics.
    pub window: usize,
}

impl Default for Acquisition {
    fn default() -> Self {
        Self {
            measurement_rate_ms: 30_000,
            window: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Signal {
    /// Signal generator peak-to-peak amplitude (uV)
    pub amplitude_uv_pp: u32,
    pub frequency_hz: f64,
    /// Generator output impedance (ohm)
    pub output_impedance_ohm: f64,
    /// Samples per channel per burst
    pub samples: usize,
    /// Sampling interval (ns); timebase 11 on the bench scope
    pub time_interval_ns: f64,
}

impl Default for Signal {
    fn default() -> Self {
        Self {
            amplitude_uv_pp: 2_000_000,
            frequency_hz: 1000.0,
            output_impedance_ohm: 600.0,
            samples: 2000,
            time_interval_ns: 20_480.0,
        }
    }
}

impl Signal {
    /// RMS of the generator sine in mV: `(uV_pp / 2000) / sqrt(2)`.
    pub fn source_rms_mv(&self) -> f64 {
        (f64::from(self.amplitude_uv_pp) / 2000.0) / std::f64::consts::SQRT_2
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Defaults {
    /// Reference temperature for temperature compensation (Celsius)
    pub temperature_c: f64,
    /// Concentration assumed before the first log correlation (mg/dL)
    pub concentration: f64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            temperature_c: 33.0,
            concentration: 400.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Compensation {
    /// Relative conductivity drift per minute of evaporation
    pub evaporation_coeff: f64,
    /// Relative conductivity change per degree Celsius
    pub temperature_coeff: f64,
}

impl Default for Compensation {
    fn default() -> Self {
        Self {
            evaporation_coeff: 0.000_020_565,
            temperature_coeff: 0.0162,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Thresholds {
    /// Highest tolerated standard deviation, applied to both channels (uV / uA)
    pub std_max: f64,
    /// Below this volume the cell is leaking or mid liquid change (mL). Inclusive.
    pub min_volume_ml: f64,
    /// Oldest accepted concentration log entry, in whole minutes
    pub staleness_minutes: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            std_max: 1500.0,
            min_volume_ml: 30.0,
            staleness_minutes: 10_000_000,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    /// Local testing profile; see `apply_debug_profile`.
    pub debug: bool,
    pub paths: Paths,
    pub output: Output,
    pub acquisition: Acquisition,
    pub signal: Signal,
    pub defaults: Defaults,
    pub compensation: Compensation,
    pub thresholds: Thresholds,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    load_toml_with(s, false)
}

/// Parse `s`; `force_debug` selects the debug profile even when the file
/// does not set `debug = true`. The profile only replaces values the file
/// leaves unset.
pub fn load_toml_with(s: &str, force_debug: bool) -> Result<Config, toml::de::Error> {
    let table = toml::from_str::<toml::Table>(s)?;
    let mut cfg = toml::from_str::<Config>(s)?;
    if force_debug || cfg.debug {
        cfg.apply_debug_defaults(&table);
    }
    Ok(cfg)
}

pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    load_file_with(path, false)
}

pub fn load_file_with(path: &std::path::Path, force_debug: bool) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml_with(&text, force_debug)
        .map_err(|e| eyre::eyre!("invalid configuration in {:?}: {}", path, e))
}

fn is_set(file: &toml::Table, section: &str, keys: &[&str]) -> bool {
    file.get(section)
        .and_then(toml::Value::as_table)
        .is_some_and(|t| keys.iter().any(|k| t.contains_key(*k)))
}

impl Config {
    /// Switch every setting to the local testing profile: no CSV output,
    /// process log in the working directory and a short cadence.
    pub fn apply_debug_profile(&mut self) {
        self.apply_debug_defaults(&toml::Table::new());
    }

    /// Debug profile for the settings `file` does not set explicitly.
    pub fn apply_debug_defaults(&mut self, file: &toml::Table) {
        self.debug = true;
        if !is_set(file, "output", &["enabled"]) {
            self.output.enabled = false;
        }
        if !is_set(file, "paths", &["output_dir"]) {
            self.paths.output_dir = PathBuf::new();
        }
        if !is_set(file, "paths", &["log_file"]) {
            self.paths.log_file = PathBuf::from(DEBUG_LOG_FILE);
        }
        if !is_set(file, "acquisition", &["measurement_rate_ms", "rate_ms"]) {
            self.acquisition.measurement_rate_ms = DEBUG_MEASUREMENT_RATE_MS;
        }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Acquisition
        if self.acquisition.window == 0 {
            eyre::bail!("acquisition.window must be >= 1");
        }
        if self.acquisition.measurement_rate_ms == 0 {
            eyre::bail!("acquisition.measurement_rate_ms must be >= 1");
        }
        if self.acquisition.measurement_rate_ms > 24 * 60 * 60 * 1000 {
            eyre::bail!("acquisition.measurement_rate_ms is unreasonably large (>24h)");
        }

        // Signal
        if self.signal.samples == 0 {
            eyre::bail!("signal.samples must be >= 1");
        }
        if !(self.signal.time_interval_ns.is_finite() && self.signal.time_interval_ns > 0.0) {
            eyre::bail!("signal.time_interval_ns must be > 0");
        }
        if !(self.signal.output_impedance_ohm.is_finite() && self.signal.output_impedance_ohm > 0.0)
        {
            eyre::bail!("signal.output_impedance_ohm must be > 0");
        }
        if !(self.signal.frequency_hz.is_finite() && self.signal.frequency_hz > 0.0) {
            eyre::bail!("signal.frequency_hz must be > 0");
        }
        if self.signal.amplitude_uv_pp == 0 {
            eyre::bail!("signal.amplitude_uv_pp must be > 0");
        }

        // Defaults
        if !self.defaults.temperature_c.is_finite() {
            eyre::bail!("defaults.temperature_c must be finite");
        }
        if !self.defaults.concentration.is_finite() {
            eyre::bail!("defaults.concentration must be finite");
        }

        // Compensation
        for (name, v) in [
            ("compensation.evaporation_coeff", self.compensation.evaporation_coeff),
            ("compensation.temperature_coeff", self.compensation.temperature_coeff),
        ] {
            if !v.is_finite() || v < 0.0 {
                eyre::bail!("{name} must be finite and >= 0");
            }
        }

        // Thresholds
        if !self.thresholds.std_max.is_finite() || self.thresholds.std_max <= 0.0 {
            eyre::bail!("thresholds.std_max must be > 0");
        }
        if !self.thresholds.min_volume_ml.is_finite() || self.thresholds.min_volume_ml < 0.0 {
            eyre::bail!("thresholds.min_volume_ml must be >= 0");
        }
        if self.thresholds.staleness_minutes == 0 {
            eyre::bail!("thresholds.staleness_minutes must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_bench_defaults() {
        let cfg = load_toml("").unwrap();
        assert!(!cfg.debug);
        assert!(cfg.output.enabled);
        assert_eq!(cfg.acquisition.measurement_rate_ms, 30_000);
        assert_eq!(cfg.acquisition.window, 100);
        assert_eq!(cfg.thresholds.min_volume_ml, 30.0);
        cfg.validate().unwrap();
    }

    #[test]
    fn source_rms_matches_two_volt_pp_sine() {
        let s = Signal::default();
        assert!((s.source_rms_mv() - 707.106_781).abs() < 1e-5);
    }
}
