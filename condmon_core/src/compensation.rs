//! Conductivity and its evaporation / temperature compensation.
//!
//! All functions are pure. Failures are returned as `MeasurementError` so the
//! controller can discard the point instead of persisting a non-finite value.

use chrono::NaiveDateTime;

use crate::config::CompensationCfg;
use crate::error::MeasurementError;

/// Voltage means at or below this magnitude (mV) are treated as zero.
pub const MIN_VOLTAGE_MV: f64 = 1e-9;

/// Conductivity in mS from RMS voltage (mV) and current (mA).
pub fn conductivity(voltage_rms: f64, current_rms: f64) -> Result<f64, MeasurementError> {
    if !voltage_rms.is_finite() || voltage_rms.abs() <= MIN_VOLTAGE_MV {
        return Err(MeasurementError::ZeroVoltage {
            voltage_mv: voltage_rms,
        });
    }
    Ok(current_rms / voltage_rms * 1000.0)
}

/// Fractional minutes from `reference` to `measured`.
#[inline]
pub fn minutes_between(reference: NaiveDateTime, measured: NaiveDateTime) -> f64 {
    (measured - reference).num_milliseconds() as f64 / 60_000.0
}

/// Undo the conductivity rise caused by evaporation since `reference`.
pub fn compensate_evaporation(
    conductivity: f64,
    measured: NaiveDateTime,
    reference: NaiveDateTime,
    coeff: f64,
) -> Result<f64, MeasurementError> {
    compensate_evaporation_minutes(conductivity, minutes_between(reference, measured), coeff)
}

/// Evaporation compensation over an already measured span of minutes.
pub fn compensate_evaporation_minutes(
    conductivity: f64,
    minutes: f64,
    coeff: f64,
) -> Result<f64, MeasurementError> {
    if minutes < 0.0 {
        return Err(MeasurementError::NegativeElapsed { minutes: -minutes });
    }
    divide(conductivity, 1.0 + coeff * minutes, "evaporation")
}

/// Normalize conductivity to `reference_temp`.
pub fn compensate_temperature(
    conductivity: f64,
    measured_temp: f64,
    reference_temp: f64,
    coeff: f64,
) -> Result<f64, MeasurementError> {
    divide(
        conductivity,
        1.0 + coeff * (measured_temp - reference_temp),
        "temperature",
    )
}

/// Evaporation first, then temperature. The order is fixed; compensated
/// values written by earlier runs depend on it.
pub fn compensate(
    conductivity: f64,
    measured: NaiveDateTime,
    evaporation_reference: NaiveDateTime,
    temperature_c: f64,
    cfg: &CompensationCfg,
) -> Result<f64, MeasurementError> {
    compensate_elapsed(
        conductivity,
        minutes_between(evaporation_reference, measured),
        temperature_c,
        cfg,
    )
}

/// [`compensate`] with the evaporation span given in minutes.
pub fn compensate_elapsed(
    conductivity: f64,
    evaporation_minutes: f64,
    temperature_c: f64,
    cfg: &CompensationCfg,
) -> Result<f64, MeasurementError> {
    let g = compensate_evaporation_minutes(conductivity, evaporation_minutes, cfg.evaporation_coeff)?;
    compensate_temperature(g, temperature_c, cfg.reference_temp_c, cfg.temperature_coeff)
}

#[inline]
fn divide(value: f64, denom: f64, what: &'static str) -> Result<f64, MeasurementError> {
    if !denom.is_finite() || denom.abs() < f64::EPSILON {
        return Err(MeasurementError::DegenerateCompensation(what));
    }
    Ok(value / denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn conductivity_in_millisiemens() {
        assert_eq!(conductivity(2.0, 0.004).unwrap(), 2.0);
    }

    #[test]
    fn zero_voltage_is_invalid() {
        assert!(matches!(
            conductivity(0.0, 1.0),
            Err(MeasurementError::ZeroVoltage { .. })
        ));
    }

    #[test]
    fn evaporation_scales_with_minutes() {
        let later = t0() + Duration::minutes(100);
        let g = compensate_evaporation(2.0, later, t0(), 0.001).unwrap();
        assert!((g - 2.0 / 1.1).abs() < 1e-12);
    }

    #[test]
    fn measurement_before_reference_is_rejected() {
        let earlier = t0() - Duration::minutes(1);
        let err = compensate_evaporation(2.0, earlier, t0(), 0.001).unwrap_err();
        assert_eq!(err, MeasurementError::NegativeElapsed { minutes: 1.0 });
    }

    #[test]
    fn minutes_form_matches_wall_form() {
        let later = t0() + Duration::minutes(30);
        assert_eq!(
            compensate_evaporation_minutes(2.0, 30.0, 0.001),
            compensate_evaporation(2.0, later, t0(), 0.001)
        );
    }

    #[test]
    fn temperature_above_reference_lowers_conductivity() {
        let g = compensate_temperature(2.0, 35.0, 33.0, 0.0162).unwrap();
        assert!((g - 2.0 / 1.0324).abs() < 1e-12);
    }

    #[test]
    fn vanishing_denominator_is_rejected() {
        assert_eq!(
            compensate_temperature(2.0, 0.0, 10.0, 0.1),
            Err(MeasurementError::DegenerateCompensation("temperature"))
        );
    }

    #[test]
    fn composite_applies_evaporation_then_temperature() {
        let cfg = CompensationCfg {
            evaporation_coeff: 0.01,
            temperature_coeff: 0.02,
            reference_temp_c: 30.0,
        };
        let later = t0() + Duration::minutes(10);
        let g = compensate(3.0, later, t0(), 35.0, &cfg).unwrap();
        assert!((g - 3.0 / 1.1 / 1.1).abs() < 1e-12);
    }
}
