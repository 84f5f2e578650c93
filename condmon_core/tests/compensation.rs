use chrono::{Duration, NaiveDate, NaiveDateTime};
use condmon_core::compensation::{
    compensate, compensate_evaporation, compensate_temperature, conductivity,
};
use condmon_core::{CompensationCfg, MeasurementError};
use proptest::prelude::*;
use rstest::rstest;

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 2)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

#[rstest]
fn conductivity_scenario() {
    assert_eq!(conductivity(2.0, 0.004).unwrap(), 2.0);
}

#[rstest]
#[case(0.0)]
#[case(-0.0)]
#[case(f64::NAN)]
fn degenerate_voltage_is_invalid(#[case] v: f64) {
    assert!(matches!(
        conductivity(v, 0.5),
        Err(MeasurementError::ZeroVoltage { .. })
    ));
}

#[rstest]
fn default_coefficients_after_one_day() {
    let cfg = CompensationCfg::default();
    let g = compensate(2.0, t0() + Duration::days(1), t0(), 33.0, &cfg).unwrap();
    // 1440 min * 0.000020565 = 0.0296136
    assert!((g - 2.0 / 1.029_613_6).abs() < 1e-9);
}

#[rstest]
fn compensation_order_is_evaporation_then_temperature() {
    let cfg = CompensationCfg {
        evaporation_coeff: 0.5,
        temperature_coeff: 0.1,
        reference_temp_c: 20.0,
    };
    let measured = t0() + Duration::minutes(2);
    let expected = {
        let evap = compensate_evaporation(4.0, measured, t0(), 0.5).unwrap();
        compensate_temperature(evap, 25.0, 20.0, 0.1).unwrap()
    };
    assert_eq!(compensate(4.0, measured, t0(), 25.0, &cfg).unwrap(), expected);
}

proptest! {
    #[test]
    fn zero_temperature_delta_is_identity(
        x in -1e4f64..1e4,
        t in -50f64..150.0,
        coeff in -10f64..10.0,
    ) {
        prop_assert_eq!(compensate_temperature(x, t, t, coeff).unwrap(), x);
    }

    #[test]
    fn zero_elapsed_time_is_identity(
        x in -1e4f64..1e4,
        minutes in 0i64..1_000_000,
        coeff in -10f64..10.0,
    ) {
        let t = t0() + Duration::minutes(minutes);
        prop_assert_eq!(compensate_evaporation(x, t, t, coeff).unwrap(), x);
    }
}
