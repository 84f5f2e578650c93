use chrono::NaiveDate;
use condmon_core::{GateCfg, Measurement, ProcessValues, RejectReason, ValidityGate, WindowStats};
use rstest::rstest;

fn measurement(volume: f64, voltage_std: f64, current_std: f64) -> Measurement {
    Measurement {
        timestamp: NaiveDate::from_ymd_opt(2024, 5, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap(),
        stats: WindowStats {
            voltage_mean: 2.0,
            voltage_std,
            current_mean: 0.004,
            current_std,
        },
        conductivity: 2.0,
        compensated_conductivity: Some(2.0),
        process: Some(ProcessValues {
            concentration: 400.0,
            target_concentration: 400.0,
            volume,
            temperature: 33.0,
        }),
    }
}

fn gate() -> ValidityGate {
    ValidityGate::new(GateCfg::default())
}

#[rstest]
#[case(30.0, true)]
#[case(29.0, false)]
#[case(29.999, false)]
#[case(250.0, true)]
fn volume_threshold_is_inclusive(#[case] volume: f64, #[case] accepted: bool) {
    let r = gate().check(&measurement(volume, 10.0, 10.0));
    assert_eq!(r.is_ok(), accepted, "{r:?}");
}

#[rstest]
#[case(1499.0, 10.0, true)]
#[case(1500.0, 10.0, false)]
#[case(10.0, 1500.0, false)]
#[case(10.0, 1499.999, true)]
fn std_threshold_is_strict(#[case] v_std: f64, #[case] i_std: f64, #[case] accepted: bool) {
    let r = gate().check(&measurement(40.0, v_std, i_std));
    assert_eq!(r.is_ok(), accepted, "{r:?}");
}

#[rstest]
fn missing_process_values_rejected() {
    let mut m = measurement(40.0, 10.0, 10.0);
    m.process = None;
    m.compensated_conductivity = None;
    assert_eq!(gate().check(&m), Err(RejectReason::MissingProcessValues));
}

#[rstest]
fn nan_never_passes() {
    assert!(gate().check(&measurement(f64::NAN, 10.0, 10.0)).is_err());
    assert!(gate().check(&measurement(40.0, f64::NAN, 10.0)).is_err());
    assert!(gate().check(&measurement(40.0, 10.0, f64::NAN)).is_err());
}

#[rstest]
fn volume_checked_before_noise() {
    let r = gate().check(&measurement(5.0, 9999.0, 9999.0));
    assert!(matches!(r, Err(RejectReason::LowVolume { .. })));
}
