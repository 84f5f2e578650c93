//! Numeric and time helpers shared by the core modules.

/// Scale from mV/mA storage units to the uV/uA reporting units.
pub const MILLI_TO_MICRO: f64 = 1000.0;

/// Root-mean-square of a waveform. Empty input yields 0.
#[inline]
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sq: f64 = samples.iter().map(|x| x * x).sum();
    (sq / samples.len() as f64).sqrt()
}

/// Population mean and standard deviation (ddof = 0). Empty input yields (0, 0).
pub fn mean_std<'a>(values: impl Iterator<Item = &'a f64> + Clone) -> (f64, f64) {
    let n = values.clone().count();
    if n == 0 {
        return (0.0, 0.0);
    }
    let n = n as f64;
    let mean = values.clone().sum::<f64>() / n;
    let var = values.map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Whole minutes between two timestamps, truncated toward zero, absolute.
#[inline]
pub fn abs_whole_minutes(a: chrono::NaiveDateTime, b: chrono::NaiveDateTime) -> i64 {
    let secs = (a - b).num_seconds().abs();
    secs / 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_square_wave_is_amplitude() {
        assert_eq!(rms(&[3.0, -3.0, 3.0, -3.0]), 3.0);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn mean_std_population() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let (m, s) = mean_std(v.iter());
        assert_eq!(m, 5.0);
        assert_eq!(s, 2.0);
    }

    #[test]
    fn whole_minutes_truncate() {
        let t = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let later = t + chrono::Duration::seconds(179);
        assert_eq!(abs_whole_minutes(t, later), 2);
        assert_eq!(abs_whole_minutes(later, t), 2);
    }
}
