//! Trailing simple moving average over close prices.
//!
//! Rolling sum over a fixed window. Lookback: window - 1 (first value at
//! index window-1). A window containing NaN yields `None`.

/// Trailing mean of `values` over `window` rows, inclusive of the current row.
///
/// Output has `values.len()` entries; the first `window - 1` are `None`.
pub fn trailing_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if window == 0 || n < window {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for &v in values.iter().take(window) {
        if v.is_nan() {
            nan_count += 1;
        } else {
            sum += v;
        }
    }
    if nan_count == 0 {
        result[window - 1] = Some(sum / window as f64);
    }

    for i in window..n {
        let leaving = values[i - window];
        let entering = values[i];
        if leaving.is_nan() {
            nan_count -= 1;
        } else {
            sum -= leaving;
        }
        if entering.is_nan() {
            nan_count += 1;
        } else {
            sum += entering;
        }

        if nan_count > 0 {
            continue;
        }
        // Periodic re-sum bounds accumulated rounding error.
        if i % window == 0 {
            sum = values[(i + 1 - window)..=i].iter().sum();
        }
        result[i] = Some(sum / window as f64);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("expected a value");
        assert!(
            (actual - expected).abs() < 1e-10,
            "actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn window_5_basic() {
        let v = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0];
        let r = trailing_mean(&v, 5);
        assert_eq!(r.len(), 7);
        assert!(r[..4].iter().all(Option::is_none));
        approx(r[4], 12.0);
        approx(r[5], 13.0);
        approx(r[6], 14.0);
    }

    #[test]
    fn window_1_is_identity() {
        let r = trailing_mean(&[100.0, 200.0, 300.0], 1);
        approx(r[0], 100.0);
        approx(r[1], 200.0);
        approx(r[2], 300.0);
    }

    #[test]
    fn nan_blanks_every_window_it_touches() {
        let v = [10.0, 11.0, f64::NAN, 13.0, 14.0, 15.0];
        let r = trailing_mean(&v, 3);
        assert!(r[2].is_none());
        assert!(r[3].is_none());
        assert!(r[4].is_none());
        approx(r[5], 14.0);
    }

    #[test]
    fn too_few_values() {
        let r = trailing_mean(&[10.0, 11.0], 5);
        assert!(r.iter().all(Option::is_none));
    }

    #[test]
    fn zero_window_is_all_none() {
        let r = trailing_mean(&[1.0, 2.0], 0);
        assert_eq!(r, vec![None, None]);
    }
}
