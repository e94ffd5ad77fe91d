use crate::errors::UpliftError;
use std::cmp::Ordering;

/// Create a string of all available items.
pub fn items_to_strings(items: Vec<&str>) -> String {
    let mut s = String::new();
    for i in items {
        s.push_str(i);
        s.push_str(&String::from(", "));
    }
    s
}

// Validation
pub fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), UpliftError> {
    if value.is_nan() || value < min || max < value {
        let ex_msg = format!("real value within range {} and {}", min, max);
        Err(UpliftError::InvalidParameter(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Check that a fraction lies in (0, 1].
pub fn validate_fraction_parameter(value: f64, parameter: &str) -> Result<(), UpliftError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(UpliftError::InvalidParameter(
            parameter.to_string(),
            "real value within (0, 1]".to_string(),
            value.to_string(),
        ))
    }
}

pub fn validate_finite_parameter(value: f64, parameter: &str) -> Result<(), UpliftError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(UpliftError::InvalidParameter(
            parameter.to_string(),
            "a finite real value".to_string(),
            value.to_string(),
        ))
    }
}

/// Check that a slice has the expected number of values.
pub fn validate_length(name: &str, expected: usize, found: usize) -> Result<(), UpliftError> {
    if expected == found {
        Ok(())
    } else {
        Err(UpliftError::LengthMismatch(name.to_string(), expected, found))
    }
}

/// Check every value in a slice is either 0 or 1.
pub fn validate_binary(name: &str, values: &[f64]) -> Result<(), UpliftError> {
    match values.iter().find(|&&v| v != 0.0 && v != 1.0) {
        Some(&v) => Err(UpliftError::InvalidLabel(name.to_string(), v)),
        None => Ok(()),
    }
}

/// Indices of `scores` ordered from highest to lowest.
///
/// The sort is stable, so equal scores keep their original relative order.
pub fn argsort_descending(scores: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..scores.len()).collect();
    idx.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    idx
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance with one delta degree of freedom. NaN for fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Percentile of a sorted slice with linear interpolation between the
/// closest ranks. `q` is expected to be within 0 and 1.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

pub fn sort_floats(values: &mut [f64]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

/// Run `op` on a dedicated rayon pool when a thread count is provided,
/// otherwise on the global pool.
pub fn install_in_pool<R, F>(num_threads: Option<usize>, op: F) -> Result<R, UpliftError>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match num_threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build().map_err(|e| {
                UpliftError::InvalidParameter("num_threads".to_string(), "a buildable thread pool".to_string(), e.to_string())
            })?;
            Ok(pool.install(op))
        }
        None => Ok(op()),
    }
}

#[inline]
pub fn precision_round(n: f64, precision: i32) -> f64 {
    let p = (10.0_f64).powi(precision);
    (n * p).round() / p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round() {
        assert_eq!(0.3, precision_round(0.3333, 1));
        assert_eq!(0.2343, precision_round(0.2343123123123, 4));
    }

    #[test]
    fn test_argsort_descending_is_stable() {
        let scores = vec![0.2, 0.9, 0.2, 0.5, 0.9];
        assert_eq!(argsort_descending(&scores), vec![1, 4, 3, 0, 2]);
    }

    #[test]
    fn test_percentile_sorted() {
        let v = vec![1., 2., 3., 4., 5.];
        assert_eq!(percentile_sorted(&v, 0.0), 1.0);
        assert_eq!(percentile_sorted(&v, 1.0), 5.0);
        assert_eq!(percentile_sorted(&v, 0.5), 3.0);
        assert_eq!(precision_round(percentile_sorted(&v, 0.1), 6), 1.4);
    }

    #[test]
    fn test_sample_variance() {
        assert_eq!(sample_variance(&[2., 4., 4., 4., 5., 5., 7., 9.]), 32.0 / 7.0);
        assert!(sample_variance(&[1.0]).is_nan());
    }

    #[test]
    fn test_validate_binary() {
        assert!(validate_binary("treatment", &[0., 1., 1.]).is_ok());
        assert!(matches!(
            validate_binary("treatment", &[0., 2.]),
            Err(UpliftError::InvalidLabel(_, v)) if v == 2.0
        ));
    }

    #[test]
    fn test_validate_float_parameter() {
        assert!(validate_float_parameter(0.3, 0.0, 1.0, "test_size").is_ok());
        assert!(validate_float_parameter(f64::NAN, 0.0, 1.0, "test_size").is_err());
        assert!(validate_float_parameter(-1.0, 0.0, f64::INFINITY, "margin").is_err());
        assert!(validate_finite_parameter(f64::INFINITY, "margin").is_err());
    }

    #[test]
    fn test_validate_fraction_parameter() {
        assert!(validate_fraction_parameter(1.0, "k").is_ok());
        assert!(validate_fraction_parameter(f64::MIN_POSITIVE / 4.0, "k").is_ok());
        assert!(validate_fraction_parameter(0.0, "k").is_err());
        assert!(validate_fraction_parameter(1.0 + f64::EPSILON, "k").is_err());
        assert!(validate_fraction_parameter(f64::NAN, "k").is_err());
    }
}
