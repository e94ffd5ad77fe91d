//! Stats
//!
//! Two-sample tests used to compare campaign arms: a pooled z-test for
//! conversion rates, and Welch's t-test with a bootstrap confidence interval
//! for spend. The distribution functions they rely on are implemented here.
use crate::errors::UpliftError;
use crate::utils::{mean, percentile_sorted, sample_variance, sort_floats};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, SQRT_2};

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEF: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];
const BETACF_MAX_ITER: usize = 300;
const BETACF_EPS: f64 = 3e-16;
const FPMIN: f64 = 1e-300;

/// Complementary error function, with a fractional error below 1.2e-7.
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98 + t * (1.488_515_87 + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * (-z * z + poly).exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Standard normal cumulative distribution function.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal survival function, `1 - normal_cdf(x)`.
pub fn normal_sf(x: f64) -> f64 {
    0.5 * erfc(x / SQRT_2)
}

/// Natural log of the gamma function (Lanczos approximation).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula.
        return (PI / (PI * x).sin().abs()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;
    let a = LANCZOS_COEF
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS_COEF[0], |acc, (i, c)| acc + c / (x + i as f64));
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

// Continued fraction of the incomplete beta function, modified Lentz method.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    let clamp = |v: f64| if v.abs() < FPMIN { FPMIN } else { v };
    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 / clamp(1.0 - qab * x / qap);
    let mut h = d;
    for m in 1..=BETACF_MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / clamp(1.0 + aa * d);
        c = clamp(1.0 + aa / c);
        h *= d * c;
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / clamp(1.0 + aa * d);
        c = clamp(1.0 + aa / c);
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < BETACF_EPS {
            break;
        }
    }
    h
}

/// Regularized incomplete beta function `I_x(a, b)`.
pub fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Two-sided p-value of a Student-t statistic with `df` degrees of freedom.
pub fn student_t_two_sided_p(t: f64, df: f64) -> f64 {
    if t.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    incomplete_beta(df / 2.0, 0.5, df / (df + t * t))
}

/// Result of a two-sample test of proportions.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProportionTest {
    pub z_stat: f64,
    pub p_value: f64,
    pub rate_x: f64,
    pub rate_y: f64,
    /// `rate_x - rate_y`.
    pub abs_lift: f64,
    /// `abs_lift / rate_y`, NaN when `rate_y` is 0.
    pub rel_lift: f64,
}

/// Two-sided, two-sample z-test of proportions with a pooled variance.
///
/// A zero pooled variance gives a NaN statistic and p-value.
pub fn ab_test_proportion(x_success: u64, x_total: u64, y_success: u64, y_total: u64) -> Result<ProportionTest, UpliftError> {
    for (name, success, total) in [("x_total", x_success, x_total), ("y_total", y_success, y_total)] {
        if total == 0 || success > total {
            return Err(UpliftError::InvalidParameter(
                name.to_string(),
                "a positive count not below the number of successes".to_string(),
                total.to_string(),
            ));
        }
    }
    let (xs, xn, ys, yn) = (x_success as f64, x_total as f64, y_success as f64, y_total as f64);
    let rate_x = xs / xn;
    let rate_y = ys / yn;
    let pooled = (xs + ys) / (xn + yn);
    let se = (pooled * (1.0 - pooled) * (1.0 / xn + 1.0 / yn)).sqrt();
    let (z_stat, p_value) = if se > 0.0 {
        let z = (rate_x - rate_y) / se;
        (z, 2.0 * normal_sf(z.abs()))
    } else {
        (f64::NAN, f64::NAN)
    };
    let abs_lift = rate_x - rate_y;
    let rel_lift = if rate_y > 0.0 { abs_lift / rate_y } else { f64::NAN };
    Ok(ProportionTest {
        z_stat,
        p_value,
        rate_x,
        rate_y,
        abs_lift,
        rel_lift,
    })
}

/// Result of a two-sample test of means.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SpendTest {
    pub t_stat: f64,
    pub p_value: f64,
    /// `mean(x) - mean(y)`.
    pub mean_diff: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// Welch's t-test on the means of `x` and `y`, with a 95% percentile bootstrap
/// interval for the difference in means. Missing values are dropped.
///
/// * `n_boot` - Number of bootstrap resamples.
/// * `seed` - Seed of the bootstrap generator.
pub fn ab_test_spend(x: &[f64], y: &[f64], n_boot: usize, seed: u64) -> Result<SpendTest, UpliftError> {
    let x: Vec<f64> = x.iter().copied().filter(|v| !v.is_nan()).collect();
    let y: Vec<f64> = y.iter().copied().filter(|v| !v.is_nan()).collect();
    for (name, values) in [("x", &x), ("y", &y)] {
        if values.len() < 2 {
            return Err(UpliftError::InvalidParameter(
                name.to_string(),
                "at least 2 non-missing values".to_string(),
                values.len().to_string(),
            ));
        }
    }
    if n_boot == 0 {
        return Err(UpliftError::InvalidParameter(
            "n_boot".to_string(),
            "at least 1".to_string(),
            "0".to_string(),
        ));
    }

    let (nx, ny) = (x.len() as f64, y.len() as f64);
    let (mx, my) = (mean(&x), mean(&y));
    let vx = sample_variance(&x) / nx;
    let vy = sample_variance(&y) / ny;
    let se2 = vx + vy;
    let (t_stat, p_value) = if se2 > 0.0 {
        let t = (mx - my) / se2.sqrt();
        let df = se2 * se2 / (vx * vx / (nx - 1.0) + vy * vy / (ny - 1.0));
        (t, student_t_two_sided_p(t, df))
    } else {
        (f64::NAN, f64::NAN)
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let mut diffs: Vec<f64> = (0..n_boot)
        .map(|_| {
            let bx = (0..x.len()).map(|_| x[rng.gen_range(0..x.len())]).sum::<f64>() / nx;
            let by = (0..y.len()).map(|_| y[rng.gen_range(0..y.len())]).sum::<f64>() / ny;
            bx - by
        })
        .collect();
    sort_floats(&mut diffs);

    Ok(SpendTest {
        t_stat,
        p_value,
        mean_diff: mx - my,
        ci_lower: percentile_sorted(&diffs, 0.025),
        ci_upper: percentile_sorted(&diffs, 0.975),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal() {
        assert!((2.0 * normal_sf(1.959963985) - 0.05).abs() < 1e-6);
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.0) + normal_sf(1.0) - 1.0).abs() < 1e-12);
        assert!(normal_cdf(-1.0) < normal_cdf(1.0));
    }

    #[test]
    fn test_ln_gamma() {
        assert!((ln_gamma(5.0) - 24f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - PI.sqrt().ln()).abs() < 1e-10);
        assert!(ln_gamma(1.0).abs() < 1e-10);
    }

    #[test]
    fn test_student_t() {
        assert!((student_t_two_sided_p(2.228138852, 10.0) - 0.05).abs() < 1e-8);
        // Cauchy: P(|T| > 1) = 0.5.
        assert!((student_t_two_sided_p(1.0, 1.0) - 0.5).abs() < 1e-10);
        assert_eq!(student_t_two_sided_p(0.0, 5.0), 1.0);
        assert!(student_t_two_sided_p(f64::NAN, 5.0).is_nan());
    }

    #[test]
    fn test_ab_test_proportion() {
        let res = ab_test_proportion(45, 100, 30, 100).unwrap();
        assert!((res.z_stat - 2.1908902300).abs() < 1e-8);
        assert!((res.p_value - 0.0284597369).abs() < 1e-6);
        assert!((res.abs_lift - 0.15).abs() < 1e-12);
        assert!((res.rel_lift - 0.5).abs() < 1e-12);

        let none = ab_test_proportion(5, 100, 0, 100).unwrap();
        assert!(none.rel_lift.is_nan());

        let flat = ab_test_proportion(0, 10, 0, 20).unwrap();
        assert!(flat.z_stat.is_nan());
        assert!(flat.p_value.is_nan());

        assert!(ab_test_proportion(1, 0, 1, 10).is_err());
        assert!(ab_test_proportion(11, 10, 1, 10).is_err());
    }

    #[test]
    fn test_ab_test_spend() {
        let x = vec![1., 2., 3., f64::NAN, 4., 5.];
        let y = vec![2., 4., 6., 8., 10.];
        let res = ab_test_spend(&x, &y, 2000, 42).unwrap();
        assert!((res.t_stat + 1.8973665961).abs() < 1e-8);
        assert!((res.p_value - 0.1075311949).abs() < 1e-6);
        assert_eq!(res.mean_diff, -3.0);
        assert!(res.ci_lower < res.mean_diff && res.mean_diff < res.ci_upper);

        let again = ab_test_spend(&x, &y, 2000, 42).unwrap();
        assert_eq!(res, again);

        assert!(ab_test_spend(&[1.0, f64::NAN], &y, 100, 1).is_err());
        assert!(ab_test_spend(&x, &y, 0, 1).is_err());
    }

    #[test]
    fn test_ab_test_spend_constant_groups() {
        let res = ab_test_spend(&[1., 1., 1.], &[1., 1.], 10, 0).unwrap();
        assert!(res.t_stat.is_nan());
        assert!(res.p_value.is_nan());
        assert_eq!(res.ci_lower, 0.0);
    }
}
