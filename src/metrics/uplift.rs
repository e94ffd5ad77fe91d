use crate::errors::UpliftError;
use crate::utils::{argsort_descending, validate_binary, validate_fraction_parameter, validate_length};
use log::warn;
use serde::{Deserialize, Serialize};

/// Qini curve, one point per record ordered by descending uplift score.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct QiniCurve {
    /// Fraction of the population targeted, from `1/n` to 1.
    pub phi: Vec<f64>,
    /// Treated responders over all treated minus control responders over all control.
    pub qini: Vec<f64>,
}

impl QiniCurve {
    pub fn len(&self) -> usize {
        self.phi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phi.is_empty()
    }
}

fn validate_inputs(y_true: &[f64], treatment: &[f64], scores: &[f64]) -> Result<(), UpliftError> {
    if y_true.is_empty() {
        return Err(UpliftError::EmptyInput);
    }
    validate_length("treatment", y_true.len(), treatment.len())?;
    validate_length("uplift_scores", y_true.len(), scores.len())?;
    validate_binary("treatment", treatment)
}

// Treated and control group sizes, both required to be non-zero.
fn arm_sizes(treatment: &[f64]) -> Result<(f64, f64), UpliftError> {
    let n_t = treatment.iter().sum::<f64>();
    let n_c = treatment.len() as f64 - n_t;
    if n_t == 0.0 {
        return Err(UpliftError::EmptyArm("treatment".to_string()));
    }
    if n_c == 0.0 {
        return Err(UpliftError::EmptyArm("control".to_string()));
    }
    Ok((n_t, n_c))
}

// Overall response rate difference between the treated and control groups.
fn response_delta(y_true: &[f64], treatment: &[f64]) -> Result<f64, UpliftError> {
    let (n_t, n_c) = arm_sizes(treatment)?;
    let (resp_t, resp_c) = y_true
        .iter()
        .zip(treatment)
        .fold((0.0, 0.0), |(rt, rc), (y, t)| (rt + y * t, rc + y * (1.0 - t)));
    Ok(resp_t / n_t - resp_c / n_c)
}

fn trapezoid_area(x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    (x0 - x1).abs() * (y0 + y1) * 0.5
}

/// Cumulative uplift as the population is targeted by descending score.
///
/// Records with equal scores keep their original order.
///
/// * `y_true` - Observed outcomes.
/// * `uplift_scores` - Predicted uplift.
/// * `treatment` - Binary arm indicator.
pub fn qini_curve(y_true: &[f64], uplift_scores: &[f64], treatment: &[f64]) -> Result<QiniCurve, UpliftError> {
    validate_inputs(y_true, treatment, uplift_scores)?;
    let (n_t, n_c) = arm_sizes(treatment)?;
    let n = y_true.len() as f64;

    let order = argsort_descending(uplift_scores);
    let mut phi = Vec::with_capacity(order.len());
    let mut qini = Vec::with_capacity(order.len());
    let (mut cum_t, mut cum_c) = (0.0, 0.0);
    for (m, &i) in order.iter().enumerate() {
        cum_t += y_true[i] * treatment[i];
        cum_c += y_true[i] * (1.0 - treatment[i]);
        phi.push((m + 1) as f64 / n);
        qini.push(cum_t / n_t - cum_c / n_c);
    }
    Ok(QiniCurve { phi, qini })
}

/// Qini coefficient: the area under the curve, normalised so random targeting
/// scores 0 and the perfect straight line to the overall response difference
/// scores 1. Returns exactly 0 when the overall difference is 0.
pub fn qini_auc(phi: &[f64], qini: &[f64], treatment: &[f64], y_true: &[f64]) -> Result<f64, UpliftError> {
    if phi.is_empty() {
        return Err(UpliftError::EmptyInput);
    }
    validate_length("qini", phi.len(), qini.len())?;
    validate_length("treatment", phi.len(), treatment.len())?;
    validate_length("y_true", phi.len(), y_true.len())?;
    validate_binary("treatment", treatment)?;

    let area_model: f64 = phi
        .windows(2)
        .zip(qini.windows(2))
        .map(|(x, y)| trapezoid_area(x[0], x[1], y[0], y[1]))
        .sum();
    let delta = response_delta(y_true, treatment)?;
    let area_random = delta / 2.0;
    let area_perfect = delta;
    if area_perfect - area_random == 0.0 {
        return Ok(0.0);
    }
    Ok((area_model - area_random) / (area_perfect - area_random))
}

/// Qini value of random targeting at every `phi`, the overall response
/// difference scaled by the targeted fraction.
pub fn qini_random_baseline(phi: &[f64], treatment: &[f64], y_true: &[f64]) -> Result<Vec<f64>, UpliftError> {
    if treatment.is_empty() {
        return Err(UpliftError::EmptyInput);
    }
    validate_length("y_true", treatment.len(), y_true.len())?;
    validate_binary("treatment", treatment)?;
    let delta = response_delta(y_true, treatment)?;
    Ok(phi.iter().map(|p| delta * p).collect())
}

/// Observed uplift among the top `k` fraction of records by predicted score.
///
/// Returns 0 when the top fraction holds no record, or only records of one arm.
///
/// * `k` - Fraction of the population, within (0, 1].
pub fn uplift_at_k(y_true: &[f64], treatment: &[f64], uplift_scores: &[f64], k: f64) -> Result<f64, UpliftError> {
    validate_fraction_parameter(k, "k")?;
    validate_inputs(y_true, treatment, uplift_scores)?;

    let top_n = (y_true.len() as f64 * k).floor() as usize;
    if top_n == 0 {
        return Ok(0.0);
    }
    let order = argsort_descending(uplift_scores);
    let (mut sum_t, mut n_t, mut sum_c, mut n_c) = (0.0, 0usize, 0.0, 0usize);
    for &i in &order[..top_n] {
        if treatment[i] == 1.0 {
            sum_t += y_true[i];
            n_t += 1;
        } else {
            sum_c += y_true[i];
            n_c += 1;
        }
    }
    if n_t == 0 || n_c == 0 {
        warn!(
            "Top {} records at k={} hold {} treated and {} control records, uplift is set to 0.",
            top_n, k, n_t, n_c
        );
        return Ok(0.0);
    }
    Ok(sum_t / n_t as f64 - sum_c / n_c as f64)
}
