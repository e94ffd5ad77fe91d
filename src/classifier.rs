//! Classifier
//!
//! The capability shared by every outcome model: fit on a binary target,
//! then score rows with the probability of the positive class.
use crate::data::Matrix;
use crate::errors::UpliftError;
use crate::utils::{validate_binary, validate_length};

pub trait ProbabilisticClassifier: Send + Sync {
    /// Fit the model on `x` with binary target `y` (0 or 1).
    fn fit(&mut self, x: &Matrix<f64>, y: &[f64]) -> Result<(), UpliftError>;

    /// Probability of `y == 1` for every row of `x`.
    fn predict_proba(&self, x: &Matrix<f64>) -> Result<Vec<f64>, UpliftError>;

    fn is_fitted(&self) -> bool;
}

/// Shared input checks for [`ProbabilisticClassifier::fit`].
pub(crate) fn validate_fit_inputs(x: &Matrix<f64>, y: &[f64]) -> Result<(), UpliftError> {
    if x.rows == 0 {
        return Err(UpliftError::EmptyInput);
    }
    validate_length("y", x.rows, y.len())?;
    validate_binary("y", y)
}
