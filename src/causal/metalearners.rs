//! Meta-learners for Heterogeneous Treatment Effect (HTE) estimation.
//!
//! The T-learner fits one outcome model per arm and scores uplift as the
//! difference between the two predicted probabilities.
use crate::classifier::ProbabilisticClassifier;
use crate::data::Matrix;
use crate::errors::UpliftError;
use crate::utils::{validate_binary, validate_length};
use log::info;
use serde::{Deserialize, Serialize};

/// T-Learner (Two Learners).
///
/// Estimates $\mu_0(X)$ on control data and $\mu_1(X)$ on treated data.
/// Uplift(x) = $\mu_1(x) - \mu_0(x)$.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TLearner<C> {
    pub mu0: C,
    pub mu1: C,
}

impl<C> TLearner<C>
where
    C: ProbabilisticClassifier,
{
    /// Create a T-learner from the control model `mu0` and the treatment model `mu1`.
    pub fn new(mu0: C, mu1: C) -> Self {
        TLearner { mu0, mu1 }
    }

    /// Fit `mu1` on the rows with `w == 1` and `mu0` on the rows with `w == 0`.
    pub fn fit(&mut self, x: &Matrix<f64>, w: &[f64], y: &[f64]) -> Result<(), UpliftError> {
        if x.rows == 0 {
            return Err(UpliftError::EmptyInput);
        }
        validate_length("treatment", x.rows, w.len())?;
        validate_length("y", x.rows, y.len())?;
        validate_binary("treatment", w)?;
        validate_binary("y", y)?;

        let idx0: Vec<usize> = w
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == 0.0)
            .map(|(i, _)| i)
            .collect();
        let idx1: Vec<usize> = w
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == 1.0)
            .map(|(i, _)| i)
            .collect();
        if idx1.is_empty() {
            return Err(UpliftError::EmptyArm("treatment".to_string()));
        }
        if idx0.is_empty() {
            return Err(UpliftError::EmptyArm("control".to_string()));
        }
        info!("Fitting T-learner on {} treated and {} control rows.", idx1.len(), idx0.len());

        let x0_data = x.select_rows(&idx0);
        let y0: Vec<f64> = idx0.iter().map(|&i| y[i]).collect();
        let x1_data = x.select_rows(&idx1);
        let y1: Vec<f64> = idx1.iter().map(|&i| y[i]).collect();

        let matrix0 = Matrix::new(&x0_data, idx0.len(), x.cols);
        let matrix1 = Matrix::new(&x1_data, idx1.len(), x.cols);

        self.mu0.fit(&matrix0, &y0)?;
        self.mu1.fit(&matrix1, &y1)?;
        Ok(())
    }

    /// Treated and control probabilities, `(p1, p0)`.
    pub fn predict_arms(&self, x: &Matrix<f64>) -> Result<(Vec<f64>, Vec<f64>), UpliftError> {
        let p1 = self.mu1.predict_proba(x)?;
        let p0 = self.mu0.predict_proba(x)?;
        Ok((p1, p0))
    }

    /// Estimated uplift `p1 - p0` for every row.
    pub fn predict(&self, x: &Matrix<f64>) -> Result<Vec<f64>, UpliftError> {
        let (p1, p0) = self.predict_arms(x)?;
        Ok(p1.iter().zip(p0.iter()).map(|(a, b)| a - b).collect())
    }

    pub fn is_fitted(&self) -> bool {
        self.mu0.is_fitted() && self.mu1.is_fitted()
    }
}
