use crate::calibration::isotonic::IsotonicCalibrator;
use crate::classifier::{validate_fit_inputs, ProbabilisticClassifier};
use crate::constants::CALIBRATION_FOLDS;
use crate::data::Matrix;
use crate::errors::UpliftError;
use crate::split::stratified_kfold;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Cross-validated isotonic calibration around any probabilistic classifier.
///
/// For every fold a fresh copy of `base` is fitted on the other folds, and an
/// isotonic calibrator is fitted on its scores for the held-out fold. A
/// prediction is the mean of the calibrated probabilities of every
/// (model, calibrator) pair.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CalibratedClassifier<C> {
    pub base: C,
    pub cv: usize,
    pub seed: u64,
    pub calibrated: Vec<(C, IsotonicCalibrator)>,
}

impl<C> CalibratedClassifier<C>
where
    C: ProbabilisticClassifier + Clone,
{
    pub fn new(base: C, seed: u64) -> Self {
        CalibratedClassifier {
            base,
            cv: CALIBRATION_FOLDS,
            seed,
            calibrated: Vec::new(),
        }
    }

    pub fn set_cv(mut self, cv: usize) -> Self {
        self.cv = cv;
        self
    }
}

impl<C> ProbabilisticClassifier for CalibratedClassifier<C>
where
    C: ProbabilisticClassifier + Clone,
{
    fn fit(&mut self, x: &Matrix<f64>, y: &[f64]) -> Result<(), UpliftError> {
        validate_fit_inputs(x, y)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let folds = stratified_kfold(y, self.cv, &mut rng)?;

        let mut calibrated = Vec::with_capacity(folds.len());
        for (fold, (train, test)) in folds.iter().enumerate() {
            if train.is_empty() || test.is_empty() {
                debug!("Skipping calibration fold {}, train {} rows, test {} rows.", fold, train.len(), test.len());
                continue;
            }
            let train_data = x.select_rows(train);
            let train_matrix = Matrix::new(&train_data, train.len(), x.cols);
            let train_y: Vec<f64> = train.iter().map(|&i| y[i]).collect();
            let mut model = self.base.clone();
            model.fit(&train_matrix, &train_y)?;

            let test_data = x.select_rows(test);
            let test_matrix = Matrix::new(&test_data, test.len(), x.cols);
            let test_y: Vec<f64> = test.iter().map(|&i| y[i]).collect();
            let scores = model.predict_proba(&test_matrix)?;

            let positives = test_y.iter().filter(|&&v| v == 1.0).count();
            if positives == 0 || positives == test_y.len() {
                warn!(
                    "Calibration fold {} holds a single outcome class, its calibrator is constant.",
                    fold
                );
            }
            debug!(
                "Calibration fold {}: fitted on {} rows, calibrated on {} rows.",
                fold,
                train.len(),
                test.len()
            );
            calibrated.push((model, IsotonicCalibrator::new(&scores, &test_y)));
        }

        if calibrated.is_empty() {
            warn!(
                "Too few rows ({}) for {} calibration folds, fitting an uncalibrated model.",
                x.rows, self.cv
            );
            let mut model = self.base.clone();
            model.fit(x, y)?;
            calibrated.push((model, IsotonicCalibrator::default()));
        }

        self.calibrated = calibrated;
        Ok(())
    }

    fn predict_proba(&self, x: &Matrix<f64>) -> Result<Vec<f64>, UpliftError> {
        if !self.is_fitted() {
            return Err(UpliftError::NotFitted);
        }
        let mut total = vec![0.0; x.rows];
        for (model, calibrator) in &self.calibrated {
            let probs = calibrator.transform(&model.predict_proba(x)?);
            total.iter_mut().zip(probs).for_each(|(t, p)| *t += p);
        }
        let n_models = self.calibrated.len() as f64;
        Ok(total.into_iter().map(|t| t / n_models).collect())
    }

    fn is_fitted(&self) -> bool {
        !self.calibrated.is_empty()
    }
}
