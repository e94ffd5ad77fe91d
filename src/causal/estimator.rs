//! Uplift Estimator
//!
//! End to end T-learner training: stratified split, feature encoding fitted on the
//! pooled training rows, one calibrated random forest per arm, and uplift scores
//! for every held-out row.
use crate::calibration::classifier::CalibratedClassifier;
use crate::causal::metalearners::TLearner;
use crate::config::UpliftConfig;
use crate::constants::{OUTCOME_COL, TREATMENT_COL};
use crate::data::{Dataset, FeatureSpec};
use crate::encoder::FeatureEncoder;
use crate::errors::UpliftError;
use crate::forest::RandomForestClassifier;
use crate::split::stratified_train_test_split;
use crate::utils::{validate_binary, validate_length};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Held-out evaluation set: outcome, arm and predicted uplift, index aligned.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HeldOut {
    pub y_true: Vec<f64>,
    pub treatment: Vec<f64>,
    pub uplift_pred: Vec<f64>,
}

impl HeldOut {
    pub fn new(y_true: Vec<f64>, treatment: Vec<f64>, uplift_pred: Vec<f64>) -> Result<Self, UpliftError> {
        validate_length("treatment", y_true.len(), treatment.len())?;
        validate_length("uplift_pred", y_true.len(), uplift_pred.len())?;
        Ok(HeldOut {
            y_true,
            treatment,
            uplift_pred,
        })
    }

    pub fn len(&self) -> usize {
        self.y_true.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y_true.is_empty()
    }
}

/// Calibrated forest used for both arms.
pub type ArmModel = CalibratedClassifier<RandomForestClassifier>;

/// Train a T-learner on a prepared dataset and score the held-out partition.
///
/// The dataset must hold a binary `conversion` outcome and a binary `treatment`
/// column, as produced by [`prepare_treatment`](crate::data::prepare_treatment).
///
/// * `df` - Prepared dataset.
/// * `features` - Columns used as model inputs, with their kinds.
/// * `cfg` - Split fraction, seed and forest settings.
pub fn train_uplift_tlearner(df: &Dataset, features: &[FeatureSpec], cfg: &UpliftConfig) -> Result<HeldOut, UpliftError> {
    cfg.validate_parameters()?;
    if df.is_empty() {
        return Err(UpliftError::EmptyInput);
    }
    if let Some(leak) = features
        .iter()
        .find(|f| f.name == OUTCOME_COL || f.name == TREATMENT_COL)
    {
        return Err(UpliftError::InvalidParameter(
            "features".to_string(),
            format!("columns other than {} and {}", OUTCOME_COL, TREATMENT_COL),
            leak.name.clone(),
        ));
    }

    let y = df.numeric(OUTCOME_COL)?;
    let w = df.numeric(TREATMENT_COL)?;
    validate_binary(OUTCOME_COL, y)?;
    validate_binary(TREATMENT_COL, w)?;

    // Joint (treatment, outcome) key keeps all four cells proportional.
    let strata: Vec<usize> = w.iter().zip(y).map(|(&t, &o)| 2 * t as usize + o as usize).collect();
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let (train, test) = stratified_train_test_split(&strata, cfg.test_size, &mut rng)?;
    info!("Split {} rows into {} train and {} test rows.", df.rows(), train.len(), test.len());

    let train_df = df.take(&train);
    let test_df = df.take(&test);

    let mut encoder = FeatureEncoder::new(features.to_vec())?;
    let x_train = encoder.fit_transform(&train_df)?;
    let x_test = encoder.transform(&test_df)?;
    info!("Encoded {} features into {} columns.", features.len(), x_train.cols);

    let forest = RandomForestClassifier::new(cfg.forest_config())?;
    let mut learner: TLearner<ArmModel> = TLearner::new(
        CalibratedClassifier::new(forest.clone(), cfg.seed),
        CalibratedClassifier::new(forest, cfg.seed),
    );
    learner.fit(
        &x_train.matrix(),
        train_df.numeric(TREATMENT_COL)?,
        train_df.numeric(OUTCOME_COL)?,
    )?;
    let uplift_pred = learner.predict(&x_test.matrix())?;

    HeldOut::new(
        test_df.numeric(OUTCOME_COL)?.to_vec(),
        test_df.numeric(TREATMENT_COL)?.to_vec(),
        uplift_pred,
    )
}
