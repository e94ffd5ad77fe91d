//! Config
//!
//! Settings for the uplift estimator and the ROI simulation. Both structs fill
//! missing JSON fields with their defaults, so a partial file is a valid config.
use crate::constants::{
    DEFAULT_COST_EMAIL, DEFAULT_KS, DEFAULT_MARGIN, DEFAULT_MAX_DEPTH, DEFAULT_N_ESTIMATORS, DEFAULT_SEED,
    DEFAULT_TEST_SIZE,
};
use crate::errors::UpliftError;
use crate::forest::{ForestConfig, MaxFeatures};
use crate::sampler::SampleMethod;
use crate::utils::{validate_finite_parameter, validate_fraction_parameter};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_test_size() -> f64 {
    DEFAULT_TEST_SIZE
}
fn default_seed() -> u64 {
    DEFAULT_SEED
}
fn default_n_estimators() -> usize {
    DEFAULT_N_ESTIMATORS
}
fn default_max_depth() -> Option<usize> {
    Some(DEFAULT_MAX_DEPTH)
}
fn default_min_samples_leaf() -> usize {
    1
}
fn default_max_features() -> MaxFeatures {
    MaxFeatures::Sqrt
}
fn default_ks() -> Vec<f64> {
    DEFAULT_KS.to_vec()
}
fn default_margin() -> f64 {
    DEFAULT_MARGIN
}
fn default_cost_email() -> f64 {
    DEFAULT_COST_EMAIL
}

/// Settings of the T-learner training procedure.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UpliftConfig {
    /// Fraction of rows held out for evaluation, within (0, 1).
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    /// Seed of the split, the calibration folds and the forests.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Number of trees of every forest.
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Depth limit of every tree, `None` grows trees until leaves are pure.
    #[serde(default = "default_max_depth")]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    #[serde(default = "default_max_features")]
    pub max_features: MaxFeatures,
    /// Size of a dedicated rayon pool, `None` uses the global pool.
    #[serde(default)]
    pub num_threads: Option<usize>,
}

impl Default for UpliftConfig {
    fn default() -> Self {
        UpliftConfig {
            test_size: default_test_size(),
            seed: default_seed(),
            n_estimators: default_n_estimators(),
            max_depth: default_max_depth(),
            min_samples_leaf: default_min_samples_leaf(),
            max_features: default_max_features(),
            num_threads: None,
        }
    }
}

impl UpliftConfig {
    pub fn set_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn set_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn set_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn set_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    pub fn set_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn set_num_threads(mut self, num_threads: Option<usize>) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Forest settings shared by the treatment and control models.
    pub fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
            sample_method: SampleMethod::Bootstrap,
            seed: self.seed,
            num_threads: self.num_threads,
        }
    }

    pub fn validate_parameters(&self) -> Result<(), UpliftError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(UpliftError::InvalidParameter(
                "test_size".to_string(),
                "real value strictly between 0 and 1".to_string(),
                self.test_size.to_string(),
            ));
        }
        self.forest_config().validate_parameters()
    }
}

/// Settings of the ROI simulation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RoiConfig {
    /// Targeting fractions, each within (0, 1].
    #[serde(default = "default_ks")]
    pub ks: Vec<f64>,
    /// Revenue per incremental conversion.
    #[serde(default = "default_margin")]
    pub margin: f64,
    /// Cost of sending one e-mail.
    #[serde(default = "default_cost_email")]
    pub cost_email: f64,
}

impl Default for RoiConfig {
    fn default() -> Self {
        RoiConfig {
            ks: default_ks(),
            margin: default_margin(),
            cost_email: default_cost_email(),
        }
    }
}

impl RoiConfig {
    pub fn set_ks(mut self, ks: Vec<f64>) -> Self {
        self.ks = ks;
        self
    }

    pub fn set_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn set_cost_email(mut self, cost_email: f64) -> Self {
        self.cost_email = cost_email;
        self
    }

    pub fn validate_parameters(&self) -> Result<(), UpliftError> {
        for &k in &self.ks {
            validate_fraction_parameter(k, "k")?;
        }
        validate_finite_parameter(self.margin, "margin")?;
        validate_finite_parameter(self.cost_email, "cost_email")
    }
}

/// JSON persistence of a config.
pub trait ConfigIO: Serialize + DeserializeOwned + Sized {
    /// Save the config as a json object to a file.
    ///
    /// * `path` - Path to save the config.
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), UpliftError> {
        fs::write(path, self.to_json()?).map_err(|e| UpliftError::UnableToWrite(e.to_string()))
    }

    fn to_json(&self) -> Result<String, UpliftError> {
        serde_json::to_string_pretty(self).map_err(|e| UpliftError::UnableToWrite(e.to_string()))
    }

    /// Load a config from a JSON string.
    fn from_json(json_str: &str) -> Result<Self, UpliftError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| UpliftError::UnableToRead(e.to_string()))
    }

    /// Load a config from a path to a json file.
    ///
    /// * `path` - Path to load the config from.
    fn load<P: AsRef<Path>>(path: P) -> Result<Self, UpliftError> {
        let json_str = fs::read_to_string(path).map_err(|e| UpliftError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl ConfigIO for UpliftConfig {}
impl ConfigIO for RoiConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_defaults() {
        let cfg = UpliftConfig::default();
        assert_eq!(cfg.test_size, 0.3);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.n_estimators, 200);
        assert_eq!(cfg.max_depth, Some(6));
        assert!(cfg.validate_parameters().is_ok());

        let roi = RoiConfig::default();
        assert_eq!(roi.ks, vec![0.05, 0.10, 0.20, 0.30, 1.00]);
        assert_eq!(roi.margin, 15.0);
        assert_eq!(roi.cost_email, 0.10);
        assert!(roi.validate_parameters().is_ok());
    }

    #[test]
    fn test_config_partial_json() {
        let cfg = UpliftConfig::from_json(r#"{"seed": 7, "max_depth": null}"#).unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.max_depth, None);
        assert_eq!(cfg.n_estimators, 200);

        let roi = RoiConfig::from_json(r#"{"ks": [0.5]}"#).unwrap();
        assert_eq!(roi.ks, vec![0.5]);
        assert_eq!(roi.margin, 15.0);

        assert!(matches!(UpliftConfig::from_json("{"), Err(UpliftError::UnableToRead(_))));
    }

    #[test]
    fn test_config_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("uplift.json");
        let cfg = UpliftConfig::default().set_seed(3).set_n_estimators(10);
        cfg.save(&file_path).unwrap();
        assert_eq!(UpliftConfig::load(&file_path).unwrap(), cfg);
        assert!(UpliftConfig::load(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(UpliftConfig::default().set_test_size(1.0).validate_parameters().is_err());
        assert!(UpliftConfig::default().set_test_size(0.0).validate_parameters().is_err());
        assert!(UpliftConfig::default().set_n_estimators(0).validate_parameters().is_err());
        assert!(UpliftConfig::default().set_num_threads(Some(0)).validate_parameters().is_err());
        assert!(RoiConfig::default().set_ks(vec![0.0]).validate_parameters().is_err());
        assert!(RoiConfig::default().set_ks(vec![1.5]).validate_parameters().is_err());
        assert!(RoiConfig::default().set_margin(f64::NAN).validate_parameters().is_err());
        assert!(RoiConfig::default().set_cost_email(-1.0).validate_parameters().is_ok());
    }
}
