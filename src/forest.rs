//! Random Forest
//!
//! An ensemble of bootstrapped Gini classification trees. Trees are fitted in
//! parallel with rayon, but every tree owns a generator seeded up front from the
//! forest seed, so the fitted forest only depends on the seed and the data.
use crate::classifier::{validate_fit_inputs, ProbabilisticClassifier};
use crate::data::Matrix;
use crate::errors::UpliftError;
use crate::sampler::SampleMethod;
use crate::tree::{Tree, TreeParams};
use crate::utils::{install_in_pool, items_to_strings, validate_fraction_parameter, validate_length};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Number of candidate features considered at every split.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum MaxFeatures {
    /// `max(1, floor(sqrt(n_features)))`.
    Sqrt,
    /// `max(1, floor(log2(n_features)))`.
    Log2,
    /// Every feature.
    All,
    /// A fixed number of features, capped at the number available.
    Count(usize),
    /// A fraction of the features, within (0, 1].
    Fraction(f64),
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::Sqrt => n.sqrt().floor() as usize,
            MaxFeatures::Log2 => n.log2().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(c) => *c,
            MaxFeatures::Fraction(f) => (f * n).floor() as usize,
        };
        k.clamp(1, n_features.max(1))
    }
}

impl FromStr for MaxFeatures {
    type Err = UpliftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || {
            UpliftError::ParseString(
                s.to_string(),
                "MaxFeatures".to_string(),
                items_to_strings(vec!["sqrt", "log2", "all", "<integer>", "<fraction>"]),
            )
        };
        match s {
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "log2" => Ok(MaxFeatures::Log2),
            "all" => Ok(MaxFeatures::All),
            _ if s.contains('.') => s.parse::<f64>().map(MaxFeatures::Fraction).map_err(|_| err()),
            _ => s.parse::<usize>().map(MaxFeatures::Count).map_err(|_| err()),
        }
    }
}

/// Random forest hyper-parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub sample_method: SampleMethod,
    pub seed: u64,
    pub num_threads: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            n_estimators: 100,
            max_depth: None,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            sample_method: SampleMethod::Bootstrap,
            seed: 0,
            num_threads: None,
        }
    }
}

impl ForestConfig {
    pub fn validate_parameters(&self) -> Result<(), UpliftError> {
        if self.n_estimators == 0 {
            return Err(UpliftError::InvalidParameter(
                "n_estimators".to_string(),
                "at least 1".to_string(),
                "0".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(UpliftError::InvalidParameter(
                "min_samples_leaf".to_string(),
                "at least 1".to_string(),
                "0".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(UpliftError::InvalidParameter(
                "max_depth".to_string(),
                "at least 1 or None".to_string(),
                "0".to_string(),
            ));
        }
        if let MaxFeatures::Fraction(f) = self.max_features {
            validate_fraction_parameter(f, "max_features")?;
        }
        if self.num_threads == Some(0) {
            return Err(UpliftError::InvalidParameter(
                "num_threads".to_string(),
                "at least 1 or None".to_string(),
                "0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Random forest probability classifier.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RandomForestClassifier {
    pub cfg: ForestConfig,
    pub trees: Vec<Tree>,
    n_features: usize,
}

impl RandomForestClassifier {
    pub fn new(cfg: ForestConfig) -> Result<Self, UpliftError> {
        cfg.validate_parameters()?;
        Ok(RandomForestClassifier {
            cfg,
            trees: Vec::new(),
            n_features: 0,
        })
    }
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        RandomForestClassifier {
            cfg: ForestConfig::default(),
            trees: Vec::new(),
            n_features: 0,
        }
    }
}

impl ProbabilisticClassifier for RandomForestClassifier {
    fn fit(&mut self, x: &Matrix<f64>, y: &[f64]) -> Result<(), UpliftError> {
        validate_fit_inputs(x, y)?;

        let params = TreeParams {
            max_depth: self.cfg.max_depth,
            min_samples_leaf: self.cfg.min_samples_leaf,
            max_features: self.cfg.max_features.resolve(x.cols),
        };
        let mut rng = StdRng::seed_from_u64(self.cfg.seed);
        let seeds: Vec<u64> = (0..self.cfg.n_estimators).map(|_| rng.gen()).collect();
        let sample_method = self.cfg.sample_method;

        let trees = install_in_pool(self.cfg.num_threads, || {
            seeds
                .par_iter()
                .map(|&s| {
                    let mut tree_rng = StdRng::seed_from_u64(s);
                    let index = sample_method.sampler().sample(&mut tree_rng, &x.index);
                    let mut tree = Tree::new();
                    tree.fit(x, y, index, &params, &mut tree_rng);
                    tree
                })
                .collect::<Vec<Tree>>()
        })?;

        debug!(
            "Fitted {} trees on {} rows and {} features, average depth {:.2}.",
            trees.len(),
            x.rows,
            x.cols,
            trees.iter().map(|t| t.depth as f64).sum::<f64>() / trees.len() as f64
        );
        self.trees = trees;
        self.n_features = x.cols;
        Ok(())
    }

    fn predict_proba(&self, x: &Matrix<f64>) -> Result<Vec<f64>, UpliftError> {
        if !self.is_fitted() {
            return Err(UpliftError::NotFitted);
        }
        validate_length("features", self.n_features, x.cols)?;
        let n_trees = self.trees.len() as f64;
        install_in_pool(self.cfg.num_threads, || {
            (0..x.rows)
                .into_par_iter()
                .map(|i| self.trees.iter().map(|t| t.predict_row(x, i)).sum::<f64>() / n_trees)
                .collect()
        })
    }

    fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}
