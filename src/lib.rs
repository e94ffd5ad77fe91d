// Modules
pub mod calibration;
pub mod causal;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod data;
pub mod eda;
pub mod encoder;
pub mod errors;
pub mod forest;
pub mod metrics;
pub mod pipeline;
pub mod roi;
pub mod sampler;
pub mod split;
pub mod stats;
pub mod tree;
pub mod utils;

// Individual classes, and functions
pub use calibration::classifier::CalibratedClassifier;
pub use causal::estimator::{train_uplift_tlearner, HeldOut};
pub use causal::metalearners::TLearner;
pub use classifier::ProbabilisticClassifier;
pub use config::{ConfigIO, RoiConfig, UpliftConfig};
pub use data::{prepare_treatment, Column, ColumnKind, Dataset, FeatureSpec, Matrix};
pub use encoder::FeatureEncoder;
pub use errors::UpliftError;
pub use forest::{ForestConfig, MaxFeatures, RandomForestClassifier};
pub use metrics::uplift::{qini_auc, qini_curve, qini_random_baseline, uplift_at_k, QiniCurve};
pub use pipeline::{default_features, run_ab_tests, run_uplift_and_roi, AbTestReport, UpliftReport};
pub use roi::{simulate_roi, RoiRow, RoiTable};
pub use split::{stratified_kfold, stratified_train_test_split};
