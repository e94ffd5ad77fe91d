//! Calibration
//!
//! Maps raw classifier scores to probabilities: isotonic regression fitted with
//! the pool adjacent violators algorithm, and a cross-validated wrapper that
//! calibrates any [`ProbabilisticClassifier`](crate::classifier::ProbabilisticClassifier).
pub mod classifier;
pub mod isotonic;
