//! Causal
//!
//! Uplift estimation with the two-model T-learner: the generic learner over any
//! probabilistic classifier, and the training procedure that produces held-out
//! uplift scores from a prepared campaign dataset.
pub mod estimator;
pub mod metalearners;
