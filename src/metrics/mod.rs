//! Metrics
//!
//! Ranking metrics for uplift scores: the Qini curve and coefficient, the random
//! targeting baseline, and the observed uplift among the top scored records.
pub mod uplift;

pub use uplift::{qini_auc, qini_curve, qini_random_baseline, uplift_at_k, QiniCurve};
