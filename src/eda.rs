//! EDA
//!
//! Balance check of a randomized campaign: per-segment mean and standard
//! deviation of pre-treatment columns.
use crate::data::Dataset;
use crate::errors::UpliftError;
use crate::utils::{mean, sample_variance};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BalanceRow {
    pub segment: String,
    pub variable: String,
    pub mean: f64,
    /// Sample standard deviation, NaN with fewer than two values.
    pub std: f64,
}

impl Display for BalanceRow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:<16} {:<12} {:>12.4} {:>12.4}", self.segment, self.variable, self.mean, self.std)
    }
}

/// Mean and standard deviation of every baseline column within every segment.
///
/// Rows are ordered by segment name, then by the order of `baseline_cols`.
/// Missing values are ignored.
pub fn check_randomization(df: &Dataset, segment_col: &str, baseline_cols: &[&str]) -> Result<Vec<BalanceRow>, UpliftError> {
    let segments = df.categorical(segment_col)?;
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, s) in segments.iter().enumerate() {
        groups.entry(s.as_str()).or_default().push(i);
    }

    let columns = baseline_cols
        .iter()
        .map(|&c| df.numeric(c).map(|values| (c, values)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = Vec::with_capacity(groups.len() * columns.len());
    for (segment, members) in &groups {
        for (name, values) in &columns {
            let present: Vec<f64> = members.iter().map(|&i| values[i]).filter(|v| !v.is_nan()).collect();
            let avg = if present.is_empty() { f64::NAN } else { mean(&present) };
            rows.push(BalanceRow {
                segment: segment.to_string(),
                variable: name.to_string(),
                mean: avg,
                std: sample_variance(&present).sqrt(),
            });
        }
    }
    Ok(rows)
}
