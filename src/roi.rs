//! ROI
//!
//! Profit of mailing only the top `k` fraction of customers ranked by predicted
//! uplift, for a list of fractions.
use crate::errors::UpliftError;
use crate::metrics::uplift::uplift_at_k;
use crate::utils::validate_finite_parameter;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Profit of targeting one fraction of the population.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RoiRow {
    pub k: f64,
    pub uplift_at_k: f64,
    pub n_targeted: usize,
    pub incremental_conversions: f64,
    pub revenue_gain: f64,
    pub email_cost: f64,
    pub net_profit: f64,
}

/// One row per requested fraction, in the order they were requested.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct RoiTable {
    pub rows: Vec<RoiRow>,
}

impl RoiTable {
    /// Row with the highest net profit, the first one on ties.
    pub fn best(&self) -> Option<&RoiRow> {
        self.rows
            .iter()
            .fold(None, |best: Option<&RoiRow>, row| match best {
                Some(b) if b.net_profit >= row.net_profit => Some(b),
                _ => Some(row),
            })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RoiRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_json(&self) -> Result<String, UpliftError> {
        serde_json::to_string(&self.rows).map_err(|e| UpliftError::UnableToWrite(e.to_string()))
    }
}

impl Display for RoiTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{:>6} {:>12} {:>10} {:>12} {:>12} {:>10} {:>12}",
            "k", "uplift@k", "targeted", "incremental", "revenue", "cost", "net_profit"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:>6.2} {:>12.5} {:>10} {:>12.2} {:>12.2} {:>10.2} {:>12.2}",
                row.k,
                row.uplift_at_k,
                row.n_targeted,
                row.incremental_conversions,
                row.revenue_gain,
                row.email_cost,
                row.net_profit
            )?;
        }
        Ok(())
    }
}

/// Simulate the profit of targeting the top `k` fraction for every `k` in `ks`.
///
/// * `margin` - Revenue of one incremental conversion.
/// * `cost_email` - Cost of one e-mail.
pub fn simulate_roi(
    y_true: &[f64],
    treatment: &[f64],
    uplift_scores: &[f64],
    ks: &[f64],
    margin: f64,
    cost_email: f64,
) -> Result<RoiTable, UpliftError> {
    validate_finite_parameter(margin, "margin")?;
    validate_finite_parameter(cost_email, "cost_email")?;
    let n = y_true.len() as f64;

    let rows = ks
        .iter()
        .map(|&k| {
            let uplift = uplift_at_k(y_true, treatment, uplift_scores, k)?;
            let n_targeted = (n * k).floor() as usize;
            let incremental_conversions = uplift * n_targeted as f64;
            let revenue_gain = incremental_conversions * margin;
            let email_cost = n_targeted as f64 * cost_email;
            Ok(RoiRow {
                k,
                uplift_at_k: uplift,
                n_targeted,
                incremental_conversions,
                revenue_gain,
                email_cost,
                net_profit: revenue_gain - email_cost,
            })
        })
        .collect::<Result<Vec<_>, UpliftError>>()?;
    Ok(RoiTable { rows })
}
