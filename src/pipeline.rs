//! Pipeline
//!
//! The campaign analysis end to end: A/B tests across the e-mail segments, and
//! the uplift model with its Qini evaluation and ROI table for one treatment arm
//! against a control arm.
use crate::causal::estimator::{train_uplift_tlearner, HeldOut};
use crate::config::{RoiConfig, UpliftConfig};
use crate::constants::{
    DEFAULT_N_BOOT, DEFAULT_SEED, MENS_EMAIL, NON_FEATURE_COLS, NO_EMAIL, OUTCOME_COL, SEGMENT_COL, SPEND_COL,
    WOMENS_EMAIL,
};
use crate::data::{prepare_treatment, ColumnKind, Dataset, FeatureSpec};
use crate::errors::UpliftError;
use crate::metrics::uplift::{qini_auc, qini_curve, qini_random_baseline, QiniCurve};
use crate::roi::{simulate_roi, RoiTable};
use crate::stats::{ab_test_proportion, ab_test_spend, ProportionTest, SpendTest};
use crate::utils::validate_binary;
use log::info;
use serde::{Deserialize, Serialize};

/// A test result labelled with the two segments it compares.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ArmComparison<T> {
    pub treatment: String,
    pub control: String,
    pub result: T,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct AbTestReport {
    pub conversion: Vec<ArmComparison<ProportionTest>>,
    pub spend: Vec<ArmComparison<SpendTest>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UpliftReport {
    pub held_out: HeldOut,
    pub curve: QiniCurve,
    /// Random targeting Qini values at the points of `curve`.
    pub baseline: Vec<f64>,
    pub qini_auc: f64,
    pub roi: RoiTable,
}

/// Every column except targets and arm labels, typed by how the column is stored.
pub fn default_features(df: &Dataset) -> Vec<FeatureSpec> {
    df.iter()
        .filter(|(name, _)| !NON_FEATURE_COLS.contains(name))
        .map(|(name, column)| match column.kind() {
            ColumnKind::Numeric => FeatureSpec::numeric(name),
            ColumnKind::Categorical => FeatureSpec::categorical(name),
        })
        .collect()
}

// Conversions and size of a segment.
fn segment_counts(segments: &[String], conversion: &[f64], label: &str) -> (u64, u64) {
    segments
        .iter()
        .zip(conversion)
        .filter(|(s, _)| s.as_str() == label)
        .fold((0, 0), |(succ, total), (_, &c)| (succ + c as u64, total + 1))
}

fn segment_values(segments: &[String], values: &[f64], label: &str) -> Vec<f64> {
    segments
        .iter()
        .zip(values)
        .filter(|(s, _)| s.as_str() == label)
        .map(|(_, &v)| v)
        .collect()
}

/// Conversion z-tests between the e-mail segments and the control segment, and
/// between the two e-mail segments, for every pair present in the data. When a
/// `spend` column exists, each e-mail segment is also compared to the control on
/// spend with Welch's t-test and a bootstrap interval.
pub fn run_ab_tests(df: &Dataset) -> Result<AbTestReport, UpliftError> {
    let segments = df.categorical(SEGMENT_COL)?;
    let conversion = df.numeric(OUTCOME_COL)?;
    validate_binary(OUTCOME_COL, conversion)?;
    let present = |label: &str| segments.iter().any(|s| s == label);

    let mut report = AbTestReport::default();
    for (a, b) in [(MENS_EMAIL, NO_EMAIL), (WOMENS_EMAIL, NO_EMAIL), (MENS_EMAIL, WOMENS_EMAIL)] {
        if !(present(a) && present(b)) {
            continue;
        }
        let (x_s, x_n) = segment_counts(segments, conversion, a);
        let (y_s, y_n) = segment_counts(segments, conversion, b);
        let result = ab_test_proportion(x_s, x_n, y_s, y_n)?;
        info!(
            "Conversion {} vs {}: rates {:.5} vs {:.5}, z = {:.4}, p = {:.4}.",
            a, b, result.rate_x, result.rate_y, result.z_stat, result.p_value
        );
        report.conversion.push(ArmComparison {
            treatment: a.to_string(),
            control: b.to_string(),
            result,
        });
    }

    if df.has_column(SPEND_COL) {
        let spend = df.numeric(SPEND_COL)?;
        for (a, b) in [(MENS_EMAIL, NO_EMAIL), (WOMENS_EMAIL, NO_EMAIL)] {
            if !(present(a) && present(b)) {
                continue;
            }
            let x = segment_values(segments, spend, a);
            let y = segment_values(segments, spend, b);
            let result = ab_test_spend(&x, &y, DEFAULT_N_BOOT, DEFAULT_SEED)?;
            info!(
                "Spend {} vs {}: diff {:.4}, 95% CI [{:.4}, {:.4}], t = {:.4}, p = {:.4}.",
                a, b, result.mean_diff, result.ci_lower, result.ci_upper, result.t_stat, result.p_value
            );
            report.spend.push(ArmComparison {
                treatment: a.to_string(),
                control: b.to_string(),
                result,
            });
        }
    }
    Ok(report)
}

/// Train the uplift model for `treat_label` against `control_label`, then
/// evaluate it on the held-out rows and simulate targeting profit.
///
/// * `features` - Model inputs, [`default_features`] of the prepared data when `None`.
pub fn run_uplift_and_roi(
    df: &Dataset,
    treat_label: &str,
    control_label: &str,
    features: Option<&[FeatureSpec]>,
    uplift_cfg: &UpliftConfig,
    roi_cfg: &RoiConfig,
) -> Result<UpliftReport, UpliftError> {
    roi_cfg.validate_parameters()?;
    let prepared = prepare_treatment(df, treat_label, control_label)?;
    let features = match features {
        Some(f) => f.to_vec(),
        None => default_features(&prepared),
    };
    info!(
        "Uplift {} vs {} on {} rows with features [{}].",
        treat_label,
        control_label,
        prepared.rows(),
        features.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", ")
    );

    let held_out = train_uplift_tlearner(&prepared, &features, uplift_cfg)?;
    let curve = qini_curve(&held_out.y_true, &held_out.uplift_pred, &held_out.treatment)?;
    let auc = qini_auc(&curve.phi, &curve.qini, &held_out.treatment, &held_out.y_true)?;
    let baseline = qini_random_baseline(&curve.phi, &held_out.treatment, &held_out.y_true)?;
    info!("Qini AUC ({} vs {}): {:.5}", treat_label, control_label, auc);

    let roi = simulate_roi(
        &held_out.y_true,
        &held_out.treatment,
        &held_out.uplift_pred,
        &roi_cfg.ks,
        roi_cfg.margin,
        roi_cfg.cost_email,
    )?;
    if let Some(best) = roi.best() {
        info!(
            "Best targeting fraction k = {:.2}, {} e-mails, net profit {:.2}.",
            best.k, best.n_targeted, best.net_profit
        );
    }

    Ok(UpliftReport {
        held_out,
        curve,
        baseline,
        qini_auc: auc,
        roi,
    })
}
