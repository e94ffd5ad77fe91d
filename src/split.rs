//! Split
//!
//! Stratified partitioning of row indices: the train/test split used by the
//! uplift estimator and the k-fold split used by probability calibration.
//! Every function takes the random generator explicitly.
use crate::errors::UpliftError;
use crate::utils::validate_float_parameter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

fn group_by_stratum(strata: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &s) in strata.iter().enumerate() {
        groups.entry(s).or_default().push(i);
    }
    groups
}

/// Split row indices into `(train, test)` so that every stratum is represented
/// proportionally in both partitions.
///
/// The test partition holds `ceil(test_size * n)` rows. Each stratum receives the
/// floor of its proportional share, and the remaining test slots go to the strata
/// with the largest fractional remainders. Both returned index lists are sorted.
///
/// * `strata` - Stratum key for every row.
/// * `test_size` - Fraction of rows in the test partition, within (0, 1).
/// * `rng` - Generator used to pick the rows of each stratum.
pub fn stratified_train_test_split(
    strata: &[usize],
    test_size: f64,
    rng: &mut StdRng,
) -> Result<(Vec<usize>, Vec<usize>), UpliftError> {
    validate_float_parameter(test_size, 0.0, 1.0, "test_size")?;
    let n = strata.len();
    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(UpliftError::InvalidParameter(
            "test_size".to_string(),
            format!("a fraction leaving rows in both partitions of {} rows", n),
            test_size.to_string(),
        ));
    }

    let groups = group_by_stratum(strata);

    // Proportional allocation, largest remainder first.
    let mut quotas: Vec<usize> = Vec::with_capacity(groups.len());
    let mut remainders: Vec<(f64, usize)> = Vec::with_capacity(groups.len());
    for (g, rows) in groups.values().enumerate() {
        let exact = test_size * rows.len() as f64;
        let base = exact.floor() as usize;
        quotas.push(base);
        remainders.push((exact - base as f64, g));
    }
    let mut left = n_test.saturating_sub(quotas.iter().sum::<usize>());
    remainders.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, g) in remainders.iter().cycle() {
        if left == 0 {
            break;
        }
        let size = groups.values().nth(g).map_or(0, |r| r.len());
        if quotas[g] < size {
            quotas[g] += 1;
            left -= 1;
        }
    }

    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (rows, &quota) in groups.values().zip(quotas.iter()) {
        let mut rows = rows.clone();
        rows.shuffle(rng);
        test.extend_from_slice(&rows[..quota]);
        train.extend_from_slice(&rows[quota..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Split row indices into `k` folds, keeping the share of positive labels
/// close to equal across folds. Returns one `(train, test)` pair per fold;
/// folds can be empty when there are fewer rows than folds.
pub fn stratified_kfold(y: &[f64], k: usize, rng: &mut StdRng) -> Result<Vec<(Vec<usize>, Vec<usize>)>, UpliftError> {
    if k < 2 {
        return Err(UpliftError::InvalidParameter(
            "k".to_string(),
            "at least 2 folds".to_string(),
            k.to_string(),
        ));
    }
    let strata: Vec<usize> = y.iter().map(|&v| usize::from(v > 0.5)).collect();
    let groups = group_by_stratum(&strata);

    let mut fold_of = vec![0; y.len()];
    let mut position = 0;
    for rows in groups.values() {
        let mut rows = rows.clone();
        rows.shuffle(rng);
        for i in rows {
            fold_of[i] = position % k;
            position += 1;
        }
    }

    Ok((0..k)
        .map(|f| {
            let (test, train): (Vec<usize>, Vec<usize>) = (0..y.len()).partition(|&i| fold_of[i] == f);
            (train, test)
        })
        .collect())
}
