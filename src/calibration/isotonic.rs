use serde::{Deserialize, Serialize};

/// Monotone, piecewise linear map from raw scores to probabilities,
/// fitted with the pool adjacent violators algorithm.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct IsotonicCalibrator {
    /// Thresholds (input scores), strictly increasing.
    pub thresholds: Vec<f64>,
    /// Calibrated values (output probabilities), non-decreasing.
    pub values: Vec<f64>,
}

// A pooled block: (sum_w * y, sum_w, sum_w * x, lowest x, highest x)
type Block = (f64, f64, f64, f64, f64);

impl IsotonicCalibrator {
    pub fn new(y_pred: &[f64], y_true: &[f64]) -> Self {
        if y_pred.is_empty() {
            return Self::default();
        }

        // Pair up (prediction, truth) and sort by prediction
        let mut data: Vec<(f64, f64)> = y_pred.iter().zip(y_true.iter()).map(|(&p, &t)| (p, t)).collect();
        data.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Equal predictions must share one output, so they start as a single block.
        // Ties are matched on the exact score.
        let mut points: Vec<Block> = Vec::with_capacity(data.len());
        for (pred, target) in data {
            match points.last_mut() {
                Some((sum_y, count, sum_x, _, hi)) if *hi == pred => {
                    *sum_y += target;
                    *count += 1.0;
                    *sum_x += pred;
                }
                _ => points.push((target, 1.0, pred, pred, pred)),
            }
        }

        // PAVA: merge down while the previous block is above the current one.
        let mut blocks: Vec<Block> = Vec::with_capacity(points.len());
        for (mut sum_y, mut count, mut sum_x, mut lo, hi) in points {
            while let Some(&(prev_sum_y, prev_count, prev_sum_x, prev_lo, _)) = blocks.last() {
                if prev_sum_y / prev_count > sum_y / count {
                    sum_y += prev_sum_y;
                    count += prev_count;
                    sum_x += prev_sum_x;
                    lo = prev_lo;
                    blocks.pop();
                } else {
                    break;
                }
            }
            blocks.push((sum_y, count, sum_x, lo, hi));
        }

        // Block score ranges are disjoint, so clamped means stay strictly increasing.
        let mut thresholds = Vec::with_capacity(blocks.len());
        let mut values = Vec::with_capacity(blocks.len());
        for (sum_y, count, sum_x, lo, hi) in blocks {
            thresholds.push((sum_x / count).clamp(lo, hi));
            values.push(sum_y / count);
        }

        IsotonicCalibrator { thresholds, values }
    }

    pub fn is_identity(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Map raw scores to calibrated probabilities. Scores outside the fitted
    /// range are clipped to the first or last value.
    pub fn transform(&self, y_pred: &[f64]) -> Vec<f64> {
        let (Some(&first_t), Some(&last_t)) = (self.thresholds.first(), self.thresholds.last()) else {
            return y_pred.to_vec();
        };
        let first_v = self.values[0];
        let last_v = self.values[self.values.len() - 1];

        y_pred
            .iter()
            .map(|&p| {
                if p <= first_t {
                    first_v
                } else if p >= last_t {
                    last_v
                } else {
                    // Linear interpolation within the bracketing interval.
                    let idx = match self.thresholds.binary_search_by(|t| t.total_cmp(&p)) {
                        Ok(i) => return self.values[i],
                        Err(i) => i - 1,
                    };
                    let x0 = self.thresholds[idx];
                    let x1 = self.thresholds[idx + 1];
                    let y0 = self.values[idx];
                    let y1 = self.values[idx + 1];
                    y0 + (y1 - y0) * (p - x0) / (x1 - x0)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isotonic_monotone() {
        let y_pred = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let y_true = vec![0., 1., 0., 0., 1., 1.];
        let cal = IsotonicCalibrator::new(&y_pred, &y_true);
        assert!(cal.values.windows(2).all(|w| w[0] <= w[1]));
        assert!(cal.thresholds.windows(2).all(|w| w[0] < w[1]));
        // 0.2, 0.3 and 0.4 pool into one block with mean 1/3.
        assert_eq!(cal.values, vec![0.0, 1.0 / 3.0, 1.0, 1.0]);
        assert_eq!(cal.transform(&[0.0, 0.9]), vec![0.0, 1.0]);
        assert!((cal.transform(&[0.3])[0] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_isotonic_ties_share_value() {
        let y_pred = vec![0.5, 0.5, 0.5, 0.9];
        let y_true = vec![0., 1., 1., 1.];
        let cal = IsotonicCalibrator::new(&y_pred, &y_true);
        assert_eq!(cal.thresholds, vec![0.5, 0.9]);
        assert_eq!(cal.values, vec![2.0 / 3.0, 1.0]);
        let mid = cal.transform(&[0.7])[0];
        assert!((mid - (2.0 / 3.0 + 1.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_isotonic_many_ties_form_one_block() {
        // Summing 0.1 three times is not 0.3, the tie must still pool.
        let y_pred = vec![0.1, 0.1, 0.1, 0.1, 0.3];
        let y_true = vec![0., 0., 1., 1., 1.];
        let cal = IsotonicCalibrator::new(&y_pred, &y_true);
        assert_eq!(cal.thresholds, vec![0.1, 0.3]);
        assert_eq!(cal.values, vec![0.5, 1.0]);
        assert!(cal.thresholds.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(cal.transform(&[0.1, 0.1]), vec![0.5, 0.5]);

        let tied = vec![0.7; 9];
        let y_true = vec![1., 0., 1., 0., 1., 0., 1., 0., 1.];
        let cal = IsotonicCalibrator::new(&tied, &y_true);
        assert_eq!(cal.thresholds, vec![0.7]);
        assert!((cal.values[0] - 5.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_isotonic_empty_is_identity() {
        let cal = IsotonicCalibrator::new(&[], &[]);
        assert!(cal.is_identity());
        assert_eq!(cal.transform(&[0.2, 0.7]), vec![0.2, 0.7]);
    }

    #[test]
    fn test_isotonic_single_class() {
        let cal = IsotonicCalibrator::new(&[0.1, 0.4, 0.8], &[0., 0., 0.]);
        assert_eq!(cal.transform(&[0.0, 0.5, 1.0]), vec![0.0, 0.0, 0.0]);
    }
}
