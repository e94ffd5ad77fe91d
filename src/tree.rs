//! Tree
//!
//! A binary classification tree grown with the Gini criterion. Leaves store the
//! share of positive labels among the training rows that reached them, so a tree
//! scores rows with a probability.
use crate::data::Matrix;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Minimum impurity decrease for a split to be accepted.
const MIN_SPLIT_GAIN: f64 = 1e-12;

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Node {
    pub num: usize,
    pub depth: usize,
    /// Share of positive labels among the rows of the node.
    pub value: f64,
    pub n_samples: usize,
    pub impurity: f64,
    pub split_feature: usize,
    pub split_value: f64,
    pub split_gain: f64,
    pub left_child: usize,
    pub right_child: usize,
    pub is_leaf: bool,
}

impl Node {
    fn leaf(num: usize, depth: usize, n_pos: f64, n_samples: usize) -> Self {
        let value = n_pos / n_samples as f64;
        Node {
            num,
            depth,
            value,
            n_samples,
            impurity: gini(value),
            split_feature: 0,
            split_value: f64::NAN,
            split_gain: 0.0,
            left_child: 0,
            right_child: 0,
            is_leaf: true,
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_leaf {
            write!(f, "{}:leaf={},samples={}", self.num, self.value, self.n_samples)
        } else {
            write!(
                f,
                "{}:[{} <= {}] yes={},no={},gain={},samples={}",
                self.num,
                self.split_feature,
                self.split_value,
                self.left_child,
                self.right_child,
                self.split_gain,
                self.n_samples
            )
        }
    }
}

/// Growth limits applied while fitting a tree.
#[derive(Clone, Copy, Debug)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    /// Number of candidate features drawn at every split.
    pub max_features: usize,
}

#[derive(Clone, Copy)]
struct BestSplit {
    feature: usize,
    value: f64,
    gain: f64,
}

// A node still waiting to be split, covering `index[start..stop]`.
struct SplittableNode {
    num: usize,
    depth: usize,
    start: usize,
    stop: usize,
}

#[inline]
fn gini(p: f64) -> f64 {
    2.0 * p * (1.0 - p)
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Tree {
    pub nodes: Vec<Node>,
    pub depth: usize,
    pub n_leaves: usize,
}

impl Tree {
    pub fn new() -> Self {
        Tree::default()
    }

    /// Grow the tree on the rows listed in `index`, which may hold duplicates.
    pub fn fit(&mut self, data: &Matrix<f64>, y: &[f64], mut index: Vec<usize>, params: &TreeParams, rng: &mut StdRng) {
        self.nodes.clear();
        self.depth = 0;
        self.n_leaves = 0;
        if index.is_empty() {
            return;
        }

        let n_pos: f64 = index.iter().map(|&i| y[i]).sum();
        self.nodes.push(Node::leaf(0, 0, n_pos, index.len()));
        let mut growable = vec![SplittableNode {
            num: 0,
            depth: 0,
            start: 0,
            stop: index.len(),
        }];

        while let Some(node) = growable.pop() {
            self.depth = self.depth.max(node.depth);
            let n_samples = node.stop - node.start;
            let can_split = params.max_depth.map_or(true, |d| node.depth < d)
                && n_samples >= 2 * params.min_samples_leaf.max(1)
                && self.nodes[node.num].impurity > 0.0;
            let best = if can_split {
                self.find_best_split(data, y, &index[node.start..node.stop], params, rng)
            } else {
                None
            };

            let Some(best) = best else {
                self.n_leaves += 1;
                continue;
            };

            // Partition the rows of the node in place, left rows first.
            let col = data.get_col(best.feature);
            let (left, right): (Vec<usize>, Vec<usize>) =
                index[node.start..node.stop].iter().partition(|&&i| col[i] <= best.value);
            let mid = node.start + left.len();
            index[node.start..mid].copy_from_slice(&left);
            index[mid..node.stop].copy_from_slice(&right);

            let left_num = self.nodes.len();
            let right_num = left_num + 1;
            let left_pos: f64 = left.iter().map(|&i| y[i]).sum();
            let right_pos: f64 = right.iter().map(|&i| y[i]).sum();
            self.nodes.push(Node::leaf(left_num, node.depth + 1, left_pos, left.len()));
            self.nodes.push(Node::leaf(right_num, node.depth + 1, right_pos, right.len()));

            let parent = &mut self.nodes[node.num];
            parent.is_leaf = false;
            parent.split_feature = best.feature;
            parent.split_value = best.value;
            parent.split_gain = best.gain;
            parent.left_child = left_num;
            parent.right_child = right_num;

            growable.push(SplittableNode {
                num: right_num,
                depth: node.depth + 1,
                start: mid,
                stop: node.stop,
            });
            growable.push(SplittableNode {
                num: left_num,
                depth: node.depth + 1,
                start: node.start,
                stop: mid,
            });
        }
    }

    fn find_best_split(
        &self,
        data: &Matrix<f64>,
        y: &[f64],
        rows: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let n = rows.len();
        let n_f = n as f64;
        let min_leaf = params.min_samples_leaf.max(1);
        let total_pos: f64 = rows.iter().map(|&i| y[i]).sum();
        let parent_impurity = gini(total_pos / n_f);

        let n_candidates = params.max_features.clamp(1, data.cols);
        let features = rand::seq::index::sample(rng, data.cols, n_candidates).into_vec();

        let mut best: Option<BestSplit> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);
        for feature in features {
            let col = data.get_col(feature);
            pairs.clear();
            pairs.extend(rows.iter().map(|&i| (col[i], y[i])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_pos = 0.0;
            for i in 0..(n - 1) {
                left_pos += pairs[i].1;
                let (current, next) = (pairs[i].0, pairs[i + 1].0);
                // Missing values always fall to the right.
                if next.is_nan() {
                    break;
                }
                if current == next {
                    continue;
                }
                let left_n = i + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }
                let left_impurity = gini(left_pos / left_n as f64);
                let right_impurity = gini((total_pos - left_pos) / right_n as f64);
                let weighted = (left_n as f64 * left_impurity + right_n as f64 * right_impurity) / n_f;
                let gain = parent_impurity - weighted;
                if gain > best.map_or(MIN_SPLIT_GAIN, |b| b.gain) {
                    let mut value = current + (next - current) / 2.0;
                    if value >= next {
                        value = current;
                    }
                    best = Some(BestSplit { feature, value, gain });
                }
            }
        }
        best
    }

    /// Probability of the positive class for a single row.
    pub fn predict_row(&self, data: &Matrix<f64>, row: usize) -> f64 {
        let mut node = &self.nodes[0];
        while !node.is_leaf {
            let v = *data.get(row, node.split_feature);
            node = if v <= node.split_value {
                &self.nodes[node.left_child]
            } else {
                &self.nodes[node.right_child]
            };
        }
        node.value
    }

    pub fn predict(&self, data: &Matrix<f64>) -> Vec<f64> {
        (0..data.rows).map(|i| self.predict_row(data, i)).collect()
    }
}

impl Display for Tree {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut print_buffer: Vec<usize> = vec![0];
        let mut r = String::new();
        while let Some(idx) = print_buffer.pop() {
            let Some(node) = self.nodes.get(idx) else {
                continue;
            };
            r += format!("{}{}\n", "      ".repeat(node.depth).as_str(), node).as_str();
            if !node.is_leaf {
                print_buffer.push(node.right_child);
                print_buffer.push(node.left_child);
            }
        }
        write!(f, "{}", r)
    }
}
