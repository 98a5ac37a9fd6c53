//! Isolation forest anomaly detector.
//!
//! Scores a row by how quickly random axis-aligned splits isolate it from a
//! subsample of the training data. Attack traffic sits far from the benign
//! mass and isolates in short paths, which pushes its score toward 1.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

const EULER_GAMMA: f32 = 0.577_215_7;

/// Detector hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationConfig {
    pub num_trees: usize,
    /// Rows drawn per tree, capped at the training-set size
    pub sample_size: usize,
    /// Expected outlier share; sets the score threshold during fit
    pub contamination: f32,
    pub seed: u64,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            sample_size: 256,
            contamination: 0.3,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum IsolationNode {
    Internal {
        feature_idx: usize,
        split_value: f32,
        left: Box<IsolationNode>,
        right: Box<IsolationNode>,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IsolationTree {
    root: IsolationNode,
}

impl IsolationTree {
    /// Depth at which the row lands, plus the expected extra depth for
    /// unsplit rows sharing its leaf
    fn path_length(&self, row: &[f32]) -> f32 {
        let mut node = &self.root;
        let mut depth = 0_usize;
        loop {
            match node {
                IsolationNode::Internal { feature_idx, split_value, left, right } => {
                    node = if row[*feature_idx] < *split_value { left } else { right };
                    depth += 1;
                }
                IsolationNode::Leaf { size } => {
                    return depth as f32 + average_path_length(*size);
                }
            }
        }
    }
}

/// Expected path length of an unsuccessful search in a tree of `n` rows
fn average_path_length(n: usize) -> f32 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f32;
    2.0 * (n.ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
}

fn build_node(
    samples: &[&[f32]],
    n_features: usize,
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> IsolationNode {
    if depth >= max_depth || samples.len() <= 1 {
        return IsolationNode::Leaf { size: samples.len() };
    }

    let feature_idx = rng.random_range(0..n_features);
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for sample in samples {
        let v = sample[feature_idx];
        min = min.min(v);
        max = max.max(v);
    }
    if (max - min).abs() < f32::EPSILON {
        return IsolationNode::Leaf { size: samples.len() };
    }

    let split_value = rng.random_range(min..max);
    let (left, right): (Vec<&[f32]>, Vec<&[f32]>) =
        samples.iter().copied().partition(|s| s[feature_idx] < split_value);
    if left.is_empty() || right.is_empty() {
        return IsolationNode::Leaf { size: samples.len() };
    }

    IsolationNode::Internal {
        feature_idx,
        split_value,
        left: Box::new(build_node(&left, n_features, depth + 1, max_depth, rng)),
        right: Box::new(build_node(&right, n_features, depth + 1, max_depth, rng)),
    }
}

/// Unsupervised outlier detector over standardized feature rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    config: IsolationConfig,
    /// Score at the (1 - contamination) quantile of the training set
    threshold: f32,
    /// Path-length normalizer for the subsample size used at fit
    normalizer: f32,
    trained: bool,
}

impl IsolationForest {
    pub fn new(config: IsolationConfig) -> Self {
        Self {
            trees: Vec::new(),
            config,
            threshold: 0.0,
            normalizer: 0.0,
            trained: false,
        }
    }

    /// Fit on standardized rows, labels unseen.
    ///
    /// Trees grow to depth log2(sample_size) on subsamples drawn with
    /// replacement. The flag threshold is then read off the sorted training
    /// scores so that roughly `contamination` of them sit at or above it.
    pub fn fit(&mut self, rows: &[Vec<f32>]) {
        if rows.is_empty() {
            return;
        }

        let n_features = rows[0].len();
        let sample_size = self.config.sample_size.min(rows.len());
        let max_depth = (sample_size as f32).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        self.trees.clear();
        for _ in 0..self.config.num_trees {
            let sample: Vec<&[f32]> = (0..sample_size)
                .map(|_| rows[rng.random_range(0..rows.len())].as_slice())
                .collect();
            let root = build_node(&sample, n_features, 0, max_depth, &mut rng);
            self.trees.push(IsolationTree { root });
        }
        self.normalizer = average_path_length(sample_size);

        let mut scores: Vec<f32> = rows.iter().map(|r| self.score(r)).collect();
        scores.sort_by(f32::total_cmp);
        let cut = ((1.0 - self.config.contamination) * rows.len() as f32) as usize;
        self.threshold = scores[cut.min(rows.len() - 1)];
        self.trained = true;
    }

    /// Anomaly score in (0, 1); higher isolates faster
    pub fn score(&self, row: &[f32]) -> f32 {
        if self.trees.is_empty() || self.normalizer <= 0.0 {
            return 0.5;
        }
        let mean_path: f32 =
            self.trees.iter().map(|t| t.path_length(row)).sum::<f32>() / self.trees.len() as f32;
        2.0_f32.powf(-mean_path / self.normalizer)
    }

    /// Outlier verdict remapped to the classifier's convention: 1 = attack-like
    pub fn flag(&self, row: &[f32]) -> u8 {
        (self.trained && self.score(row) >= self.threshold) as u8
    }

    pub fn is_trained(&self) -> bool {
        self.trained && !self.trees.is_empty()
    }
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new(IsolationConfig::default())
    }
}
