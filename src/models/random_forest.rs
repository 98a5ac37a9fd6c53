//! Random forest classifier for the benign/attack decision.
//!
//! Bagged binary decision trees with per-node feature subsampling. Trees are
//! grown on bootstrap resamples and vote independently; the forest reports
//! the attack share of the vote as its probability.

use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub num_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_depth: 20,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

/// One node of a fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    Internal {
        feature_idx: usize,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        /// Share of attack labels among the training rows that reached here
        attack_fraction: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DecisionTree {
    root: TreeNode,
}

impl DecisionTree {
    fn build(
        rows: &[Vec<f32>],
        labels: &[u8],
        indices: Vec<usize>,
        n_features: usize,
        feature_subset: usize,
        config: &ForestConfig,
        rng: &mut StdRng,
    ) -> Self {
        let root = build_node(rows, labels, indices, n_features, feature_subset, config, 0, rng);
        Self { root }
    }

    /// Walk the tree; rows at or below a threshold go left
    fn predict(&self, row: &[f32]) -> u8 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Internal { feature_idx, threshold, left, right } => {
                    node = if row[*feature_idx] <= *threshold { left } else { right };
                }
                TreeNode::Leaf { attack_fraction } => {
                    return (*attack_fraction >= 0.5) as u8;
                }
            }
        }
    }
}

fn attack_count(labels: &[u8], indices: &[usize]) -> usize {
    indices.iter().filter(|&&i| labels[i] == 1).count()
}

/// Binary Gini impurity
fn gini(p: f32) -> f32 {
    2.0 * p * (1.0 - p)
}

#[allow(clippy::too_many_arguments)]
fn build_node(
    rows: &[Vec<f32>],
    labels: &[u8],
    indices: Vec<usize>,
    n_features: usize,
    feature_subset: usize,
    config: &ForestConfig,
    depth: usize,
    rng: &mut StdRng,
) -> TreeNode {
    let n = indices.len();
    let attacks = attack_count(labels, &indices);
    let attack_fraction = attacks as f32 / n as f32;

    let pure = attacks == 0 || attacks == n;
    if depth >= config.max_depth || n < config.min_samples_split || pure {
        return TreeNode::Leaf { attack_fraction };
    }

    // Fresh feature subset at every node, not per tree
    let mut candidates: Vec<usize> = (0..n_features).collect();
    candidates.shuffle(rng);
    candidates.truncate(feature_subset);

    let parent_gini = gini(attack_fraction);
    let mut best: Option<(usize, f32)> = None;
    let mut best_gain = 0.0_f32;

    for &feature_idx in &candidates {
        let mut order: Vec<(f32, u8)> = indices
            .iter()
            .map(|&i| (rows[i][feature_idx], labels[i]))
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_attack = 0_usize;
        for i in 1..n {
            left_attack += (order[i - 1].1 == 1) as usize;
            // Equal values cannot be separated by a threshold between them
            if order[i].0 == order[i - 1].0 {
                continue;
            }

            let left_n = i;
            let right_n = n - i;
            let right_attack = attacks - left_attack;
            let weighted = (left_n as f32 * gini(left_attack as f32 / left_n as f32)
                + right_n as f32 * gini(right_attack as f32 / right_n as f32))
                / n as f32;
            let gain = parent_gini - weighted;
            if gain > best_gain {
                best_gain = gain;
                best = Some((feature_idx, (order[i - 1].0 + order[i].0) / 2.0));
            }
        }
    }

    let Some((feature_idx, threshold)) = best else {
        return TreeNode::Leaf { attack_fraction };
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
        indices.into_iter().partition(|&i| rows[i][feature_idx] <= threshold);

    TreeNode::Internal {
        feature_idx,
        threshold,
        left: Box::new(build_node(
            rows, labels, left_idx, n_features, feature_subset, config, depth + 1, rng,
        )),
        right: Box::new(build_node(
            rows, labels, right_idx, n_features, feature_subset, config, depth + 1, rng,
        )),
    }
}

/// Bagged decision-tree classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    config: ForestConfig,
    trained: bool,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            trees: Vec::new(),
            config,
            trained: false,
        }
    }

    /// Fit on standardized rows with binary labels.
    ///
    /// Each tree trains on a bootstrap resample of the full training set and
    /// considers sqrt(n_features) candidate features per split.
    pub fn fit(&mut self, rows: &[Vec<f32>], labels: &[u8]) {
        if rows.is_empty() || rows.len() != labels.len() {
            return;
        }

        let n_features = rows[0].len();
        let feature_subset = (n_features as f32).sqrt().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        self.trees.clear();
        for _ in 0..self.config.num_trees {
            let indices: Vec<usize> =
                (0..rows.len()).map(|_| rng.random_range(0..rows.len())).collect();
            self.trees.push(DecisionTree::build(
                rows,
                labels,
                indices,
                n_features,
                feature_subset,
                &self.config,
                &mut rng,
            ));
        }
        self.trained = true;
    }

    /// (benign, attack) probability as the share of tree votes
    pub fn predict_proba(&self, row: &[f32]) -> (f32, f32) {
        if self.trees.is_empty() {
            return (0.5, 0.5);
        }
        let votes = self.trees.iter().filter(|t| t.predict(row) == 1).count();
        let attack = votes as f32 / self.trees.len() as f32;
        (1.0 - attack, attack)
    }

    /// Majority vote; an exact tie counts as attack
    pub fn predict(&self, row: &[f32]) -> u8 {
        (self.predict_proba(row).1 >= 0.5) as u8
    }

    pub fn is_trained(&self) -> bool {
        self.trained && !self.trees.is_empty()
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ForestConfig {
        ForestConfig {
            num_trees: 15,
            max_depth: 6,
            ..ForestConfig::default()
        }
    }

    fn make_blobs() -> (Vec<Vec<f32>>, Vec<u8>) {
        let mut rng = StdRng::seed_from_u64(1);
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..60 {
            rows.push(vec![rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)]);
            labels.push(0);
        }
        for _ in 0..60 {
            rows.push(vec![rng.random_range(9.0..11.0), rng.random_range(9.0..11.0)]);
            labels.push(1);
        }
        (rows, labels)
    }

    #[test]
    fn test_separates_blobs() {
        let (rows, labels) = make_blobs();
        let mut forest = RandomForest::new(small_config());
        forest.fit(&rows, &labels);

        assert!(forest.is_trained());
        assert_eq!(forest.predict(&[0.0, 0.0]), 0);
        assert_eq!(forest.predict(&[10.0, 10.0]), 1);
    }

    #[test]
    fn test_proba_is_vote_share() {
        let (rows, labels) = make_blobs();
        let mut forest = RandomForest::new(small_config());
        forest.fit(&rows, &labels);

        let (benign, attack) = forest.predict_proba(&[10.0, 10.0]);
        assert!((benign + attack - 1.0).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&attack));
        assert!(attack > 0.9);
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let (rows, labels) = make_blobs();
        let mut a = RandomForest::new(small_config());
        let mut b = RandomForest::new(small_config());
        a.fit(&rows, &labels);
        b.fit(&rows, &labels);

        assert_eq!(a, b);
    }

    #[test]
    fn test_untrained_forest_is_even_split() {
        let forest = RandomForest::default();
        assert!(!forest.is_trained());
        assert_eq!(forest.predict_proba(&[1.0, 2.0]), (0.5, 0.5));
        assert_eq!(forest.predict(&[1.0, 2.0]), 1);
    }

    #[test]
    fn test_empty_fit_leaves_untrained() {
        let mut forest = RandomForest::new(small_config());
        forest.fit(&[], &[]);
        assert!(!forest.is_trained());
    }
}
