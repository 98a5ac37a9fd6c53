//! Training pipeline: corpus validation, stratified split, scaler fit,
//! model fit, and held-out evaluation.

use chrono::{DateTime, Utc};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::corpus::LabeledSample;
use crate::error::{DetectError, Result};
use crate::features::{FEATURE_NAMES, NUM_FEATURES};
use crate::models::{or_ensemble, ForestConfig, IsolationConfig, IsolationForest, RandomForest};
use crate::scaler::FeatureScaler;

/// Pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Corpus size used by the train command
    pub samples: usize,
    /// Share of each label group held out for evaluation
    pub eval_fraction: f32,
    /// Seed for the split shuffle
    pub seed: u64,
    pub forest: ForestConfig,
    pub isolation: IsolationConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            samples: 50_000,
            eval_fraction: 0.3,
            seed: 42,
            forest: ForestConfig::default(),
            isolation: IsolationConfig::default(),
        }
    }
}

/// Everything inference needs, produced by one training run
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub forest: RandomForest,
    pub isolation: IsolationForest,
    pub scaler: FeatureScaler,
    /// Feature schema the models were fitted against
    pub feature_names: Vec<String>,
}

/// Provenance record written next to the artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub trained_at: DateTime<Utc>,
    pub n_samples: usize,
    pub n_features: usize,
    pub forest_accuracy: f32,
    pub isolation_accuracy: f32,
    pub ensemble_accuracy: f32,
    pub feature_names: Vec<String>,
}

pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Stratified train/eval split.
    ///
    /// Each binary label group is shuffled separately and contributes
    /// `round(len * eval_fraction)` samples to the eval side, so label
    /// shares match across the two partitions.
    pub fn split(
        &self,
        corpus: &[LabeledSample],
    ) -> Result<(Vec<LabeledSample>, Vec<LabeledSample>)> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut train = Vec::new();
        let mut eval = Vec::new();

        for label in [0_u8, 1_u8] {
            let mut group: Vec<LabeledSample> =
                corpus.iter().filter(|s| s.label() == label).cloned().collect();
            if group.is_empty() {
                return Err(DetectError::SingleClassPartition(format!(
                    "corpus has no samples with label {label}"
                )));
            }

            group.shuffle(&mut rng);
            let eval_len =
                (group.len() as f64 * self.config.eval_fraction as f64).round() as usize;
            if eval_len == 0 || eval_len == group.len() {
                return Err(DetectError::SingleClassPartition(format!(
                    "label {label} group of {} cannot be split with eval fraction {}",
                    group.len(),
                    self.config.eval_fraction
                )));
            }

            let train_len = group.len() - eval_len;
            eval.extend(group.split_off(train_len));
            train.append(&mut group);
        }

        Ok((train, eval))
    }

    /// Run the full pipeline on a labeled corpus.
    ///
    /// The scaler is fitted on the training partition only; eval rows pass
    /// through the already-fitted scaler before scoring.
    pub fn run(&self, corpus: &[LabeledSample]) -> Result<(ModelArtifacts, TrainingMetadata)> {
        if corpus.is_empty() {
            return Err(DetectError::EmptyCorpus);
        }
        check_finite(corpus)?;

        let (train, eval) = self.split(corpus)?;
        info!("training split: {} train / {} eval samples", train.len(), eval.len());

        let mut scaler = FeatureScaler::new();
        let train_features: Vec<_> = train.iter().map(|s| s.features.clone()).collect();
        scaler.fit(&train_features)?;

        let train_rows = transform_all(&scaler, &train)?;
        let train_labels: Vec<u8> = train.iter().map(|s| s.label()).collect();

        let mut forest = RandomForest::new(self.config.forest.clone());
        forest.fit(&train_rows, &train_labels);

        let mut isolation = IsolationForest::new(self.config.isolation.clone());
        isolation.fit(&train_rows);

        let eval_rows = transform_all(&scaler, &eval)?;
        let eval_labels: Vec<u8> = eval.iter().map(|s| s.label()).collect();
        let (forest_accuracy, isolation_accuracy, ensemble_accuracy) =
            evaluate(&forest, &isolation, &eval_rows, &eval_labels);
        info!(
            "eval accuracy: forest {:.3}, isolation {:.3}, ensemble {:.3}",
            forest_accuracy, isolation_accuracy, ensemble_accuracy
        );

        let feature_names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        let artifacts = ModelArtifacts {
            forest,
            isolation,
            scaler,
            feature_names: feature_names.clone(),
        };
        let metadata = TrainingMetadata {
            trained_at: Utc::now(),
            n_samples: corpus.len(),
            n_features: NUM_FEATURES,
            forest_accuracy,
            isolation_accuracy,
            ensemble_accuracy,
            feature_names,
        };
        Ok((artifacts, metadata))
    }
}

fn check_finite(corpus: &[LabeledSample]) -> Result<()> {
    for (index, sample) in corpus.iter().enumerate() {
        if let Some(feature) = sample.features.non_finite_feature() {
            return Err(DetectError::NonFiniteFeature { feature, index });
        }
    }
    Ok(())
}

fn transform_all(scaler: &FeatureScaler, samples: &[LabeledSample]) -> Result<Vec<Vec<f32>>> {
    samples.iter().map(|s| scaler.transform(&s.features)).collect()
}

/// Accuracy of each model and of the combined verdict on held-out rows
fn evaluate(
    forest: &RandomForest,
    isolation: &IsolationForest,
    rows: &[Vec<f32>],
    labels: &[u8],
) -> (f32, f32, f32) {
    if rows.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let mut forest_hits = 0_usize;
    let mut isolation_hits = 0_usize;
    let mut ensemble_hits = 0_usize;
    for (row, &label) in rows.iter().zip(labels) {
        let forest_pred = forest.predict(row);
        let isolation_pred = isolation.flag(row);
        let ensemble_pred = or_ensemble(forest_pred == 1, isolation_pred == 1) as u8;

        forest_hits += (forest_pred == label) as usize;
        isolation_hits += (isolation_pred == label) as usize;
        ensemble_hits += (ensemble_pred == label) as usize;
    }

    let n = rows.len() as f32;
    (
        forest_hits as f32 / n,
        isolation_hits as f32 / n,
        ensemble_hits as f32 / n,
    )
}
