//! Feature standardization.
//!
//! Per-feature z-score scaling with moments accumulated by Welford's online
//! algorithm. The scaler is fitted on the training partition only and then
//! applied unchanged to every later row.

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};
use crate::features::{FeatureVector, NUM_FEATURES};

/// Running statistics for a single feature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    /// Running mean
    pub mean: f32,
    /// Running M2 for variance (Welford's algorithm)
    pub m2: f64,
    /// Sample count
    pub count: u64,
}

impl FeatureStats {
    /// Update statistics with a new value
    pub fn update(&mut self, value: f32) {
        self.count += 1;

        let delta = value as f64 - self.mean as f64;
        self.mean += (delta / self.count as f64) as f32;
        let delta2 = value as f64 - self.mean as f64;
        self.m2 += delta * delta2;
    }

    /// Get variance
    pub fn variance(&self) -> f32 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64) as f32
        }
    }

    /// Get standard deviation
    pub fn std(&self) -> f32 {
        self.variance().sqrt()
    }

    /// Standardize a value using z-score; zero-variance features map to 0
    pub fn standardize(&self, value: f32) -> f32 {
        let std = self.std();
        if std > 0.0 {
            (value - self.mean) / std
        } else {
            0.0
        }
    }
}

/// Z-score scaler over the full feature schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    /// Statistics for each feature
    pub stats: Vec<FeatureStats>,
    /// Whether the scaler has been fitted
    pub fitted: bool,
}

impl Default for FeatureScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureScaler {
    /// Create an unfitted scaler
    pub fn new() -> Self {
        Self {
            stats: vec![FeatureStats::default(); NUM_FEATURES],
            fitted: false,
        }
    }

    /// Accumulate moments from the given rows.
    ///
    /// Callers decide which rows count as training data; rows passed here are
    /// the only ones that ever influence the moments.
    pub fn fit(&mut self, rows: &[FeatureVector]) -> Result<()> {
        for row in rows {
            if row.len() != self.stats.len() {
                return Err(DetectError::DimensionMismatch {
                    expected: self.stats.len(),
                    got: row.len(),
                });
            }
            for (stat, &value) in self.stats.iter_mut().zip(row.as_slice()) {
                stat.update(value);
            }
        }

        if !rows.is_empty() {
            self.fitted = true;
        }
        Ok(())
    }

    /// Standardize one row with the fitted moments
    pub fn transform(&self, row: &FeatureVector) -> Result<Vec<f32>> {
        if row.len() != self.stats.len() {
            return Err(DetectError::DimensionMismatch {
                expected: self.stats.len(),
                got: row.len(),
            });
        }

        Ok(self
            .stats
            .iter()
            .zip(row.as_slice())
            .map(|(stat, &value)| stat.standardize(value))
            .collect())
    }

    /// Number of samples used for fitting
    pub fn sample_count(&self) -> u64 {
        self.stats.first().map(|s| s.count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_row(value: f32) -> FeatureVector {
        FeatureVector::from_array([value; NUM_FEATURES])
    }

    #[test]
    fn test_stats_update() {
        let mut stats = FeatureStats::default();
        for v in [1.0, 2.0, 3.0] {
            stats.update(v);
        }

        assert_eq!(stats.count, 3);
        assert!((stats.mean - 2.0).abs() < 0.001);
        assert!((stats.variance() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_standardize_maps_mean_to_zero() {
        let mut stats = FeatureStats::default();
        for v in [0.0, 1.0, 2.0, 3.0, 4.0] {
            stats.update(v);
        }

        assert!(stats.standardize(stats.mean).abs() < 0.001);
    }

    #[test]
    fn test_zero_variance_guard() {
        let mut scaler = FeatureScaler::new();
        scaler
            .fit(&[constant_row(7.0), constant_row(7.0), constant_row(7.0)])
            .unwrap();

        let scaled = scaler.transform(&constant_row(123.0)).unwrap();
        assert!(scaled.iter().all(|v| v.is_finite()));
        assert!(scaled.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_fit_only_sees_given_rows() {
        let train = [constant_row(1.0), constant_row(3.0)];
        let extra = [constant_row(100.0)];

        let mut scaler = FeatureScaler::new();
        scaler.fit(&train).unwrap();

        let mut polluted = FeatureScaler::new();
        polluted.fit(&train).unwrap();
        polluted.fit(&extra).unwrap();

        assert!((scaler.stats[0].mean - 2.0).abs() < 0.001);
        assert!(polluted.stats[0].mean > scaler.stats[0].mean);
        assert_eq!(scaler.sample_count(), 2);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let scaler = FeatureScaler::new();
        let short = FeatureVector::new(vec![1.0; NUM_FEATURES]).unwrap();
        assert!(scaler.transform(&short).is_ok());

        let mut narrow = FeatureScaler::new();
        narrow.stats.truncate(4);
        let err = narrow.transform(&short).unwrap_err();
        assert!(matches!(
            err,
            DetectError::DimensionMismatch {
                expected: 4,
                got: NUM_FEATURES
            }
        ));
    }
}
