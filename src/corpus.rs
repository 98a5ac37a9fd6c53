//! Synthetic labeled traffic corpus generation.
//!
//! Produces training data for the detection models from per-class statistical
//! profiles. Class shares and feature distributions describe one benign
//! population and three flood families.

use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DetectError, Result};
use crate::features::{FeatureVector, NUM_FEATURES};

/// Traffic classes the generator can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrafficClass {
    /// Normal background traffic
    Benign,
    /// High request-rate flood against a web service
    HttpFlood,
    /// Half-open connection flood
    SynFlood,
    /// Volumetric datagram flood
    UdpFlood,
}

impl TrafficClass {
    /// Whether the class counts as an attack
    pub fn is_attack(&self) -> bool {
        !matches!(self, TrafficClass::Benign)
    }

    /// Binary training label: 0 benign, 1 attack
    pub fn label(&self) -> u8 {
        self.is_attack() as u8
    }

    /// Short identifier for logs and data files
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficClass::Benign => "benign",
            TrafficClass::HttpFlood => "http_flood",
            TrafficClass::SynFlood => "syn_flood",
            TrafficClass::UdpFlood => "udp_flood",
        }
    }
}

/// Sampling distribution for one feature
#[derive(Debug, Clone, Copy)]
pub enum FeatureDist {
    /// Gaussian draw; tails are kept, not clipped
    Normal { mean: f32, std: f32 },
    /// Integer draw from the half-open range [lo, hi)
    UniformInt { lo: u32, hi: u32 },
    /// Continuous draw from [lo, hi)
    Uniform { lo: f32, hi: f32 },
}

impl FeatureDist {
    /// Draw one value
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        match *self {
            FeatureDist::Normal { mean, std } => {
                Normal::new(mean, std).unwrap().sample(rng)
            }
            FeatureDist::UniformInt { lo, hi } => rng.random_range(lo..hi) as f32,
            FeatureDist::Uniform { lo, hi } => rng.random_range(lo..hi),
        }
    }
}

/// Generative profile for one traffic class
#[derive(Debug, Clone)]
pub struct ClassProfile {
    /// Class this profile describes
    pub class: TrafficClass,
    /// Population share in the generated corpus
    pub share: f32,
    /// Per-feature sampling distribution, `FEATURE_NAMES` order
    pub dists: [FeatureDist; NUM_FEATURES],
}

impl ClassProfile {
    /// Draw one observation from this profile
    pub fn sample<R: Rng>(&self, rng: &mut R) -> FeatureVector {
        sample_features(&self.dists, rng)
    }
}

/// Draw one observation from a distribution table
pub fn sample_features<R: Rng>(
    dists: &[FeatureDist; NUM_FEATURES],
    rng: &mut R,
) -> FeatureVector {
    let mut values = [0.0_f32; NUM_FEATURES];
    for (value, dist) in values.iter_mut().zip(dists) {
        *value = dist.sample(rng);
    }
    FeatureVector::from_array(values)
}

/// Training profiles for all four classes, declaration order
pub const TRAINING_PROFILES: [ClassProfile; 4] = [
    ClassProfile {
        class: TrafficClass::Benign,
        share: 0.70,
        dists: [
            FeatureDist::Normal { mean: 100.0, std: 20.0 },
            FeatureDist::Normal { mean: 50_000.0, std: 10_000.0 },
            FeatureDist::UniformInt { lo: 1, hi: 10 },
            FeatureDist::UniformInt { lo: 1, hi: 5 },
            FeatureDist::Normal { mean: 500.0, std: 100.0 },
            FeatureDist::Normal { mean: 100.0, std: 30.0 },
            FeatureDist::Normal { mean: 5.0, std: 2.0 },
            FeatureDist::UniformInt { lo: 0, hi: 10 },
            FeatureDist::UniformInt { lo: 0, hi: 5 },
            FeatureDist::UniformInt { lo: 0, hi: 100 },
            FeatureDist::Normal { mean: 10.0, std: 3.0 },
            FeatureDist::Uniform { lo: 2.0, hi: 4.0 },
        ],
    },
    ClassProfile {
        class: TrafficClass::HttpFlood,
        share: 0.15,
        dists: [
            FeatureDist::Normal { mean: 10_000.0, std: 2_000.0 },
            FeatureDist::Normal { mean: 5_000_000.0, std: 1_000_000.0 },
            FeatureDist::UniformInt { lo: 100, hi: 1000 },
            FeatureDist::UniformInt { lo: 1, hi: 3 },
            FeatureDist::Normal { mean: 300.0, std: 50.0 },
            FeatureDist::Normal { mean: 50.0, std: 20.0 },
            FeatureDist::Normal { mean: 1.0, std: 0.5 },
            FeatureDist::UniformInt { lo: 1000, hi: 10_000 },
            FeatureDist::UniformInt { lo: 0, hi: 100 },
            FeatureDist::UniformInt { lo: 1000, hi: 10_000 },
            FeatureDist::Normal { mean: 1000.0, std: 200.0 },
            FeatureDist::Uniform { lo: 5.0, hi: 8.0 },
        ],
    },
    ClassProfile {
        class: TrafficClass::SynFlood,
        share: 0.10,
        dists: [
            FeatureDist::Normal { mean: 15_000.0, std: 3_000.0 },
            FeatureDist::Normal { mean: 1_000_000.0, std: 200_000.0 },
            FeatureDist::UniformInt { lo: 500, hi: 2000 },
            FeatureDist::UniformInt { lo: 1, hi: 5 },
            FeatureDist::Normal { mean: 60.0, std: 10.0 },
            FeatureDist::Normal { mean: 10.0, std: 5.0 },
            FeatureDist::Normal { mean: 0.5, std: 0.2 },
            FeatureDist::UniformInt { lo: 10_000, hi: 50_000 },
            FeatureDist::UniformInt { lo: 0, hi: 50 },
            FeatureDist::UniformInt { lo: 0, hi: 100 },
            FeatureDist::Normal { mean: 5000.0, std: 1000.0 },
            FeatureDist::Uniform { lo: 6.0, hi: 9.0 },
        ],
    },
    ClassProfile {
        class: TrafficClass::UdpFlood,
        share: 0.05,
        dists: [
            FeatureDist::Normal { mean: 20_000.0, std: 5_000.0 },
            FeatureDist::Normal { mean: 10_000_000.0, std: 2_000_000.0 },
            FeatureDist::UniformInt { lo: 200, hi: 1500 },
            FeatureDist::UniformInt { lo: 10, hi: 100 },
            FeatureDist::Normal { mean: 1000.0, std: 200.0 },
            FeatureDist::Normal { mean: 300.0, std: 100.0 },
            FeatureDist::Normal { mean: 0.3, std: 0.1 },
            FeatureDist::UniformInt { lo: 0, hi: 10 },
            FeatureDist::UniformInt { lo: 0, hi: 10 },
            FeatureDist::UniformInt { lo: 0, hi: 50 },
            FeatureDist::Normal { mean: 3000.0, std: 500.0 },
            FeatureDist::Uniform { lo: 4.0, hi: 7.0 },
        ],
    },
];

/// A labeled observation produced by the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub features: FeatureVector,
    pub class: TrafficClass,
}

impl LabeledSample {
    /// Binary training label: 0 benign, 1 attack
    pub fn label(&self) -> u8 {
        self.class.label()
    }
}

/// Seeded corpus generator over `TRAINING_PROFILES`
pub struct CorpusGenerator {
    seed: u64,
}

impl CorpusGenerator {
    /// Create a generator; a fixed seed yields an identical corpus
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Generate `n` labeled samples.
    ///
    /// Attack-class counts are `round(n * share)`; the benign class takes the
    /// remainder so the total is exactly `n`. Samples are drawn class by
    /// class, then shuffled.
    pub fn generate(&self, n: usize) -> Result<Vec<LabeledSample>> {
        if n == 0 {
            return Err(DetectError::EmptyCorpus);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let counts = class_counts(n);
        let mut samples = Vec::with_capacity(n);

        for (profile, &count) in TRAINING_PROFILES.iter().zip(counts.iter()) {
            for _ in 0..count {
                samples.push(LabeledSample {
                    features: profile.sample(&mut rng),
                    class: profile.class,
                });
            }
            debug!("generated {} {} samples", count, profile.class.as_str());
        }

        samples.shuffle(&mut rng);
        Ok(samples)
    }
}

/// Per-class counts: attack classes rounded, benign absorbs the residual
fn class_counts(n: usize) -> [usize; 4] {
    let http = (n as f64 * TRAINING_PROFILES[1].share as f64).round() as usize;
    let syn = (n as f64 * TRAINING_PROFILES[2].share as f64).round() as usize;
    let udp = (n as f64 * TRAINING_PROFILES[3].share as f64).round() as usize;
    [n - http - syn - udp, http, syn, udp]
}
