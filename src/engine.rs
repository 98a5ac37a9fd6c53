//! Inference engine: turns a feature vector into an attack decision.
//!
//! The engine holds the fitted artifact set and applies the same scaling the
//! models were trained with. Without artifacts it runs degraded and reports
//! every observation as unknown rather than guessing.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::corpus::{sample_features, FeatureDist, TrafficClass};
use crate::features::{FeatureVector, NUM_FEATURES};
use crate::models::or_ensemble;
use crate::training::ModelArtifacts;

/// Classification result labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackType {
    Normal,
    SynFlood,
    HttpFlood,
    UdpFlood,
    /// Attack verdict that matched no specific threshold rule
    Generic,
    /// Engine could not classify, e.g. while degraded
    Unknown,
}

impl AttackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackType::Normal => "Normal",
            AttackType::SynFlood => "SYN Flood",
            AttackType::HttpFlood => "HTTP Flood",
            AttackType::UdpFlood => "UDP Flood",
            AttackType::Generic => "DDoS Attack",
            AttackType::Unknown => "Unknown",
        }
    }

    pub fn is_attack(&self) -> bool {
        matches!(
            self,
            AttackType::SynFlood | AttackType::HttpFlood | AttackType::UdpFlood | AttackType::Generic
        )
    }
}

impl fmt::Display for AttackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classification verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub is_attack: bool,
    /// Classifier probability of the side the ensemble chose
    pub confidence: f32,
    pub attack_type: AttackType,
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    /// Verdict of a degraded engine: benign-shaped, zero confidence
    pub fn unknown() -> Self {
        Self {
            is_attack: false,
            confidence: 0.0,
            attack_type: AttackType::Unknown,
            timestamp: Utc::now(),
        }
    }
}

/// Raw-feature cutoffs for naming an attack once the ensemble has alarmed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackThresholds {
    pub syn_flood_syn_count: f32,
    pub http_flood_packets_per_sec: f32,
    pub udp_flood_bytes_per_sec: f32,
}

impl Default for AttackThresholds {
    fn default() -> Self {
        Self {
            syn_flood_syn_count: 5_000.0,
            http_flood_packets_per_sec: 5_000.0,
            udp_flood_bytes_per_sec: 5_000_000.0,
        }
    }
}

pub struct DetectionEngine {
    artifacts: Option<ModelArtifacts>,
    thresholds: AttackThresholds,
}

impl DetectionEngine {
    pub fn new(artifacts: ModelArtifacts, thresholds: AttackThresholds) -> Self {
        Self { artifacts: Some(artifacts), thresholds }
    }

    /// Engine with no usable artifact set; classifies everything as unknown
    pub fn degraded(thresholds: AttackThresholds) -> Self {
        Self { artifacts: None, thresholds }
    }

    pub fn is_degraded(&self) -> bool {
        self.artifacts.is_none()
    }

    /// Draw one observation shaped like live traffic of the given class.
    ///
    /// Stands in for a capture pipeline: ranges are narrower than the
    /// training distributions, the way a short measurement window clusters
    /// near the class mean.
    pub fn synthesize_observation(&self, class: TrafficClass) -> FeatureVector {
        let mut rng = rand::rng();
        sample_features(&observation_dists(class), &mut rng)
    }

    /// Classify one observation.
    ///
    /// The ensemble alarms when either model does; confidence always comes
    /// from the classifier's vote share for the chosen side.
    pub fn classify(&self, features: &FeatureVector) -> Decision {
        let Some(artifacts) = &self.artifacts else {
            return Decision::unknown();
        };

        let row = match artifacts.scaler.transform(features) {
            Ok(row) => row,
            Err(e) => {
                warn!("cannot standardize observation: {e}");
                return Decision::unknown();
            }
        };

        let (benign_prob, attack_prob) = artifacts.forest.predict_proba(&row);
        let forest_attack = artifacts.forest.predict(&row) == 1;
        let anomaly = artifacts.isolation.flag(&row) == 1;
        let is_attack = or_ensemble(forest_attack, anomaly);

        let confidence = if is_attack { attack_prob } else { benign_prob };
        let attack_type = if is_attack {
            self.label_attack(features)
        } else {
            AttackType::Normal
        };

        Decision {
            is_attack,
            confidence,
            attack_type,
            timestamp: Utc::now(),
        }
    }

    /// Name an attack from raw, unstandardized features.
    /// First matching rule wins; the order is part of the contract.
    fn label_attack(&self, features: &FeatureVector) -> AttackType {
        let t = &self.thresholds;
        if features.syn_count() > t.syn_flood_syn_count {
            AttackType::SynFlood
        } else if features.packets_per_sec() > t.http_flood_packets_per_sec {
            AttackType::HttpFlood
        } else if features.bytes_per_sec() > t.udp_flood_bytes_per_sec {
            AttackType::UdpFlood
        } else {
            AttackType::Generic
        }
    }
}

/// Live-observation distributions per class, `FEATURE_NAMES` order
fn observation_dists(class: TrafficClass) -> [FeatureDist; NUM_FEATURES] {
    match class {
        TrafficClass::Benign => [
            FeatureDist::Uniform { lo: 80.0, hi: 120.0 },
            FeatureDist::Uniform { lo: 40_000.0, hi: 60_000.0 },
            FeatureDist::UniformInt { lo: 1, hi: 11 },
            FeatureDist::UniformInt { lo: 1, hi: 6 },
            FeatureDist::Uniform { lo: 400.0, hi: 600.0 },
            FeatureDist::Uniform { lo: 80.0, hi: 120.0 },
            FeatureDist::Uniform { lo: 4.0, hi: 6.0 },
            FeatureDist::UniformInt { lo: 0, hi: 11 },
            FeatureDist::UniformInt { lo: 0, hi: 6 },
            FeatureDist::UniformInt { lo: 0, hi: 101 },
            FeatureDist::Uniform { lo: 8.0, hi: 12.0 },
            FeatureDist::Uniform { lo: 2.0, hi: 4.0 },
        ],
        TrafficClass::HttpFlood => [
            FeatureDist::Uniform { lo: 8_000.0, hi: 12_000.0 },
            FeatureDist::Uniform { lo: 4_000_000.0, hi: 6_000_000.0 },
            FeatureDist::UniformInt { lo: 100, hi: 1001 },
            FeatureDist::UniformInt { lo: 1, hi: 4 },
            FeatureDist::Uniform { lo: 250.0, hi: 350.0 },
            FeatureDist::Uniform { lo: 40.0, hi: 60.0 },
            FeatureDist::Uniform { lo: 0.5, hi: 1.5 },
            FeatureDist::UniformInt { lo: 1000, hi: 10_001 },
            FeatureDist::UniformInt { lo: 0, hi: 101 },
            FeatureDist::UniformInt { lo: 1000, hi: 10_001 },
            FeatureDist::Uniform { lo: 900.0, hi: 1100.0 },
            FeatureDist::Uniform { lo: 5.0, hi: 8.0 },
        ],
        TrafficClass::SynFlood => [
            FeatureDist::Uniform { lo: 13_000.0, hi: 17_000.0 },
            FeatureDist::Uniform { lo: 900_000.0, hi: 1_100_000.0 },
            FeatureDist::UniformInt { lo: 500, hi: 2001 },
            FeatureDist::UniformInt { lo: 1, hi: 6 },
            FeatureDist::Uniform { lo: 55.0, hi: 65.0 },
            FeatureDist::Uniform { lo: 8.0, hi: 12.0 },
            FeatureDist::Uniform { lo: 0.4, hi: 0.6 },
            FeatureDist::UniformInt { lo: 10_000, hi: 50_001 },
            FeatureDist::UniformInt { lo: 0, hi: 51 },
            FeatureDist::UniformInt { lo: 0, hi: 101 },
            FeatureDist::Uniform { lo: 4500.0, hi: 5500.0 },
            FeatureDist::Uniform { lo: 6.0, hi: 9.0 },
        ],
        TrafficClass::UdpFlood => [
            FeatureDist::Uniform { lo: 15_000.0, hi: 25_000.0 },
            FeatureDist::Uniform { lo: 8_000_000.0, hi: 12_000_000.0 },
            FeatureDist::UniformInt { lo: 200, hi: 1500 },
            FeatureDist::UniformInt { lo: 10, hi: 100 },
            FeatureDist::Uniform { lo: 800.0, hi: 1200.0 },
            FeatureDist::Uniform { lo: 200.0, hi: 400.0 },
            FeatureDist::Uniform { lo: 0.2, hi: 0.4 },
            FeatureDist::UniformInt { lo: 0, hi: 10 },
            FeatureDist::UniformInt { lo: 0, hi: 10 },
            FeatureDist::UniformInt { lo: 0, hi: 50 },
            FeatureDist::Uniform { lo: 2500.0, hi: 3500.0 },
            FeatureDist::Uniform { lo: 4.0, hi: 7.0 },
        ],
    }
}
