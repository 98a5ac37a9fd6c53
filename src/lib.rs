pub mod artifacts;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod features;
pub mod models;
pub mod monitor;
pub mod scaler;
pub mod training;

use std::path::Path;

use tracing::{info, warn};

use artifacts::ArtifactStore;
use config::Config;
use corpus::TrafficClass;
use engine::{Decision, DetectionEngine};
use features::FeatureVector;
use monitor::{MonitorSnapshot, TrafficMonitor};
use training::TrainingMetadata;

/// Core floodmon instance: inference engine plus shared monitoring state
pub struct Detector {
    engine: DetectionEngine,
    monitor: TrafficMonitor,
    metadata: Option<TrainingMetadata>,
}

impl Detector {
    /// Create a detector from the configured artifact directory.
    ///
    /// A missing or inconsistent artifact set leaves the detector degraded
    /// instead of failing; a degraded detector reports every observation as
    /// unknown until a model is trained.
    pub fn new(config: Config) -> Self {
        let model_dir = config.storage.model_dir.clone();
        Self::with_model_dir(config, model_dir)
    }

    /// Create a detector loading artifacts from a custom directory
    pub fn with_model_dir<P: AsRef<Path>>(config: Config, model_dir: P) -> Self {
        let store = ArtifactStore::new(model_dir);
        let (engine, metadata) = match store.load() {
            Ok((artifacts, metadata)) => {
                info!(
                    "loaded artifact set from {} (ensemble accuracy {:.3})",
                    store.dir().display(),
                    metadata.ensemble_accuracy
                );
                (
                    DetectionEngine::new(artifacts, config.thresholds.clone()),
                    Some(metadata),
                )
            }
            Err(e) => {
                warn!("running degraded, no usable artifact set: {e}");
                (DetectionEngine::degraded(config.thresholds.clone()), None)
            }
        };

        Self {
            engine,
            monitor: TrafficMonitor::new(config.monitor.clone()),
            metadata,
        }
    }

    /// Simulate one observation of the given class, classify it, and record it
    pub fn handle_event(&self, class: TrafficClass) -> Decision {
        let features = self.engine.synthesize_observation(class);
        self.handle_observation(&features)
    }

    /// Classify a measured observation and fold it into the monitor
    pub fn handle_observation(&self, features: &FeatureVector) -> Decision {
        let decision = self.engine.classify(features);
        self.monitor.record(&decision, features);
        decision
    }

    /// Monitoring snapshot annotated with the loaded model's eval accuracy
    pub fn snapshot(&self) -> MonitorSnapshot {
        let mut snapshot = self.monitor.snapshot();
        snapshot.model_accuracy = self.metadata.as_ref().map(|m| m.ensemble_accuracy);
        snapshot
    }

    /// Clear monitoring history and the alert counter
    pub fn reset(&self) {
        self.monitor.reset();
    }

    pub fn is_degraded(&self) -> bool {
        self.engine.is_degraded()
    }

    pub fn metadata(&self) -> Option<&TrainingMetadata> {
        self.metadata.as_ref()
    }
}
