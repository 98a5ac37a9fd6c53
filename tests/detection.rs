//! End-to-end flow: train on a synthetic corpus, persist the artifact set,
//! reload it, and classify traffic through the detector facade.

use std::fs;

use tempfile::TempDir;

use floodmon::artifacts::{ArtifactStore, SCALER_FILE};
use floodmon::config::{Config, StorageConfig};
use floodmon::corpus::{CorpusGenerator, TrafficClass};
use floodmon::engine::AttackType;
use floodmon::features::FeatureVector;
use floodmon::models::{ForestConfig, IsolationConfig};
use floodmon::training::{TrainingConfig, TrainingPipeline};
use floodmon::Detector;

fn test_config(dir: &TempDir) -> Config {
    Config {
        training: TrainingConfig {
            samples: 600,
            forest: ForestConfig {
                num_trees: 15,
                max_depth: 8,
                ..ForestConfig::default()
            },
            isolation: IsolationConfig {
                num_trees: 25,
                sample_size: 64,
                ..IsolationConfig::default()
            },
            ..TrainingConfig::default()
        },
        storage: StorageConfig {
            model_dir: dir.path().to_path_buf(),
        },
        ..Config::default()
    }
}

fn train_into(config: &Config) {
    let corpus = CorpusGenerator::new(config.training.seed)
        .generate(config.training.samples)
        .unwrap();
    let (artifacts, metadata) = TrainingPipeline::new(config.training.clone())
        .run(&corpus)
        .unwrap();
    ArtifactStore::new(&config.storage.model_dir)
        .save(&artifacts, &metadata)
        .unwrap();
}

fn benign_vector() -> FeatureVector {
    FeatureVector::from_array([
        100.0, 50_000.0, 5.0, 2.0, 500.0, 100.0, 5.0, 5.0, 2.0, 50.0, 10.0, 3.0,
    ])
}

fn syn_flood_vector() -> FeatureVector {
    FeatureVector::from_array([
        15_000.0, 1_000_000.0, 1200.0, 2.0, 60.0, 10.0, 0.5, 30_000.0, 20.0, 50.0, 5000.0, 7.5,
    ])
}

#[test]
fn test_train_persist_reload_classify() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    train_into(&config);

    let detector = Detector::new(config);
    assert!(!detector.is_degraded());

    let attack = detector.handle_observation(&syn_flood_vector());
    assert!(attack.is_attack);
    assert_eq!(attack.attack_type, AttackType::SynFlood);
    assert_eq!(attack.attack_type.as_str(), "SYN Flood");
    assert!(attack.confidence > 0.5, "confidence {}", attack.confidence);

    let normal = detector.handle_observation(&benign_vector());
    assert!(!normal.is_attack);
    assert_eq!(normal.attack_type, AttackType::Normal);
    assert!(normal.confidence >= 0.5, "confidence {}", normal.confidence);

    let snapshot = detector.snapshot();
    assert_eq!(snapshot.current.alerts, 1);
    assert_eq!(snapshot.traffic_history.len(), 2);
    assert_eq!(snapshot.recent_attacks.len(), 1);
    let accuracy = snapshot.model_accuracy.unwrap();
    assert!(accuracy > 0.8, "ensemble accuracy {accuracy}");
}

#[test]
fn test_untrained_detector_runs_degraded() {
    let dir = TempDir::new().unwrap();
    let detector = Detector::new(test_config(&dir));
    assert!(detector.is_degraded());
    assert!(detector.metadata().is_none());

    let decision = detector.handle_event(TrafficClass::SynFlood);
    assert!(!decision.is_attack);
    assert_eq!(decision.attack_type, AttackType::Unknown);
    assert_eq!(decision.confidence, 0.0);

    let snapshot = detector.snapshot();
    assert_eq!(snapshot.current.alerts, 0);
    assert!(snapshot.model_accuracy.is_none());
    assert_eq!(snapshot.traffic_history.len(), 1);
}

#[test]
fn test_partial_artifact_set_leaves_detector_degraded() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    train_into(&config);

    fs::remove_file(dir.path().join(SCALER_FILE)).unwrap();
    assert!(ArtifactStore::new(dir.path()).load().is_err());

    let detector = Detector::with_model_dir(Config::default(), dir.path());
    assert!(detector.is_degraded());
}

#[test]
fn test_flood_stream_raises_alerts() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    train_into(&config);
    let detector = Detector::new(config);

    let mut attacks = 0_u64;
    for _ in 0..20 {
        let decision = detector.handle_event(TrafficClass::HttpFlood);
        if decision.is_attack {
            attacks += 1;
            assert!(decision.attack_type.is_attack());
        }
    }
    assert!(attacks >= 15, "only {attacks}/20 flood observations flagged");

    let snapshot = detector.snapshot();
    assert_eq!(snapshot.current.alerts, attacks);
    assert_eq!(snapshot.traffic_history.len(), 20);
    assert_eq!(snapshot.recent_attacks.len(), attacks.min(10) as usize);
}

#[test]
fn test_benign_stream_stays_quiet() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    train_into(&config);
    let detector = Detector::new(config);

    for _ in 0..20 {
        let decision = detector.handle_event(TrafficClass::Benign);
        if !decision.is_attack {
            assert_eq!(decision.attack_type, AttackType::Normal);
        }
    }
    let alerts = detector.snapshot().current.alerts;
    assert!(alerts <= 5, "{alerts}/20 benign observations flagged");
}

#[test]
fn test_reset_clears_counters_and_detector_keeps_working() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    train_into(&config);
    let detector = Detector::new(config);

    detector.handle_observation(&syn_flood_vector());
    assert_eq!(detector.snapshot().current.alerts, 1);

    detector.reset();
    let snapshot = detector.snapshot();
    assert_eq!(snapshot.current.alerts, 0);
    assert!(snapshot.traffic_history.is_empty());
    assert!(snapshot.recent_attacks.is_empty());
    assert!(snapshot.current.packets_per_sec > 0.0);

    let decision = detector.handle_observation(&benign_vector());
    assert!(!decision.is_attack);
    assert_eq!(detector.snapshot().traffic_history.len(), 1);
}

#[test]
fn test_metadata_survives_reload() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    train_into(&config);

    let detector = Detector::new(config);
    let metadata = detector.metadata().unwrap();
    assert_eq!(metadata.n_samples, 600);
    assert_eq!(metadata.n_features, 12);
    assert!(metadata.ensemble_accuracy > 0.8);
}
