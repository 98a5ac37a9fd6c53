//! Artifact persistence.
//!
//! A trained model ships as five files in one directory: three bincode
//! members and two JSON members. The set loads as a unit; a missing or
//! inconsistent member fails the whole load so inference never runs on a
//! partial model.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::error::{DetectError, Result};
use crate::features::{FEATURE_NAMES, NUM_FEATURES};
use crate::models::{IsolationForest, RandomForest};
use crate::scaler::FeatureScaler;
use crate::training::{ModelArtifacts, TrainingMetadata};

pub const FOREST_FILE: &str = "random_forest.bin";
pub const ISOLATION_FILE: &str = "isolation_forest.bin";
pub const SCALER_FILE: &str = "scaler.bin";
pub const FEATURES_FILE: &str = "feature_names.json";
pub const METADATA_FILE: &str = "metadata.json";

/// Reads and writes one artifact directory
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write all five members, creating the directory if needed
    pub fn save(&self, artifacts: &ModelArtifacts, metadata: &TrainingMetadata) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        write_bincode(&self.dir.join(FOREST_FILE), &artifacts.forest)?;
        write_bincode(&self.dir.join(ISOLATION_FILE), &artifacts.isolation)?;
        write_bincode(&self.dir.join(SCALER_FILE), &artifacts.scaler)?;
        write_json(&self.dir.join(FEATURES_FILE), &artifacts.feature_names)?;
        write_json(&self.dir.join(METADATA_FILE), metadata)?;
        info!("saved artifact set to {}", self.dir.display());
        Ok(())
    }

    /// Read all five members and cross-check them before handing them out
    pub fn load(&self) -> Result<(ModelArtifacts, TrainingMetadata)> {
        let forest: RandomForest = read_bincode(&self.dir.join(FOREST_FILE))?;
        let isolation: IsolationForest = read_bincode(&self.dir.join(ISOLATION_FILE))?;
        let scaler: FeatureScaler = read_bincode(&self.dir.join(SCALER_FILE))?;
        let feature_names: Vec<String> = read_json(&self.dir.join(FEATURES_FILE))?;
        let metadata: TrainingMetadata = read_json(&self.dir.join(METADATA_FILE))?;

        if feature_names != FEATURE_NAMES {
            return Err(DetectError::ArtifactLoad(format!(
                "feature schema mismatch in {}",
                self.dir.join(FEATURES_FILE).display()
            )));
        }
        if !scaler.fitted || scaler.stats.len() != NUM_FEATURES {
            return Err(DetectError::ArtifactLoad(format!(
                "unfitted or truncated scaler in {}",
                self.dir.join(SCALER_FILE).display()
            )));
        }
        if !forest.is_trained() || !isolation.is_trained() {
            return Err(DetectError::ArtifactLoad(format!(
                "untrained model in {}",
                self.dir.display()
            )));
        }

        Ok((ModelArtifacts { forest, isolation, scaler, feature_names }, metadata))
    }
}

fn write_bincode<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    bincode::serde::encode_into_std_write(value, &mut writer, bincode::config::standard())
        .map_err(|e| DetectError::Encode(format!("{}: {e}", path.display())))?;
    Ok(())
}

fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)
        .map_err(|e| DetectError::ArtifactLoad(format!("{}: {e}", path.display())))?;
    let mut reader = BufReader::new(file);
    bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())
        .map_err(|e| DetectError::Decode(format!("{}: {e}", path.display())))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| DetectError::Encode(format!("{}: {e}", path.display())))?;
    fs::write(path, text)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .map_err(|e| DetectError::ArtifactLoad(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| DetectError::Decode(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusGenerator;
    use crate::models::{ForestConfig, IsolationConfig};
    use crate::training::{TrainingConfig, TrainingPipeline};
    use tempfile::TempDir;

    fn make_trained() -> (ModelArtifacts, TrainingMetadata) {
        let config = TrainingConfig {
            forest: ForestConfig { num_trees: 5, max_depth: 6, ..ForestConfig::default() },
            isolation: IsolationConfig {
                num_trees: 10,
                sample_size: 32,
                ..IsolationConfig::default()
            },
            ..TrainingConfig::default()
        };
        let corpus = CorpusGenerator::new(42).generate(200).unwrap();
        TrainingPipeline::new(config).run(&corpus).unwrap()
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (artifacts, metadata) = make_trained();

        store.save(&artifacts, &metadata).unwrap();
        for name in [FOREST_FILE, ISOLATION_FILE, SCALER_FILE, FEATURES_FILE, METADATA_FILE] {
            assert!(dir.path().join(name).exists(), "missing {name}");
        }

        let (loaded, loaded_meta) = store.load().unwrap();
        assert_eq!(loaded.forest, artifacts.forest);
        assert_eq!(loaded.isolation, artifacts.isolation);
        assert_eq!(loaded.scaler.stats, artifacts.scaler.stats);
        assert_eq!(loaded.feature_names, artifacts.feature_names);
        assert_eq!(loaded_meta.n_samples, metadata.n_samples);
    }

    #[test]
    fn test_missing_member_fails_whole_load() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (artifacts, metadata) = make_trained();
        store.save(&artifacts, &metadata).unwrap();

        fs::remove_file(dir.path().join(SCALER_FILE)).unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, DetectError::ArtifactLoad(_)));
    }

    #[test]
    fn test_empty_dir_fails_load() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(store.load().unwrap_err(), DetectError::ArtifactLoad(_)));
    }

    #[test]
    fn test_foreign_schema_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (artifacts, metadata) = make_trained();
        store.save(&artifacts, &metadata).unwrap();

        fs::write(dir.path().join(FEATURES_FILE), r#"["pps", "bps"]"#).unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, DetectError::ArtifactLoad(_)));
    }

    #[test]
    fn test_corrupt_member_fails_decode() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (artifacts, metadata) = make_trained();
        store.save(&artifacts, &metadata).unwrap();

        fs::write(dir.path().join(FOREST_FILE), b"not a model").unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, DetectError::Decode(_)));
    }
}
