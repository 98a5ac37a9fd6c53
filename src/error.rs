use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("feature dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("artifact load error: {0}")]
    ArtifactLoad(String),

    #[error("artifact encode error: {0}")]
    Encode(String),

    #[error("artifact decode error: {0}")]
    Decode(String),

    #[error("training corpus is empty")]
    EmptyCorpus,

    #[error("stratified split failed: {0}")]
    SingleClassPartition(String),

    #[error("non-finite value in feature '{feature}' at sample {index}")]
    NonFiniteFeature { feature: &'static str, index: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DetectError>;
