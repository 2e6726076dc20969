use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricAuditError {
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Upstream extractor returned an unexpected shape: {0}")]
    UnexpectedResponseShape(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MetricAuditError>;
