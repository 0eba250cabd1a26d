use thiserror::Error;

/// Errors raised at the edges of the scoring pipeline.
///
/// Scoring itself never fails on poor data; it reports `insufficient-data`
/// states and guard values instead. These variants cover ingestion and setup.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
