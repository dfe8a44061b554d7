use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Analysis failure: {0}")]
    AnalysisFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProbeError {
    /// True for the "entity or filtered set absent" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProbeError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
