use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Invalid priority: '{0}' (expected P1..P5)")]
    InvalidPriority(String),

    #[error("Invalid resolution policy: '{0}' (expected first-match or accumulate)")]
    InvalidPolicy(String),
}
