//! Error types for walkbench

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Walkbench error types
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter failed validation at construction time
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A result accessor was called before any run identity was known
    #[error("no run available yet: call run() first or construct with previous-run lookup enabled")]
    NotReady,

    /// The trajectory artifact was absent at its expected location
    #[error("artifact '{name}' not found for run '{run_id}'")]
    ArtifactNotFound {
        /// Run the artifact was expected to belong to
        run_id: String,
        /// Artifact name that was requested
        name: String,
    },

    /// Artifact bytes could not be decoded as a trajectory
    #[error("malformed trajectory artifact: {0}")]
    MalformedArtifact(String),

    /// The tracking store rejected or failed an operation
    #[error("tracking store error: {0}")]
    Tracking(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
