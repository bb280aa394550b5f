//! Error types for the affinity pipeline

use thiserror::Error;

/// Core AFFINITY errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AffinityError {
    // Input errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Instrumentation errors
    #[error("Monitor registration failed: {0}")]
    MonitorRegistration(String),

    #[error("Logging initialization failed: {0}")]
    Logging(String),

    // Runtime errors
    #[error("Prune worker unavailable")]
    WorkerUnavailable,
}

/// Result type for AFFINITY operations
pub type AffinityResult<T> = Result<T, AffinityError>;
