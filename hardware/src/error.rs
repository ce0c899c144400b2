//! Error types for hardware job submission

use thiserror::Error;

use crate::job::{HardwareProvider, JobId, JobStatus};

/// Result type for hardware operations
pub type HardwareResult<T> = Result<T, HardwareError>;

/// Hardware gateway error types
#[derive(Debug, Error)]
pub enum HardwareError {
    /// No backend registered for the requested provider
    #[error("No backend registered for provider {0}")]
    ProviderNotRegistered(HardwareProvider),

    /// Job ID unknown to the backend
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// Circuit failed validation
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// Backend refused or failed the submission
    #[error("Submission to {provider} failed: {message}")]
    Submission {
        /// Provider the job was sent to
        provider: HardwareProvider,
        /// Error message
        message: String,
        /// Whether the backend reported a transient condition
        transient: bool,
    },

    /// Job is in a state that does not allow the operation
    #[error("Job {job_id} in state {status} cannot be {operation}")]
    InvalidJobState {
        /// Job ID
        job_id: JobId,
        /// Current status
        status: JobStatus,
        /// Operation attempted
        operation: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl HardwareError {
    /// Check if the caller may retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, HardwareError::Submission { transient: true, .. })
    }
}
