//! Error types for the optimization and simulation engine

use thiserror::Error;

/// Errors that can occur while optimizing, pricing or estimating risk
#[derive(Error, Debug)]
pub enum EngineError {
    /// No candidate satisfied the constraints within the iteration budget
    #[error("Optimization failed: {0}")]
    OptimizationFailed(String),

    /// Engine state accessed outside its lifecycle
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Too few assets to form a state space
    #[error("Insufficient assets: {0}")]
    InsufficientAssets(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid confidence level: {0} (must be between 0 and 1)")]
    InvalidConfidenceLevel(f64),

    #[error("Negative volatility not allowed")]
    NegativeVolatility,

    #[error("Non-positive price not allowed")]
    NegativePrice,

    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether a caller may reasonably retry, e.g. with relaxed constraints
    /// or a different seed
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::OptimizationFailed(_))
    }

    /// Whether the error was caused by the caller's arguments
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EngineError::InsufficientAssets(_)
                | EngineError::InvalidParameter(_)
                | EngineError::InvalidConfidenceLevel(_)
                | EngineError::NegativeVolatility
                | EngineError::NegativePrice
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
