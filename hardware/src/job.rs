//! Job types shared by every hardware backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{HardwareError, HardwareResult};

/// Unique identifier for a submitted job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Generate a new random job ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hardware provider a job is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareProvider {
    Ibm,
    Rigetti,
    #[serde(rename = "ionq")]
    IonQ,
    Simulator,
}

impl std::fmt::Display for HardwareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HardwareProvider::Ibm => write!(f, "ibm"),
            HardwareProvider::Rigetti => write!(f, "rigetti"),
            HardwareProvider::IonQ => write!(f, "ionq"),
            HardwareProvider::Simulator => write!(f, "simulator"),
        }
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Whether the job can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "QUEUED"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
            JobStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Provider routing and credentials for a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// Provider the job is routed to
    pub provider: HardwareProvider,

    /// Device or simulator name at the provider
    pub backend_name: String,

    /// Overrides the circuit's own shot count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots_override: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl HardwareConfig {
    /// Create a new hardware configuration
    pub fn new(provider: HardwareProvider, backend_name: impl Into<String>) -> Self {
        Self {
            provider,
            backend_name: backend_name.into(),
            shots_override: None,
            api_token: None,
        }
    }

    /// Local simulator configuration
    pub fn simulator() -> Self {
        Self::new(HardwareProvider::Simulator, "statevector")
    }

    /// Set API token
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Override the number of shots
    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots_override = Some(shots);
        self
    }

    pub fn validate(&self) -> HardwareResult<()> {
        if self.backend_name.trim().is_empty() {
            return Err(HardwareError::ConfigError(format!(
                "Backend name required for provider {}",
                self.provider
            )));
        }

        if self.shots_override == Some(0) {
            return Err(HardwareError::ConfigError(
                "Shot override must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Acknowledgement returned by a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: JobId,
    pub status: JobStatus,
    pub provider: HardwareProvider,
    pub submitted_at: DateTime<Utc>,
}

/// Status snapshot returned by a poll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: JobId,
    pub status: JobStatus,

    /// Measurement counts keyed by bitstring, present once completed
    pub counts: Option<BTreeMap<String, u64>>,

    /// Backend execution time, present once completed
    pub execution_time: Option<Duration>,

    /// Failure or cancellation detail
    pub message: Option<String>,
}

impl JobReport {
    /// Total shots recorded in the counts
    pub fn total_shots(&self) -> u64 {
        self.counts
            .as_ref()
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }
}
