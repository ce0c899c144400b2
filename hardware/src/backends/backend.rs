//! Quantum backend trait
//!
//! Every provider integration implements `QuantumBackend` so the gateway can
//! route jobs without knowing how a provider accepts them.

use async_trait::async_trait;

use crate::circuit::CircuitDescription;
use crate::error::HardwareResult;
use crate::job::{HardwareConfig, HardwareProvider, JobHandle, JobId, JobReport};

/// Provider integration
#[async_trait]
pub trait QuantumBackend: Send + Sync {
    /// Provider served by this backend
    fn provider(&self) -> HardwareProvider;

    /// Submit a circuit for execution
    ///
    /// # Returns
    /// * `Ok(JobHandle)` - Job was accepted and queued
    /// * `Err(HardwareError)` - Circuit was rejected or submission failed
    async fn submit_job(
        &mut self,
        circuit: &CircuitDescription,
        config: &HardwareConfig,
    ) -> HardwareResult<JobHandle>;

    /// Fetch the latest status of a job, with counts once it has completed
    async fn poll_status(
        &mut self,
        job_id: &JobId,
        config: &HardwareConfig,
    ) -> HardwareResult<JobReport>;

    /// Cancel a job that has not reached a terminal state
    async fn cancel_job(&mut self, job_id: &JobId) -> HardwareResult<JobReport>;

    /// Drop any local record of a job
    ///
    /// Backends that keep no job state can rely on the default.
    async fn forget_job(&mut self, _job_id: &JobId) -> HardwareResult<()> {
        Ok(())
    }

    /// Drop local records of terminal jobs, returning how many were removed
    async fn clear_terminal_jobs(&mut self) -> usize {
        0
    }
}
