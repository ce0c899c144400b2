//! Hardware gateway routing jobs to registered backends
//!
//! The gateway owns one backend per provider and remembers which provider
//! accepted each job. Reports for terminal jobs are cached so repeated polls
//! do not reach the backend.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::backends::backend::QuantumBackend;
use crate::circuit::CircuitDescription;
use crate::error::{HardwareError, HardwareResult};
use crate::job::{HardwareConfig, HardwareProvider, JobHandle, JobId, JobReport};

#[derive(Debug, Clone)]
struct TrackedJob {
    provider: HardwareProvider,
    last_report: Option<JobReport>,
}

/// Registry of provider backends
pub struct HardwareGateway {
    backends: HashMap<HardwareProvider, Arc<Mutex<Box<dyn QuantumBackend>>>>,
    jobs: Arc<RwLock<HashMap<JobId, TrackedJob>>>,
}

impl HardwareGateway {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a backend, replacing any previous backend for its provider
    pub fn register_backend(&mut self, backend: Box<dyn QuantumBackend>) {
        let provider = backend.provider();
        info!("Registering hardware backend: {}", provider);

        if self
            .backends
            .insert(provider, Arc::new(Mutex::new(backend)))
            .is_some()
        {
            warn!("Replaced existing backend for provider {}", provider);
        }
    }

    /// Providers with a registered backend
    pub fn providers(&self) -> Vec<HardwareProvider> {
        self.backends.keys().copied().collect()
    }

    pub fn is_registered(&self, provider: HardwareProvider) -> bool {
        self.backends.contains_key(&provider)
    }

    fn backend(
        &self,
        provider: HardwareProvider,
    ) -> HardwareResult<&Arc<Mutex<Box<dyn QuantumBackend>>>> {
        self.backends
            .get(&provider)
            .ok_or(HardwareError::ProviderNotRegistered(provider))
    }

    /// Submit a circuit to the provider named in `config`
    pub async fn submit_job(
        &self,
        circuit: &CircuitDescription,
        config: &HardwareConfig,
    ) -> HardwareResult<JobHandle> {
        info!(
            "Submitting {}-qubit circuit to {} ({})",
            circuit.num_qubits, config.provider, config.backend_name
        );

        config.validate()?;
        circuit.validate()?;
        let backend = self.backend(config.provider)?;

        let handle = {
            let mut backend = backend.lock().await;
            backend.submit_job(circuit, config).await?
        };

        self.jobs.write().await.insert(
            handle.job_id,
            TrackedJob {
                provider: config.provider,
                last_report: None,
            },
        );

        info!("Job {} accepted by {}", handle.job_id, handle.provider);
        Ok(handle)
    }

    /// Poll a job through the provider named in `config`
    pub async fn poll_status(
        &self,
        job_id: &JobId,
        config: &HardwareConfig,
    ) -> HardwareResult<JobReport> {
        debug!("Polling job {} on {}", job_id, config.provider);

        if let Some(report) = self.cached_terminal_report(job_id).await {
            return Ok(report);
        }

        let backend = self.backend(config.provider)?;
        let report = {
            let mut backend = backend.lock().await;
            backend.poll_status(job_id, config).await?
        };

        self.record(job_id, config.provider, &report).await;
        Ok(report)
    }

    /// Cancel a job through the provider named in `config`
    pub async fn cancel_job(
        &self,
        job_id: &JobId,
        config: &HardwareConfig,
    ) -> HardwareResult<JobReport> {
        info!("Cancelling job {} on {}", job_id, config.provider);

        if let Some(report) = self.cached_terminal_report(job_id).await {
            return Err(HardwareError::InvalidJobState {
                job_id: *job_id,
                status: report.status,
                operation: "cancelled".to_string(),
            });
        }

        let backend = self.backend(config.provider)?;
        let report = {
            let mut backend = backend.lock().await;
            backend.cancel_job(job_id).await?
        };

        self.record(job_id, config.provider, &report).await;
        info!("Job {} is now {}", job_id, report.status);
        Ok(report)
    }

    /// Provider that accepted a job submitted through this gateway
    pub async fn job_provider(&self, job_id: &JobId) -> Option<HardwareProvider> {
        self.jobs.read().await.get(job_id).map(|job| job.provider)
    }

    /// Number of jobs tracked by the gateway
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Stop tracking a job and drop it from its backend
    pub async fn forget_job(&self, job_id: &JobId) -> HardwareResult<HardwareProvider> {
        let tracked = self
            .jobs
            .write()
            .await
            .remove(job_id)
            .ok_or(HardwareError::JobNotFound(*job_id))?;

        if let Some(backend) = self.backends.get(&tracked.provider) {
            backend.lock().await.forget_job(job_id).await?;
        }

        debug!("Forgot job {} on {}", job_id, tracked.provider);
        Ok(tracked.provider)
    }

    /// Drop every job whose last report was terminal, here and in each backend
    ///
    /// Returns the number of jobs the gateway stopped tracking.
    pub async fn clear_terminal_jobs(&self) -> usize {
        let cleared = {
            let mut jobs = self.jobs.write().await;
            let before = jobs.len();
            jobs.retain(|_, job| {
                !job
                    .last_report
                    .as_ref()
                    .is_some_and(|report| report.status.is_terminal())
            });
            before - jobs.len()
        };

        for backend in self.backends.values() {
            backend.lock().await.clear_terminal_jobs().await;
        }

        info!("Cleared {} terminal jobs", cleared);
        cleared
    }

    async fn cached_terminal_report(&self, job_id: &JobId) -> Option<JobReport> {
        let jobs = self.jobs.read().await;
        jobs.get(job_id)
            .and_then(|job| job.last_report.as_ref())
            .filter(|report| report.status.is_terminal())
            .cloned()
    }

    async fn record(&self, job_id: &JobId, provider: HardwareProvider, report: &JobReport) {
        let mut jobs = self.jobs.write().await;
        let tracked = jobs.entry(*job_id).or_insert(TrackedJob {
            provider,
            last_report: None,
        });

        if tracked.provider != provider {
            warn!(
                "Job {} was submitted to {} but reported by {}",
                job_id, tracked.provider, provider
            );
        }
        tracked.last_report = Some(report.clone());
    }
}

impl Default for HardwareGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::simulator::SimulatorBackend;
    use crate::circuit::Gate;
    use crate::job::JobStatus;

    #[tokio::test]
    async fn test_unregistered_provider() {
        let gateway = HardwareGateway::new();
        let circuit = CircuitDescription::new(1, 10).push(Gate::H { qubit: 0 });
        let config = HardwareConfig::new(HardwareProvider::Ibm, "ibm_brisbane");

        let result = gateway.submit_job(&circuit, &config).await;
        assert!(matches!(
            result,
            Err(HardwareError::ProviderNotRegistered(HardwareProvider::Ibm))
        ));
    }

    #[tokio::test]
    async fn test_clear_and_forget_jobs() {
        let mut gateway = HardwareGateway::new();
        gateway.register_backend(Box::new(SimulatorBackend::new(
            crate::backends::simulator::SimulatorConfig {
                polls_until_complete: 1,
                seed: Some(3),
                ..Default::default()
            },
        )));

        let config = HardwareConfig::simulator();
        let circuit = CircuitDescription::new(1, 10).push(Gate::H { qubit: 0 });
        let done = gateway.submit_job(&circuit, &config).await.unwrap();
        let pending = gateway.submit_job(&circuit, &config).await.unwrap();

        let report = gateway.poll_status(&done.job_id, &config).await.unwrap();
        assert_eq!(report.status, JobStatus::Completed);
        assert_eq!(gateway.job_count().await, 2);

        assert_eq!(gateway.clear_terminal_jobs().await, 1);
        assert_eq!(gateway.job_count().await, 1);
        assert!(gateway.job_provider(&done.job_id).await.is_none());

        // The backend no longer holds the cleared job either
        assert!(matches!(
            gateway.poll_status(&done.job_id, &config).await,
            Err(HardwareError::JobNotFound(_))
        ));

        assert_eq!(
            gateway.forget_job(&pending.job_id).await.unwrap(),
            HardwareProvider::Simulator
        );
        assert_eq!(gateway.job_count().await, 0);
        assert!(matches!(
            gateway.forget_job(&pending.job_id).await,
            Err(HardwareError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_backend_name_rejected() {
        let mut gateway = HardwareGateway::new();
        gateway.register_backend(Box::new(SimulatorBackend::default()));
        let circuit = CircuitDescription::new(1, 10).push(Gate::H { qubit: 0 });
        let config = HardwareConfig::new(HardwareProvider::Simulator, " ");

        let result = gateway.submit_job(&circuit, &config).await;
        assert!(matches!(result, Err(HardwareError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_terminal_report_cached() {
        let mut gateway = HardwareGateway::new();
        gateway.register_backend(Box::new(SimulatorBackend::default()));
        assert!(gateway.is_registered(HardwareProvider::Simulator));

        let config = HardwareConfig::simulator();
        let circuit = CircuitDescription::new(1, 10).push(Gate::X { qubit: 0 });
        let handle = gateway.submit_job(&circuit, &config).await.unwrap();

        let mut report = gateway.poll_status(&handle.job_id, &config).await.unwrap();
        while !report.status.is_terminal() {
            report = gateway.poll_status(&handle.job_id, &config).await.unwrap();
        }
        assert_eq!(report.status, JobStatus::Completed);
        assert_eq!(report.counts.as_ref().and_then(|c| c.get("1")), Some(&10));

        let cached = gateway.poll_status(&handle.job_id, &config).await.unwrap();
        assert_eq!(cached.counts, report.counts);

        let cancel = gateway.cancel_job(&handle.job_id, &config).await;
        assert!(matches!(cancel, Err(HardwareError::InvalidJobState { .. })));
        assert_eq!(
            gateway.job_provider(&handle.job_id).await,
            Some(HardwareProvider::Simulator)
        );
    }
}
