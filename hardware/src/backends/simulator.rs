//! In-process state-vector simulator
//!
//! Jobs live in an in-memory table and advance one step per poll:
//! Queued, then Running, then Completed once `polls_until_complete` polls
//! have been observed. The circuit runs when the job completes.

use async_trait::async_trait;
use chrono::Utc;
use qf_engine::math::{magnitude_squared, Amplitude};
use qf_engine::rng::{resolve_seed, stream_rng};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::f64::consts::FRAC_1_SQRT_2;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::backend::QuantumBackend;
use crate::circuit::{CircuitDescription, Gate};
use crate::error::{HardwareError, HardwareResult};
use crate::job::{HardwareConfig, HardwareProvider, JobHandle, JobId, JobReport, JobStatus};

/// Simulator settings
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Polls before a job completes
    pub polls_until_complete: u32,

    /// Base seed for measurement sampling; random when absent
    pub seed: Option<u64>,

    /// Largest register the simulator will execute
    pub max_qubits: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            polls_until_complete: 2,
            seed: None,
            max_qubits: 16,
        }
    }
}

#[derive(Debug)]
struct SimulatedJob {
    circuit: CircuitDescription,
    shots: u32,
    sequence: u64,
    polls: u32,
    status: JobStatus,
    counts: Option<BTreeMap<String, u64>>,
    execution_time: Option<Duration>,
    message: Option<String>,
}

impl SimulatedJob {
    fn report(&self, job_id: JobId) -> JobReport {
        JobReport {
            job_id,
            status: self.status,
            counts: self.counts.clone(),
            execution_time: self.execution_time,
            message: self.message.clone(),
        }
    }
}

/// Local simulator backend
pub struct SimulatorBackend {
    config: SimulatorConfig,
    seed: u64,
    next_sequence: u64,
    jobs: HashMap<JobId, SimulatedJob>,
}

impl SimulatorBackend {
    pub fn new(config: SimulatorConfig) -> Self {
        let seed = resolve_seed(config.seed);
        Self {
            config,
            seed,
            next_sequence: 0,
            jobs: HashMap::new(),
        }
    }

    /// Number of jobs held in the table
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Remove a job from the table, returning its last report
    pub fn remove_job(&mut self, job_id: &JobId) -> HardwareResult<JobReport> {
        self.jobs
            .remove(job_id)
            .map(|job| job.report(*job_id))
            .ok_or(HardwareError::JobNotFound(*job_id))
    }

    /// Drop every completed, failed or cancelled job
    pub fn clear_terminal(&mut self) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, job| !job.status.is_terminal());
        before - self.jobs.len()
    }

    fn execute(&self, job: &mut SimulatedJob) {
        if job.circuit.num_qubits > self.config.max_qubits {
            warn!(
                "Circuit with {} qubits exceeds simulator limit of {}",
                job.circuit.num_qubits, self.config.max_qubits
            );
            job.status = JobStatus::Failed;
            job.message = Some(format!(
                "Circuit uses {} qubits; simulator supports at most {}",
                job.circuit.num_qubits, self.config.max_qubits
            ));
            return;
        }

        let started = Instant::now();
        let state = match run_circuit(&job.circuit) {
            Ok(state) => state,
            Err(err) => {
                warn!("Simulation failed: {}", err);
                job.status = JobStatus::Failed;
                job.message = Some(err.to_string());
                return;
            }
        };
        let counts = sample_counts(&state, job.circuit.num_qubits, job.shots, self.seed, job.sequence);

        job.counts = Some(counts);
        job.execution_time = Some(started.elapsed());
        job.status = JobStatus::Completed;
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

#[async_trait]
impl QuantumBackend for SimulatorBackend {
    fn provider(&self) -> HardwareProvider {
        HardwareProvider::Simulator
    }

    async fn submit_job(
        &mut self,
        circuit: &CircuitDescription,
        config: &HardwareConfig,
    ) -> HardwareResult<JobHandle> {
        circuit.validate()?;

        let shots = config.shots_override.unwrap_or(circuit.shots);
        if shots == 0 {
            return Err(HardwareError::InvalidCircuit(
                "Shot override must be positive".to_string(),
            ));
        }

        let job_id = JobId::new();
        let submitted_at = Utc::now();
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.jobs.insert(
            job_id,
            SimulatedJob {
                circuit: circuit.clone(),
                shots,
                sequence,
                polls: 0,
                status: JobStatus::Queued,
                counts: None,
                execution_time: None,
                message: None,
            },
        );

        info!(
            "Simulator accepted job {} ({} qubits, {} gates, {} shots) on {}",
            job_id,
            circuit.num_qubits,
            circuit.gates.len(),
            shots,
            config.backend_name
        );

        Ok(JobHandle {
            job_id,
            status: JobStatus::Queued,
            provider: HardwareProvider::Simulator,
            submitted_at,
        })
    }

    async fn poll_status(
        &mut self,
        job_id: &JobId,
        _config: &HardwareConfig,
    ) -> HardwareResult<JobReport> {
        let mut job = self
            .jobs
            .remove(job_id)
            .ok_or(HardwareError::JobNotFound(*job_id))?;

        if !job.status.is_terminal() {
            job.polls += 1;
            if job.polls >= self.config.polls_until_complete {
                self.execute(&mut job);
            } else {
                job.status = JobStatus::Running;
            }
            debug!("Job {} is {} after {} polls", job_id, job.status, job.polls);
        }

        let report = job.report(*job_id);
        self.jobs.insert(*job_id, job);
        Ok(report)
    }

    async fn cancel_job(&mut self, job_id: &JobId) -> HardwareResult<JobReport> {
        let job = self
            .jobs
            .get_mut(job_id)
            .ok_or(HardwareError::JobNotFound(*job_id))?;

        if job.status.is_terminal() {
            return Err(HardwareError::InvalidJobState {
                job_id: *job_id,
                status: job.status,
                operation: "cancelled".to_string(),
            });
        }

        job.status = JobStatus::Cancelled;
        job.message = Some("Cancelled by caller".to_string());
        info!("Simulator cancelled job {}", job_id);

        Ok(job.report(*job_id))
    }

    async fn forget_job(&mut self, job_id: &JobId) -> HardwareResult<()> {
        self.remove_job(job_id).map(|_| ())
    }

    async fn clear_terminal_jobs(&mut self) -> usize {
        let cleared = self.clear_terminal();
        debug!("Simulator cleared {} terminal jobs", cleared);
        cleared
    }
}

/// Run a circuit from |0...0> and return the final state vector
///
/// Qubit `q` is bit `q` of the basis index.
pub fn run_circuit(circuit: &CircuitDescription) -> HardwareResult<Vec<Amplitude>> {
    circuit.validate()?;

    let dimension = 1usize << circuit.num_qubits;
    let mut state = vec![Amplitude::new(0.0, 0.0); dimension];
    state[0] = Amplitude::new(1.0, 0.0);

    for gate in &circuit.gates {
        apply_gate(&mut state, gate);
    }

    Ok(state)
}

fn apply_gate(state: &mut [Amplitude], gate: &Gate) {
    match *gate {
        Gate::H { qubit } => {
            let mask = 1usize << qubit;
            for index in 0..state.len() {
                if index & mask == 0 {
                    let zero = state[index];
                    let one = state[index | mask];
                    state[index] = (zero + one) * FRAC_1_SQRT_2;
                    state[index | mask] = (zero - one) * FRAC_1_SQRT_2;
                }
            }
        }
        Gate::X { qubit } => {
            let mask = 1usize << qubit;
            for index in 0..state.len() {
                if index & mask == 0 {
                    state.swap(index, index | mask);
                }
            }
        }
        Gate::Z { qubit } => {
            let mask = 1usize << qubit;
            for (index, amplitude) in state.iter_mut().enumerate() {
                if index & mask != 0 {
                    *amplitude = -*amplitude;
                }
            }
        }
        Gate::Rz { qubit, theta } => {
            let mask = 1usize << qubit;
            let half = theta / 2.0;
            let minus = Amplitude::new(half.cos(), -half.sin());
            let plus = Amplitude::new(half.cos(), half.sin());
            for (index, amplitude) in state.iter_mut().enumerate() {
                *amplitude *= if index & mask == 0 { minus } else { plus };
            }
        }
        Gate::Cnot { control, target } => {
            let control_mask = 1usize << control;
            let target_mask = 1usize << target;
            for index in 0..state.len() {
                if index & control_mask != 0 && index & target_mask == 0 {
                    state.swap(index, index | target_mask);
                }
            }
        }
    }
}

/// Sample `shots` measurements and count them by bitstring
///
/// Bitstrings are written with qubit 0 as the rightmost character.
pub fn sample_counts(
    state: &[Amplitude],
    num_qubits: u32,
    shots: u32,
    seed: u64,
    stream: u64,
) -> BTreeMap<String, u64> {
    let mut cumulative = Vec::with_capacity(state.len());
    let mut running = 0.0;
    for amplitude in state {
        running += magnitude_squared(amplitude);
        cumulative.push(running);
    }

    let mut rng = stream_rng(seed, stream);
    let mut counts = BTreeMap::new();
    let last = state.len().saturating_sub(1);

    for _ in 0..shots {
        let draw = rng.gen::<f64>() * running;
        let index = cumulative.partition_point(|c| *c <= draw).min(last);
        let key = format!("{:0width$b}", index, width = num_qubits as usize);
        *counts.entry(key).or_insert(0) += 1;
    }

    counts
}
