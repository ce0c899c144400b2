//! # qf-hardware: Job gateway for quantum hardware providers
//!
//! Routes circuits produced alongside the `qf-engine` optimizers to a
//! provider backend, then tracks the submitted jobs until they finish.
//!
//! ## Core Components
//!
//! - **HardwareGateway**: Registry of backends keyed by provider
//! - **QuantumBackend**: Trait each provider integration implements
//! - **SimulatorBackend**: In-process state-vector simulator
//! - **CircuitDescription**: Provider-neutral gate list with a shot count
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use qf_hardware::{CircuitDescription, HardwareConfig, HardwareGateway, SimulatorBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut gateway = HardwareGateway::new();
//!     gateway.register_backend(Box::new(SimulatorBackend::default()));
//!
//!     let circuit = CircuitDescription::variational_ansatz(3, 2, 1024, 42);
//!     let config = HardwareConfig::simulator();
//!
//!     match gateway.submit_job(&circuit, &config).await {
//!         Ok(handle) => println!("Job queued: {}", handle.job_id),
//!         Err(e) => eprintln!("Submission failed: {}", e),
//!     }
//! }
//! ```

// Public modules
pub mod circuit;
pub mod error;
pub mod job;

// Backend implementations
pub mod backends {
    pub mod backend;
    pub mod simulator;

    pub use backend::QuantumBackend;
    pub use simulator::{SimulatorBackend, SimulatorConfig};
}

mod gateway;

// Re-export main types
pub use backends::{QuantumBackend, SimulatorBackend, SimulatorConfig};
pub use circuit::{CircuitDescription, Gate};
pub use error::{HardwareError, HardwareResult};
pub use gateway::HardwareGateway;
pub use job::{HardwareConfig, HardwareProvider, JobHandle, JobId, JobReport, JobStatus};

// Initialize tracing
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();
}
