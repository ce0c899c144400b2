//! Submit a variational ansatz to the local simulator and poll it to completion

use qf_hardware::{
    init_tracing, CircuitDescription, HardwareConfig, HardwareGateway, HardwareResult,
    SimulatorBackend, SimulatorConfig,
};
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> HardwareResult<()> {
    init_tracing();

    let mut gateway = HardwareGateway::new();
    gateway.register_backend(Box::new(SimulatorBackend::new(SimulatorConfig {
        polls_until_complete: 3,
        seed: Some(42),
        ..Default::default()
    })));

    // Four assets need two qubits; extra qubits give the ansatz room to entangle
    let circuit = CircuitDescription::variational_ansatz(4, 3, 4096, 42);
    let config = HardwareConfig::simulator();

    let handle = gateway.submit_job(&circuit, &config).await?;
    info!("Submitted job {} ({})", handle.job_id, handle.status);

    let report = loop {
        let report = gateway.poll_status(&handle.job_id, &config).await?;
        info!("Job {} is {}", report.job_id, report.status);
        if report.status.is_terminal() {
            break report;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    };

    if let Some(counts) = &report.counts {
        let mut ranked: Vec<_> = counts.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1));

        println!("Top outcomes of {} shots:", report.total_shots());
        for (bitstring, count) in ranked.into_iter().take(5) {
            println!("  {}  {}", bitstring, count);
        }
    }

    Ok(())
}
