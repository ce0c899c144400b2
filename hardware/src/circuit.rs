//! Circuit descriptions submitted to hardware providers

use qf_engine::rng::stream_rng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{HardwareError, HardwareResult};

/// Largest register any provider accepts through this gateway
pub const MAX_CIRCUIT_QUBITS: u32 = 16;

/// Single gate in a circuit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gate", rename_all = "lowercase")]
pub enum Gate {
    /// Hadamard
    H { qubit: u32 },
    /// Pauli-X
    X { qubit: u32 },
    /// Pauli-Z
    Z { qubit: u32 },
    /// Rotation about Z by `theta` radians
    Rz { qubit: u32, theta: f64 },
    /// Controlled NOT
    Cnot { control: u32, target: u32 },
}

impl Gate {
    fn qubits(&self) -> Vec<u32> {
        match *self {
            Gate::H { qubit } | Gate::X { qubit } | Gate::Z { qubit } | Gate::Rz { qubit, .. } => {
                vec![qubit]
            }
            Gate::Cnot { control, target } => vec![control, target],
        }
    }
}

/// Provider-neutral circuit: gates in order, measured in the computational basis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitDescription {
    pub num_qubits: u32,
    pub gates: Vec<Gate>,
    pub shots: u32,
}

impl CircuitDescription {
    pub fn new(num_qubits: u32, shots: u32) -> Self {
        Self {
            num_qubits,
            gates: Vec::new(),
            shots,
        }
    }

    /// Append a gate
    pub fn push(mut self, gate: Gate) -> Self {
        self.gates.push(gate);
        self
    }

    /// Hadamard on every qubit, then `layers` rounds of a CNOT chain
    /// followed by seeded Z rotations
    ///
    /// This mirrors the optimizer's entangling and variational passes so the
    /// same ansatz can be sent to a provider.
    pub fn variational_ansatz(num_qubits: u32, layers: usize, shots: u32, seed: u64) -> Self {
        let mut circuit = Self::new(num_qubits, shots);
        for qubit in 0..num_qubits {
            circuit.gates.push(Gate::H { qubit });
        }

        for layer in 0..layers {
            for control in 0..num_qubits.saturating_sub(1) {
                circuit.gates.push(Gate::Cnot {
                    control,
                    target: control + 1,
                });
            }

            let mut rng = stream_rng(seed, layer as u64);
            for qubit in 0..num_qubits {
                circuit.gates.push(Gate::Rz {
                    qubit,
                    theta: rng.gen_range(0.0..2.0 * PI),
                });
            }
        }

        circuit
    }

    /// Validate register size, shot count and gate operands
    pub fn validate(&self) -> HardwareResult<()> {
        if self.num_qubits == 0 || self.num_qubits > MAX_CIRCUIT_QUBITS {
            return Err(HardwareError::InvalidCircuit(format!(
                "Circuit must use 1..={} qubits, got {}",
                MAX_CIRCUIT_QUBITS, self.num_qubits
            )));
        }

        if self.shots == 0 {
            return Err(HardwareError::InvalidCircuit(
                "Shot count must be positive".to_string(),
            ));
        }

        for (position, gate) in self.gates.iter().enumerate() {
            if let Some(qubit) = gate.qubits().into_iter().find(|q| *q >= self.num_qubits) {
                return Err(HardwareError::InvalidCircuit(format!(
                    "Gate {} ({:?}) addresses qubit {} outside a {}-qubit register",
                    position, gate, qubit, self.num_qubits
                )));
            }

            if let Gate::Cnot { control, target } = gate {
                if control == target {
                    return Err(HardwareError::InvalidCircuit(format!(
                        "Gate {}: CNOT control and target are both qubit {}",
                        position, control
                    )));
                }
            }

            if let Gate::Rz { theta, .. } = gate {
                if !theta.is_finite() {
                    return Err(HardwareError::InvalidCircuit(format!(
                        "Gate {}: rotation angle must be finite",
                        position
                    )));
                }
            }
        }

        Ok(())
    }
}
