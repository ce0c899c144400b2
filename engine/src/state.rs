//! Structured amplitude state driven by the optimizer
//!
//! The state is a vector of 2^n complex amplitudes plus two scalar
//! trackers (global phase, entanglement). It is a classical stand-in for a
//! quantum register: the squared magnitudes act as sampling weights.

use crate::error::{EngineError, Result};
use crate::math::{magnitude_squared, Amplitude};
use nalgebra::DVector;
use rand::Rng;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Entanglement metric added per entangling pass
pub const ENTANGLEMENT_STEP: f64 = 0.1;

/// Global phase added per variational pass
pub const PHASE_STEP: f64 = 0.1;

/// Largest register the engines will allocate
pub const MAX_QUBITS: u32 = 24;

/// Floor on a feedback scale factor, so feedback never zeroes an amplitude
pub const MIN_FEEDBACK_SCALE: f64 = 1e-6;

/// Amplitude state owned by a single optimization run
#[derive(Debug, Clone)]
pub struct QuantumPortfolioState {
    num_qubits: u32,
    amplitudes: DVector<Amplitude>,
    phase: f64,
    entanglement: f64,
}

impl QuantumPortfolioState {
    /// Uniform superposition over 2^`num_qubits` basis states
    pub fn uniform(num_qubits: u32) -> Result<Self> {
        if num_qubits > MAX_QUBITS {
            return Err(EngineError::InvalidParameter(format!(
                "Register of {} qubits exceeds maximum of {}",
                num_qubits, MAX_QUBITS
            )));
        }

        let total_states = 1usize << num_qubits;
        let amplitude = Amplitude::new(1.0 / (total_states as f64).sqrt(), 0.0);

        Ok(Self {
            num_qubits,
            amplitudes: DVector::from_element(total_states, amplitude),
            phase: 0.0,
            entanglement: 0.0,
        })
    }

    /// State large enough to index `count` items: ⌈log2(count)⌉ qubits
    pub fn for_count(count: usize) -> Result<Self> {
        if count == 0 {
            return Err(EngineError::InsufficientAssets(
                "Cannot build a state over zero items".to_string(),
            ));
        }
        Self::uniform(qubits_for(count))
    }

    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    pub fn total_states(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn entanglement(&self) -> f64 {
        self.entanglement
    }

    pub fn amplitude(&self, index: usize) -> Amplitude {
        self.amplitudes[index % self.total_states()]
    }

    pub fn amplitudes(&self) -> &DVector<Amplitude> {
        &self.amplitudes
    }

    /// Squared magnitude of the amplitude at `index mod 2^n`
    pub fn probability(&self, index: usize) -> f64 {
        magnitude_squared(&self.amplitude(index))
    }

    /// Sum of squared magnitudes (1.0 for a normalized state)
    pub fn total_probability(&self) -> f64 {
        self.amplitudes.iter().map(magnitude_squared).sum()
    }

    /// Pair index `i` with `i + N/2` and mix each pair as
    /// `((a + b)/√2, (a - b)/√2)`
    pub fn apply_entangling_layer(&mut self) {
        let half = self.total_states() / 2;
        if half > 0 {
            let mut next = self.amplitudes.clone();
            for i in 0..half {
                let a = self.amplitudes[i];
                let b = self.amplitudes[i + half];
                next[i] = (a + b) * FRAC_1_SQRT_2;
                next[i + half] = (a - b) * FRAC_1_SQRT_2;
            }
            self.amplitudes = next;
        }
        self.entanglement += ENTANGLEMENT_STEP;
    }

    /// Rotate every amplitude by an independent phase `e^{-iθ}`, θ ∈ [0, 2π)
    pub fn apply_variational_layer<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for amplitude in self.amplitudes.iter_mut() {
            let theta = rng.gen_range(0.0..2.0 * PI);
            *amplitude *= Amplitude::new(theta.cos(), -theta.sin());
        }
        self.phase += PHASE_STEP;
    }

    /// Scale selected amplitudes and renormalize the register
    ///
    /// Each `(index, share)` pair scales amplitude `index` by
    /// `1 + (retention - 1)·share`, so amplitudes that carried more weight
    /// move further toward `retention`.
    pub fn apply_feedback(&mut self, retention: f64, shares: &[(usize, f64)]) -> Result<()> {
        let n = self.total_states();
        for &(index, share) in shares {
            let scale = (1.0 + (retention - 1.0) * share).max(MIN_FEEDBACK_SCALE);
            self.amplitudes[index % n] *= scale;
        }
        self.renormalize()
    }

    /// Restore the uniform superposition, keeping the phase and entanglement counters
    pub fn reset_amplitudes(&mut self) {
        let n = self.total_states();
        let amplitude = Amplitude::new(1.0 / (n as f64).sqrt(), 0.0);
        self.amplitudes.fill(amplitude);
    }

    /// Rescale to unit norm
    pub fn renormalize(&mut self) -> Result<()> {
        let norm = self.total_probability().sqrt();
        if norm <= f64::EPSILON || !norm.is_finite() {
            return Err(EngineError::InvalidState(format!(
                "Amplitude vector collapsed (norm = {})",
                norm
            )));
        }
        for amplitude in self.amplitudes.iter_mut() {
            *amplitude /= norm;
        }
        Ok(())
    }

    /// Draw a basis index with probability proportional to |amplitude|²
    pub fn sample_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let total = self.total_probability();
        let mut target = rng.gen::<f64>() * total;
        for (index, amplitude) in self.amplitudes.iter().enumerate() {
            target -= magnitude_squared(amplitude);
            if target < 0.0 {
                return index;
            }
        }
        self.total_states() - 1
    }
}

/// ⌈log2(count)⌉ for `count >= 1`
pub fn qubits_for(count: usize) -> u32 {
    if count <= 1 {
        0
    } else {
        usize::BITS - (count - 1).leading_zeros()
    }
}
