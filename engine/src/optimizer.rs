//! Variational portfolio optimizer
//!
//! Each iteration evolves the amplitude state (entangling pass, then a
//! variational phase pass), measures a candidate allocation from the
//! squared magnitudes, filters it against the constraints, scores it and
//! feeds the score back into the amplitudes. The loop always runs the full
//! iteration budget and keeps the best feasible candidate seen.

use crate::config::OptimizerConfig;
use crate::error::{EngineError, Result};
use crate::metrics::compute_risk_metrics;
use crate::rng::{resolve_seed, stream_rng};
use crate::state::QuantumPortfolioState;
use crate::types::{validate_universe, Asset, MarketConstraints, PortfolioWeights, RiskMetrics};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Smallest universe that forms a meaningful state space
pub const MIN_ASSETS: usize = 2;

/// Cap on the classical search-space size used by the advantage figure
const MAX_CLASSICAL_EXPONENT: usize = 20;

/// Lower bound on the feedback retention factor
const MIN_RETENTION: f64 = 1e-3;

/// What the optimizer is minimizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Objective {
    /// Minimize -Sharpe
    MaximizeSharpe,
    /// Minimize volatility subject to a return floor
    MinimizeVolatility { target_return: f64 },
}

impl Objective {
    fn from_target(target_return: Option<f64>) -> Self {
        match target_return {
            Some(target_return) => Objective::MinimizeVolatility { target_return },
            None => Objective::MaximizeSharpe,
        }
    }

    /// Score a candidate; `None` when the score is undefined
    fn score(&self, metrics: &RiskMetrics) -> Option<f64> {
        match self {
            Objective::MaximizeSharpe => metrics.sharpe_ratio.map(|s| -s),
            Objective::MinimizeVolatility { .. } => Some(metrics.volatility),
        }
    }

    fn return_floor(&self, constraints: &MarketConstraints) -> f64 {
        match self {
            Objective::MaximizeSharpe => constraints.min_return,
            Objective::MinimizeVolatility { target_return } => *target_return,
        }
    }
}

/// Outcome of one optimization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantumOptimizationResult {
    /// Best feasible allocation (sums to 1)
    pub optimal_weights: PortfolioWeights,

    pub risk_metrics: RiskMetrics,

    /// Objective value of the best candidate
    pub objective_value: f64,

    pub objective: Objective,

    /// Illustrative classical-vs-iteration ratio, not a measured speedup
    pub quantum_advantage: f64,

    pub elapsed: Duration,

    /// Iterations executed (always the full budget)
    pub iterations: usize,

    /// Iterations whose candidate passed the feasibility filter
    pub feasible_candidates: usize,

    /// Entanglement metric of the state at the end of the run
    pub final_entanglement: f64,

    pub timestamp: DateTime<Utc>,
}

/// Best candidate tracked across iterations
struct Incumbent {
    weights: PortfolioWeights,
    metrics: RiskMetrics,
    objective: f64,
}

/// Variational search over allocations
pub struct PortfolioOptimizer {
    config: OptimizerConfig,
}

impl PortfolioOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Search for the allocation that best meets `constraints`
    ///
    /// With `target_return` the volatility is minimized subject to
    /// return >= target; otherwise the Sharpe ratio is maximized subject to
    /// return >= `constraints.min_return`.
    pub fn optimize(
        &self,
        assets: &[Asset],
        constraints: &MarketConstraints,
        target_return: Option<f64>,
    ) -> Result<QuantumOptimizationResult> {
        self.validate_inputs(assets, constraints, target_return)?;

        let started = Instant::now();
        let objective = Objective::from_target(target_return);
        let mut state = QuantumPortfolioState::for_count(assets.len())?;
        let mut rng = stream_rng(resolve_seed(self.config.seed), 0);

        info!(
            "Optimizing {} assets over {} basis states ({:?})",
            assets.len(),
            state.total_states(),
            objective
        );

        let mut incumbent: Option<Incumbent> = None;
        let mut feasible_candidates = 0;

        for iteration in 0..self.config.iterations {
            state.apply_entangling_layer();
            state.apply_variational_layer(&mut rng);

            let candidate = self.measure(&state, assets, &mut rng);
            if candidate.total() <= 0.0 {
                debug!("Iteration {}: degenerate measurement", iteration);
                continue;
            }
            let candidate = candidate.normalized();

            let metrics = compute_risk_metrics(assets, &candidate, constraints.risk_free_rate);
            if !Self::is_feasible(&candidate, &metrics, constraints, &objective) {
                debug!(
                    "Iteration {}: rejected (return {:.4}, volatility {:.4})",
                    iteration, metrics.expected_return, metrics.volatility
                );
                continue;
            }

            let Some(score) = objective.score(&metrics) else {
                debug!("Iteration {}: Sharpe ratio undefined at zero volatility", iteration);
                continue;
            };
            feasible_candidates += 1;

            if incumbent.as_ref().map_or(true, |best| score < best.objective) {
                debug!("Iteration {}: new best objective {:.6}", iteration, score);
                incumbent = Some(Incumbent {
                    weights: candidate.clone(),
                    metrics,
                    objective: score,
                });
            }

            let retention = (1.0 - score * self.config.learning_rate).max(MIN_RETENTION);
            let shares: Vec<(usize, f64)> = assets
                .iter()
                .enumerate()
                .map(|(i, asset)| (i, candidate.get(&asset.symbol)))
                .collect();
            if let Err(err) = state.apply_feedback(retention, &shares) {
                warn!("Iteration {}: {}; restarting from uniform superposition", iteration, err);
                state.reset_amplitudes();
            }
        }

        let Some(best) = incumbent else {
            warn!(
                "No feasible portfolio after {} iterations",
                self.config.iterations
            );
            return Err(EngineError::OptimizationFailed(
                "no valid portfolio found".to_string(),
            ));
        };

        let elapsed = started.elapsed();
        info!(
            "Optimization finished in {:?}: objective {:.6}, {} feasible candidates",
            elapsed, best.objective, feasible_candidates
        );

        Ok(QuantumOptimizationResult {
            optimal_weights: best.weights,
            risk_metrics: best.metrics,
            objective_value: best.objective,
            objective,
            quantum_advantage: quantum_advantage(assets.len(), self.config.iterations),
            elapsed,
            iterations: self.config.iterations,
            feasible_candidates,
            final_entanglement: state.entanglement(),
            timestamp: Utc::now(),
        })
    }

    /// Candidate weights from squared magnitudes times a random multiplier
    fn measure<R: Rng + ?Sized>(
        &self,
        state: &QuantumPortfolioState,
        assets: &[Asset],
        rng: &mut R,
    ) -> PortfolioWeights {
        let [low, high] = self.config.weight_multiplier_range;
        PortfolioWeights::from_pairs(assets.iter().enumerate().map(|(i, asset)| {
            let multiplier = rng.gen_range(low..=high);
            (asset.symbol.clone(), state.probability(i) * multiplier)
        }))
    }

    fn is_feasible(
        weights: &PortfolioWeights,
        metrics: &RiskMetrics,
        constraints: &MarketConstraints,
        objective: &Objective,
    ) -> bool {
        weights.within_bounds(
            constraints.min_weight_per_asset,
            constraints.max_weight_per_asset,
        ) && metrics.volatility <= constraints.max_volatility
            && metrics.expected_return >= objective.return_floor(constraints)
    }

    fn validate_inputs(
        &self,
        assets: &[Asset],
        constraints: &MarketConstraints,
        target_return: Option<f64>,
    ) -> Result<()> {
        self.config.validate()?;

        if assets.len() < MIN_ASSETS {
            return Err(EngineError::InsufficientAssets(format!(
                "Need at least {} assets, got {}",
                MIN_ASSETS,
                assets.len()
            )));
        }

        validate_universe(assets)?;
        constraints.validate()?;

        if let Some(target) = target_return {
            if !target.is_finite() {
                return Err(EngineError::InvalidParameter(format!(
                    "Target return must be finite, got {}",
                    target
                )));
            }
        }

        Ok(())
    }
}

/// `min(2^n, 2^20) / (n · iterations)`
///
/// Illustrative metadata only; it is not a measured complexity ratio.
pub fn quantum_advantage(asset_count: usize, iterations: usize) -> f64 {
    if asset_count == 0 || iterations == 0 {
        return 0.0;
    }
    let classical = 2f64.powi(asset_count.min(MAX_CLASSICAL_EXPONENT) as i32);
    classical / (asset_count as f64 * iterations as f64)
}
