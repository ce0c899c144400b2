//! Batched portfolio tail-risk estimator
//!
//! Scenarios are generated batch by batch from a small uniform state per
//! batch. Each scenario's shocks come from a stream keyed by its global
//! index, and its probability is the batch state's probability scaled by
//! the batch's share of all scenarios, so the estimate does not depend on
//! how scenarios are partitioned into batches.

use crate::config::EstimatorConfig;
use crate::error::{EngineError, Result};
use crate::rng::{resolve_seed, stream_rng};
use crate::state::QuantumPortfolioState;
use crate::types::PortfolioWeights;
use chrono::{DateTime, Utc};
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A single simulated portfolio outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Global scenario index
    pub index: usize,

    /// Portfolio return over the horizon (negative = loss)
    pub portfolio_return: f64,

    /// Probability weight; all scenarios of an estimate sum to 1
    pub probability: f64,
}

/// Tail-risk estimate for a weight vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantumRiskEstimationResult {
    /// Return at the (1 - confidence) quantile (negative = loss)
    pub value_at_risk: f64,

    /// Probability-weighted mean return at or below the VaR quantile
    pub conditional_var: f64,

    /// Probability-weighted mean return over all scenarios
    pub expected_return: f64,

    pub confidence_level: f64,

    /// Horizon in years
    pub time_horizon: f64,

    pub scenario_count: usize,
    pub batch_size: usize,
    pub batch_count: usize,

    /// 1/√scenarios heuristic, not a rigorous error bound
    pub precision: f64,

    /// Illustrative √scenarios ratio, not a measured speedup
    pub quantum_advantage: f64,

    pub elapsed: Duration,
    pub timestamp: DateTime<Utc>,
}

/// Memory-bounded scenario generator and tail aggregator
pub struct BatchedRiskEstimator {
    config: EstimatorConfig,
}

impl BatchedRiskEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate VaR and CVaR of `weights` at `confidence_level` over
    /// `time_horizon` years
    pub fn estimate_portfolio_risk(
        &self,
        weights: &PortfolioWeights,
        confidence_level: f64,
        time_horizon: f64,
    ) -> Result<QuantumRiskEstimationResult> {
        self.config.validate()?;
        validate_inputs(weights, confidence_level, time_horizon)?;

        let started = Instant::now();
        let scenarios = self.generate_scenarios(weights, time_horizon)?;
        let (value_at_risk, conditional_var) = tail_statistics(scenarios.clone(), confidence_level)?;
        let expected_return = scenarios
            .iter()
            .map(|s| s.probability * s.portfolio_return)
            .sum();

        let scenario_count = scenarios.len();
        let elapsed = started.elapsed();

        info!(
            "Estimated risk over {} scenarios: VaR {:.4}, CVaR {:.4} at {:.1}%",
            scenario_count,
            value_at_risk,
            conditional_var,
            confidence_level * 100.0
        );

        Ok(QuantumRiskEstimationResult {
            value_at_risk,
            conditional_var,
            expected_return,
            confidence_level,
            time_horizon,
            scenario_count,
            batch_size: self.config.batch_size,
            batch_count: self.config.batch_count(),
            precision: 1.0 / (scenario_count as f64).sqrt(),
            quantum_advantage: (scenario_count as f64).sqrt(),
            elapsed,
            timestamp: Utc::now(),
        })
    }

    /// Generate all scenarios, batch by batch
    pub fn generate_scenarios(
        &self,
        weights: &PortfolioWeights,
        time_horizon: f64,
    ) -> Result<Vec<Scenario>> {
        let normalized = weights.normalized();
        let allocation: Vec<f64> = normalized.iter().map(|(_, w)| w).collect();

        let total = self.config.total_scenarios;
        let batch_size = self.config.batch_size;
        let batch_count = self.config.batch_count();
        let base_seed = resolve_seed(self.config.seed);

        let drift = self.config.annual_drift * time_horizon;
        let diffusion = self.config.annual_volatility * time_horizon.sqrt();

        debug!(
            "Generating {} scenarios in {} batches of {} across {} assets",
            total,
            batch_count,
            batch_size,
            allocation.len()
        );

        let batches = (0..batch_count)
            .into_par_iter()
            .map(|batch| -> Result<Vec<Scenario>> {
                let start = batch * batch_size;
                let len = batch_size.min(total - start);
                let state = QuantumPortfolioState::for_count(len)?;

                let batch_mass: f64 = (0..len).map(|j| state.probability(j)).sum();
                let share = len as f64 / total as f64;

                let scenarios = (0..len)
                    .map(|j| {
                        let index = start + j;
                        let mut rng = stream_rng(base_seed, index as u64);
                        let portfolio_return = allocation
                            .iter()
                            .map(|w| {
                                let z: f64 = StandardNormal.sample(&mut rng);
                                w * (drift + diffusion * z)
                            })
                            .sum();

                        Scenario {
                            index,
                            portfolio_return,
                            probability: state.probability(j) / batch_mass * share,
                        }
                    })
                    .collect::<Vec<_>>();

                Ok(scenarios)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(batches.into_iter().flatten().collect())
    }
}

/// VaR and probability-weighted CVaR from unsorted scenarios
///
/// Scenarios are sorted by return ascending; VaR is the return at index
/// `floor((1 - confidence)·n)` and CVaR the weighted mean of entries up to
/// and including that index.
pub fn tail_statistics(mut scenarios: Vec<Scenario>, confidence_level: f64) -> Result<(f64, f64)> {
    if scenarios.is_empty() {
        return Err(EngineError::InvalidParameter(
            "No scenarios to aggregate".to_string(),
        ));
    }

    scenarios.sort_by(|a, b| {
        a.portfolio_return
            .total_cmp(&b.portfolio_return)
            .then(a.index.cmp(&b.index))
    });

    let n = scenarios.len();
    let var_index = (((1.0 - confidence_level) * n as f64).floor() as usize).min(n - 1);
    let value_at_risk = scenarios[var_index].portfolio_return;

    let tail = &scenarios[..=var_index];
    let tail_mass: f64 = tail.iter().map(|s| s.probability).sum();
    let conditional_var = if tail_mass > 0.0 {
        tail.iter()
            .map(|s| s.probability * s.portfolio_return)
            .sum::<f64>()
            / tail_mass
    } else {
        value_at_risk
    };

    Ok((value_at_risk, conditional_var))
}

fn validate_inputs(
    weights: &PortfolioWeights,
    confidence_level: f64,
    time_horizon: f64,
) -> Result<()> {
    if confidence_level <= 0.0 || confidence_level >= 1.0 || confidence_level.is_nan() {
        return Err(EngineError::InvalidConfidenceLevel(confidence_level));
    }

    if time_horizon <= 0.0 || !time_horizon.is_finite() {
        return Err(EngineError::InvalidParameter(format!(
            "Time horizon must be positive, got {}",
            time_horizon
        )));
    }

    if weights.is_empty() || weights.total() <= 0.0 {
        return Err(EngineError::InvalidParameter(
            "Weights must be non-empty with a positive total".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn estimator(batch_size: usize, seed: u64) -> BatchedRiskEstimator {
        BatchedRiskEstimator::new(EstimatorConfig {
            batch_size,
            seed: Some(seed),
            ..Default::default()
        })
    }

    fn balanced() -> PortfolioWeights {
        PortfolioWeights::from_pairs([("AAPL", 0.4), ("MSFT", 0.35), ("TLT", 0.25)])
    }

    #[test]
    fn test_default_plan() {
        let result = estimator(256, 42)
            .estimate_portfolio_risk(&balanced(), 0.95, 1.0)
            .unwrap();

        assert_eq!(result.scenario_count, 1024);
        assert_eq!(result.batch_count, 4);
        assert_abs_diff_eq!(result.precision, 1.0 / 32.0, epsilon = 1e-12);
        assert!(result.value_at_risk < 0.0);
        assert!(result.conditional_var <= result.value_at_risk);
    }

    #[test]
    fn test_partition_invariance() {
        let weights = balanced();
        let four = estimator(256, 7).estimate_portfolio_risk(&weights, 0.95, 1.0).unwrap();
        let eight = estimator(128, 7).estimate_portfolio_risk(&weights, 0.95, 1.0).unwrap();
        let uneven = estimator(300, 7).estimate_portfolio_risk(&weights, 0.95, 1.0).unwrap();

        assert_eq!(eight.batch_count, 8);
        assert_eq!(uneven.batch_count, 4);
        for other in [&eight, &uneven] {
            assert_abs_diff_eq!(four.value_at_risk, other.value_at_risk, epsilon = 1e-12);
            assert_abs_diff_eq!(four.conditional_var, other.conditional_var, epsilon = 1e-12);
            assert_abs_diff_eq!(four.expected_return, other.expected_return, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let scenarios = estimator(300, 3).generate_scenarios(&balanced(), 1.0).unwrap();

        assert_eq!(scenarios.len(), 1024);
        let total: f64 = scenarios.iter().map(|s| s.probability).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_asset_matches_normal_quantile() {
        let weights = PortfolioWeights::from_pairs([("SPY", 1.0)]);
        let result = estimator(256, 11).estimate_portfolio_risk(&weights, 0.95, 1.0).unwrap();

        // -2% drift, 30% volatility: 5% quantile near -0.02 - 1.645 * 0.30
        assert!((result.value_at_risk - (-0.5135)).abs() < 0.1);
        assert!((result.expected_return - (-0.02)).abs() < 0.05);
    }

    #[test]
    fn test_tail_grows_with_confidence_and_horizon() {
        let weights = PortfolioWeights::from_pairs([("SPY", 1.0)]);
        let engine = estimator(256, 5);

        let base = engine.estimate_portfolio_risk(&weights, 0.95, 1.0).unwrap();
        let strict = engine.estimate_portfolio_risk(&weights, 0.99, 1.0).unwrap();
        let short = engine.estimate_portfolio_risk(&weights, 0.95, 0.25).unwrap();

        assert!(strict.value_at_risk <= base.value_at_risk);
        assert!(short.value_at_risk > base.value_at_risk);
    }

    #[test]
    fn test_tail_statistics_weighting() {
        let scenarios = vec![
            Scenario { index: 0, portfolio_return: 0.10, probability: 0.25 },
            Scenario { index: 1, portfolio_return: -0.30, probability: 0.25 },
            Scenario { index: 2, portfolio_return: -0.10, probability: 0.25 },
            Scenario { index: 3, portfolio_return: 0.05, probability: 0.25 },
        ];

        // floor(0.5 * 4) = 2 -> sorted [-0.30, -0.10, 0.05, 0.10]
        let (var, cvar) = tail_statistics(scenarios, 0.5).unwrap();
        assert_abs_diff_eq!(var, 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(cvar, (-0.30 - 0.10 + 0.05) / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_inputs() {
        let engine = estimator(256, 1);

        assert!(matches!(
            engine.estimate_portfolio_risk(&balanced(), 1.5, 1.0),
            Err(EngineError::InvalidConfidenceLevel(_))
        ));
        assert!(engine.estimate_portfolio_risk(&balanced(), 0.95, 0.0).is_err());
        assert!(engine
            .estimate_portfolio_risk(&PortfolioWeights::new(), 0.95, 1.0)
            .is_err());
        assert!(tail_statistics(Vec::new(), 0.95).is_err());
    }
}
