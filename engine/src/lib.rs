//! # qf-engine: Portfolio Optimization and Risk Simulation
//!
//! This library searches for portfolio allocations with a variational loop
//! over a structured complex-valued state, and prices options and tail
//! risk with batched, memory-bounded simulation.
//!
//! ## Core Components
//!
//! - **PortfolioOptimizer**: fixed-budget variational search for the best
//!   feasible allocation (max Sharpe, or min volatility for a target return)
//! - **compute_risk_metrics**: closed-form return, volatility, Sharpe, VaR,
//!   CVaR and drawdown proxy for any weight vector
//! - **BatchedOptionPricer**: European option pricing with streaming payoff
//!   moments and analytical Greeks
//! - **BatchedRiskEstimator**: scenario-based VaR/CVaR, invariant to batch
//!   partitioning
//!
//! The "quantum advantage" figures reported by the engines are illustrative
//! metadata derived from fixed formulas, not measured speedups.
//!
//! ## Example Usage
//!
//! ```rust
//! use qf_engine::{Asset, EngineConfig, MarketConstraints, QuantumFinanceEngine};
//!
//! let assets = vec![
//!     Asset::new("AAPL", "Apple", 0.12, 0.25, 180.0).unwrap(),
//!     Asset::new("MSFT", "Microsoft", 0.10, 0.20, 410.0).unwrap(),
//! ];
//! let constraints = MarketConstraints::default();
//!
//! let engine = QuantumFinanceEngine::new(EngineConfig::default().with_seed(42));
//! let result = engine.optimizer().optimize(&assets, &constraints, None).unwrap();
//!
//! assert_eq!(result.iterations, 100);
//! assert!((result.optimal_weights.total() - 1.0).abs() < 1e-9);
//! ```

pub mod config;
pub mod error;
pub mod estimator;
pub mod math;
pub mod metrics;
pub mod optimizer;
pub mod pricer;
pub mod rng;
pub mod state;
pub mod types;

pub use config::{EngineConfig, EstimatorConfig, OptimizerConfig, PricerConfig};
pub use error::{EngineError, Result};
pub use estimator::{BatchedRiskEstimator, QuantumRiskEstimationResult, Scenario};
pub use metrics::compute_risk_metrics;
pub use optimizer::{Objective, PortfolioOptimizer, QuantumOptimizationResult};
pub use pricer::{
    black_scholes_price, calculate_analytical_delta, BatchedOptionPricer, EuropeanOption, Greeks,
    MarketInputs, OptionPriceResult, OptionType,
};
pub use state::QuantumPortfolioState;
pub use types::{Asset, MarketConstraints, PortfolioWeights, RiskMetrics};

/// One optimizer, pricer and estimator built from a shared configuration
///
/// Each caller constructs its own instance; there is no shared global engine.
pub struct QuantumFinanceEngine {
    optimizer: PortfolioOptimizer,
    pricer: BatchedOptionPricer,
    estimator: BatchedRiskEstimator,
}

impl QuantumFinanceEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            optimizer: PortfolioOptimizer::new(config.optimizer),
            pricer: BatchedOptionPricer::new(config.pricer),
            estimator: BatchedRiskEstimator::new(config.estimator),
        }
    }

    /// Build from a YAML configuration document
    ///
    /// # Example
    ///
    /// ```
    /// use qf_engine::QuantumFinanceEngine;
    ///
    /// let yaml = r#"
    /// optimizer:
    ///   iterations: 50
    ///   seed: 7
    /// "#;
    ///
    /// let engine = QuantumFinanceEngine::from_yaml(yaml).unwrap();
    /// assert_eq!(engine.optimizer().config().iterations, 50);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(Self::new(EngineConfig::from_yaml(yaml)?))
    }

    pub fn optimizer(&self) -> &PortfolioOptimizer {
        &self.optimizer
    }

    pub fn pricer(&self) -> &BatchedOptionPricer {
        &self.pricer
    }

    pub fn estimator(&self) -> &BatchedRiskEstimator {
        &self.estimator
    }

    /// Optimize, then estimate the tail risk of the chosen allocation
    pub fn optimize_and_estimate(
        &self,
        assets: &[Asset],
        constraints: &MarketConstraints,
        target_return: Option<f64>,
        confidence_level: f64,
        time_horizon: f64,
    ) -> Result<(QuantumOptimizationResult, QuantumRiskEstimationResult)> {
        let optimization = self.optimizer.optimize(assets, constraints, target_return)?;
        let risk = self.estimator.estimate_portfolio_risk(
            &optimization.optimal_weights,
            confidence_level,
            time_horizon,
        )?;
        Ok((optimization, risk))
    }
}
