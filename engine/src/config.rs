//! Engine configuration
//!
//! All sections deserialize with defaults, so a YAML document only needs
//! the keys it overrides:
//!
//! ```yaml
//! optimizer:
//!   iterations: 100
//!   seed: 42
//! estimator:
//!   batch_size: 128
//! ```

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for all engines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub optimizer: OptimizerConfig,
    pub pricer: PricerConfig,
    pub estimator: EstimatorConfig,
}

impl EngineConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML configuration file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Apply one seed to every engine
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.optimizer.seed = Some(seed);
        self.pricer.seed = Some(seed);
        self.estimator.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.optimizer.validate()?;
        self.pricer.validate()?;
        self.estimator.validate()
    }
}

/// Variational search loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Fixed iteration budget (no early exit)
    pub iterations: usize,

    /// Scales the objective in the amplitude feedback step
    pub learning_rate: f64,

    /// Range of the random multiplier applied to each measured weight
    pub weight_multiplier_range: [f64; 2],

    /// Random seed for reproducible runs (None = random)
    pub seed: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            learning_rate: 0.01,
            weight_multiplier_range: [0.5, 2.0],
            seed: None,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(EngineError::InvalidParameter(
                "Optimizer iterations must be positive".to_string(),
            ));
        }

        if self.learning_rate < 0.0 || !self.learning_rate.is_finite() {
            return Err(EngineError::InvalidParameter(format!(
                "Learning rate must be a non-negative number, got {}",
                self.learning_rate
            )));
        }

        let [low, high] = self.weight_multiplier_range;
        if low <= 0.0 || high <= low {
            return Err(EngineError::InvalidParameter(format!(
                "Weight multiplier range [{}, {}] must be positive and non-empty",
                low, high
            )));
        }

        Ok(())
    }
}

/// Batched option pricer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricerConfig {
    /// Upper bound on paths simulated per batch
    pub max_batch_size: usize,

    /// z-score of the reported confidence interval
    pub confidence_z: f64,

    /// Compute gamma, vega, theta and rho in closed form
    pub analytical_greeks: bool,

    pub seed: Option<u64>,
}

impl Default for PricerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 256,
            confidence_z: 1.96,
            analytical_greeks: true,
            seed: None,
        }
    }
}

impl PricerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(EngineError::InvalidParameter(
                "Pricer batch size must be positive".to_string(),
            ));
        }

        if self.confidence_z <= 0.0 {
            return Err(EngineError::InvalidParameter(
                "Confidence z-score must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Batched risk estimator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Scenarios generated per estimate
    pub total_scenarios: usize,

    /// Scenarios per batch
    pub batch_size: usize,

    /// Illustrative annual drift applied to every asset
    pub annual_drift: f64,

    /// Illustrative annual volatility applied to every asset
    pub annual_volatility: f64,

    pub seed: Option<u64>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            total_scenarios: 1024,
            batch_size: 256,
            annual_drift: -0.02,
            annual_volatility: 0.30,
            seed: None,
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.total_scenarios == 0 || self.batch_size == 0 {
            return Err(EngineError::InvalidParameter(
                "Scenario count and batch size must be positive".to_string(),
            ));
        }

        if self.annual_volatility < 0.0 {
            return Err(EngineError::NegativeVolatility);
        }

        Ok(())
    }

    /// Number of batches needed to cover all scenarios
    pub fn batch_count(&self) -> usize {
        self.total_scenarios.div_ceil(self.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.optimizer.iterations, 100);
        assert_eq!(config.pricer.max_batch_size, 256);
        assert_eq!(config.estimator.total_scenarios, 1024);
        assert_eq!(config.estimator.batch_count(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
optimizer:
  seed: 42
estimator:
  batch_size: 128
"#;
        let config = EngineConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.optimizer.seed, Some(42));
        assert_eq!(config.optimizer.iterations, 100);
        assert_eq!(config.estimator.batch_size, 128);
        assert_eq!(config.estimator.batch_count(), 8);
        assert_eq!(config.pricer, PricerConfig::default());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{ "pricer": { "max_batch_size": 64, "analytical_greeks": false } }"#;
        let config = EngineConfig::from_json(json).unwrap();

        assert_eq!(config.pricer.max_batch_size, 64);
        assert!(!config.pricer.analytical_greeks);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let yaml = "optimizer:\n  iterations: 0\n";
        assert!(matches!(
            EngineConfig::from_yaml(yaml),
            Err(EngineError::InvalidParameter(_))
        ));

        let yaml = "optimizer:\n  weight_multiplier_range: [2.0, 0.5]\n";
        assert!(EngineConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_invalid_yaml() {
        let result = EngineConfig::from_yaml("optimizer: {iterations: [");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_with_seed() {
        let config = EngineConfig::default().with_seed(7);
        assert_eq!(config.optimizer.seed, Some(7));
        assert_eq!(config.pricer.seed, Some(7));
        assert_eq!(config.estimator.seed, Some(7));
    }
}
