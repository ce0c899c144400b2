//! Domain model: assets, weights, constraints and risk snapshots

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Tolerance used when comparing weights against bounds
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// A tradable asset
///
/// Created once when the universe is set up and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Ticker or other unique identifier
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Annualized expected return
    pub expected_return: f64,

    /// Annualized volatility (standard deviation, >= 0)
    pub volatility: f64,

    /// Current price (> 0)
    pub current_price: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
}

impl Asset {
    /// Create a validated asset
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        expected_return: f64,
        volatility: f64,
        current_price: f64,
    ) -> Result<Self> {
        let asset = Self {
            symbol: symbol.into(),
            name: name.into(),
            expected_return,
            volatility,
            current_price,
            market_cap: None,
        };
        asset.validate()?;
        Ok(asset)
    }

    /// Attach a market capitalization
    pub fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    /// Check the record invariants
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(EngineError::InvalidParameter(
                "Asset symbol must not be empty".to_string(),
            ));
        }

        if !self.expected_return.is_finite() {
            return Err(EngineError::InvalidParameter(format!(
                "Expected return of {} must be finite",
                self.symbol
            )));
        }

        if self.volatility < 0.0 || !self.volatility.is_finite() {
            return Err(EngineError::NegativeVolatility);
        }

        if self.current_price <= 0.0 || !self.current_price.is_finite() {
            return Err(EngineError::NegativePrice);
        }

        Ok(())
    }
}

/// Validate a whole universe: every asset valid and symbols unique
pub fn validate_universe(assets: &[Asset]) -> Result<()> {
    let mut seen = HashSet::with_capacity(assets.len());
    for asset in assets {
        asset.validate()?;
        if !seen.insert(asset.symbol.as_str()) {
            return Err(EngineError::InvalidParameter(format!(
                "Duplicate asset symbol: {}",
                asset.symbol
            )));
        }
    }
    Ok(())
}

/// Allocation weights keyed by asset symbol
///
/// Weights may take any sign during search. The sum-to-one invariant is
/// only established by [`PortfolioWeights::normalized`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioWeights {
    weights: BTreeMap<String, f64>,
}

impl PortfolioWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (symbol, weight) pairs; later duplicates overwrite earlier ones
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            weights: pairs.into_iter().map(|(s, w)| (s.into(), w)).collect(),
        }
    }

    /// Equal weight across the given assets
    pub fn equal(assets: &[Asset]) -> Self {
        if assets.is_empty() {
            return Self::new();
        }
        let w = 1.0 / assets.len() as f64;
        Self::from_pairs(assets.iter().map(|a| (a.symbol.clone(), w)))
    }

    pub fn set(&mut self, symbol: impl Into<String>, weight: f64) {
        self.weights.insert(symbol.into(), weight);
    }

    /// Weight of `symbol`, zero when absent
    pub fn get(&self, symbol: &str) -> f64 {
        self.weights.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.weights.contains_key(symbol)
    }

    /// Iterate in symbol order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(s, w)| (s.as_str(), *w))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of all weights
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Copy whose weights sum to 1.0
    ///
    /// When the total is not positive the weights are returned unchanged;
    /// callers must check [`PortfolioWeights::total`] before treating the
    /// result as a distribution.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total <= 0.0 || !total.is_finite() {
            return self.clone();
        }

        Self {
            weights: self
                .weights
                .iter()
                .map(|(s, w)| (s.clone(), w / total))
                .collect(),
        }
    }

    /// Whether every weight lies in `[min, max]` (with tolerance)
    pub fn within_bounds(&self, min: f64, max: f64) -> bool {
        self.weights
            .values()
            .all(|w| *w >= min - WEIGHT_TOLERANCE && *w <= max + WEIGHT_TOLERANCE)
    }
}

/// Read-only allocation bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConstraints {
    pub max_weight_per_asset: f64,
    pub min_weight_per_asset: f64,
    /// Upper bound on annualized portfolio volatility
    pub max_volatility: f64,
    /// Lower bound on annualized return when no target return is given
    pub min_return: f64,
    pub risk_free_rate: f64,
}

impl Default for MarketConstraints {
    fn default() -> Self {
        Self {
            max_weight_per_asset: 1.0,
            min_weight_per_asset: 0.0,
            max_volatility: 1.0,
            min_return: 0.0,
            risk_free_rate: 0.02,
        }
    }
}

impl MarketConstraints {
    pub fn validate(&self) -> Result<()> {
        if self.min_weight_per_asset < 0.0 {
            return Err(EngineError::InvalidParameter(
                "Minimum weight per asset must be non-negative".to_string(),
            ));
        }

        if self.min_weight_per_asset > self.max_weight_per_asset {
            return Err(EngineError::InvalidParameter(format!(
                "Minimum weight {} exceeds maximum weight {}",
                self.min_weight_per_asset, self.max_weight_per_asset
            )));
        }

        if self.max_volatility < 0.0 {
            return Err(EngineError::NegativeVolatility);
        }

        if !self.risk_free_rate.is_finite() || !self.min_return.is_finite() {
            return Err(EngineError::InvalidParameter(
                "Rates must be finite".to_string(),
            ));
        }

        Ok(())
    }
}

/// Risk snapshot derived from a weight vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub expected_return: f64,
    pub volatility: f64,

    /// `None` when volatility is zero and the ratio is undefined
    pub sharpe_ratio: Option<f64>,

    /// Heuristic drawdown proxy (2.5x volatility)
    pub max_drawdown: f64,

    /// Parametric VaR at ~95% (negative = loss)
    pub value_at_risk: f64,

    /// Parametric tail loss at ~99% (negative = loss)
    pub conditional_var: f64,
}

impl RiskMetrics {
    /// Whether the Sharpe ratio is defined for this snapshot
    pub fn has_sharpe_ratio(&self) -> bool {
        self.sharpe_ratio.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_asset_validation() {
        assert!(Asset::new("AAPL", "Apple", 0.12, 0.25, 180.0).is_ok());
        assert!(matches!(
            Asset::new("AAPL", "Apple", 0.12, -0.25, 180.0),
            Err(EngineError::NegativeVolatility)
        ));
        assert!(matches!(
            Asset::new("AAPL", "Apple", 0.12, 0.25, 0.0),
            Err(EngineError::NegativePrice)
        ));
        assert!(Asset::new(" ", "Blank", 0.12, 0.25, 1.0).is_err());
    }

    #[test]
    fn test_duplicate_symbols_rejected() {
        let a = Asset::new("AAPL", "Apple", 0.12, 0.25, 180.0).unwrap();
        let result = validate_universe(&[a.clone(), a]);
        assert!(matches!(result, Err(EngineError::InvalidParameter(_))));
    }

    #[test]
    fn test_normalized_sums_to_one() {
        let weights = PortfolioWeights::from_pairs([("A", 2.0), ("B", 6.0)]);
        let normalized = weights.normalized();

        assert_abs_diff_eq!(normalized.total(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalized.get("A"), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(normalized.get("B"), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_normalized_degenerate_total_is_unchanged() {
        let zero = PortfolioWeights::from_pairs([("A", 0.0), ("B", 0.0)]);
        assert_eq!(zero.normalized(), zero);

        let negative = PortfolioWeights::from_pairs([("A", 1.0), ("B", -3.0)]);
        assert_eq!(negative.normalized(), negative);
    }

    #[test]
    fn test_missing_symbol_weight_is_zero() {
        let weights = PortfolioWeights::from_pairs([("A", 1.0)]);
        assert_eq!(weights.get("B"), 0.0);
        assert!(!weights.contains("B"));
    }

    #[test]
    fn test_constraints_validation() {
        assert!(MarketConstraints::default().validate().is_ok());

        let inverted = MarketConstraints {
            min_weight_per_asset: 0.6,
            max_weight_per_asset: 0.4,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_weights_serialize_as_map() {
        let weights = PortfolioWeights::from_pairs([("A", 0.5), ("B", 0.5)]);
        let json = serde_json::to_string(&weights).unwrap();
        assert_eq!(json, r#"{"A":0.5,"B":0.5}"#);
    }

    proptest! {
        #[test]
        fn prop_normalized_sums_to_one(values in prop::collection::vec(0.0001f64..1000.0, 1..20)) {
            let weights = PortfolioWeights::from_pairs(
                values.iter().enumerate().map(|(i, w)| (format!("A{}", i), *w)),
            );
            let total = weights.normalized().total();
            prop_assert!((total - 1.0).abs() < 1e-9);
        }
    }
}
