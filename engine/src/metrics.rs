//! Closed-form portfolio risk metrics
//!
//! Aggregates a weight vector against asset-level return and volatility:
//! - Expected return: Σ w·μ
//! - Volatility: √(Σ w²·σ²), diagonal terms only (no cross-asset covariance)
//! - Sharpe ratio: (μ_p - r_f) / σ_p, undefined when σ_p = 0
//! - VaR / CVaR: parametric z-scores annualized by √252
//! - Max drawdown: 2.5·σ_p heuristic

use crate::math::{TRADING_DAYS_PER_YEAR, Z_95, Z_99};
use crate::types::{Asset, PortfolioWeights, RiskMetrics};

/// Drawdown proxy multiplier applied to volatility
pub const DRAWDOWN_MULTIPLIER: f64 = 2.5;

/// Compute risk metrics for `weights` over `assets`
///
/// Weights are normalized first; assets without a weight contribute
/// nothing, and weights for unknown symbols are ignored.
pub fn compute_risk_metrics(
    assets: &[Asset],
    weights: &PortfolioWeights,
    risk_free_rate: f64,
) -> RiskMetrics {
    let weights = weights.normalized();

    let mut expected_return = 0.0;
    let mut variance = 0.0;
    for asset in assets {
        let w = weights.get(&asset.symbol);
        expected_return += w * asset.expected_return;
        variance += w * w * asset.volatility * asset.volatility;
    }

    let volatility = variance.sqrt();
    let sharpe_ratio = sharpe_ratio(expected_return, volatility, risk_free_rate);
    let annualization = TRADING_DAYS_PER_YEAR.sqrt();

    RiskMetrics {
        expected_return,
        volatility,
        sharpe_ratio,
        max_drawdown: volatility * DRAWDOWN_MULTIPLIER,
        value_at_risk: -Z_95 * volatility * annualization,
        conditional_var: -Z_99 * volatility * annualization,
    }
}

/// Sharpe ratio, `None` when volatility is zero
pub fn sharpe_ratio(expected_return: f64, volatility: f64, risk_free_rate: f64) -> Option<f64> {
    if volatility > 0.0 {
        Some((expected_return - risk_free_rate) / volatility)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn universe() -> Vec<Asset> {
        vec![
            Asset::new("AAA", "Alpha", 0.10, 0.20, 50.0).unwrap(),
            Asset::new("BBB", "Beta", 0.06, 0.10, 25.0).unwrap(),
        ]
    }

    #[test]
    fn test_two_asset_metrics() {
        let assets = universe();
        let weights = PortfolioWeights::from_pairs([("AAA", 0.5), ("BBB", 0.5)]);

        let metrics = compute_risk_metrics(&assets, &weights, 0.02);

        assert_abs_diff_eq!(metrics.expected_return, 0.08, epsilon = 1e-12);
        // √(0.25·0.04 + 0.25·0.01)
        let vol = (0.0125f64).sqrt();
        assert_abs_diff_eq!(metrics.volatility, vol, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.sharpe_ratio.unwrap(), 0.06 / vol, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.max_drawdown, vol * 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.value_at_risk, -1.645 * vol * 252f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.conditional_var, -2.326 * vol * 252f64.sqrt(), epsilon = 1e-12);
        assert!(metrics.conditional_var < metrics.value_at_risk);
    }

    #[test]
    fn test_weights_are_normalized_first() {
        let assets = universe();
        let raw = PortfolioWeights::from_pairs([("AAA", 2.0), ("BBB", 2.0)]);
        let unit = PortfolioWeights::from_pairs([("AAA", 0.5), ("BBB", 0.5)]);

        assert_eq!(
            compute_risk_metrics(&assets, &raw, 0.02),
            compute_risk_metrics(&assets, &unit, 0.02)
        );
    }

    #[test]
    fn test_zero_volatility_sharpe_is_undefined() {
        let assets = vec![
            Asset::new("CASH", "Cash", 0.03, 0.0, 1.0).unwrap(),
            Asset::new("BILL", "T-Bill", 0.04, 0.0, 1.0).unwrap(),
        ];
        let weights = PortfolioWeights::equal(&assets);

        let metrics = compute_risk_metrics(&assets, &weights, 0.02);

        assert_eq!(metrics.volatility, 0.0);
        assert!(metrics.sharpe_ratio.is_none());
        assert!(!metrics.has_sharpe_ratio());
        assert_eq!(metrics.value_at_risk, 0.0);
    }

    #[test]
    fn test_unknown_symbols_ignored() {
        let assets = universe();
        let weights = PortfolioWeights::from_pairs([("AAA", 1.0), ("ZZZ", 0.0)]);

        let metrics = compute_risk_metrics(&assets, &weights, 0.0);
        assert_abs_diff_eq!(metrics.expected_return, 0.10, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.volatility, 0.20, epsilon = 1e-12);
    }
}
