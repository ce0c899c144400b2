//! Batched pricing and risk estimation example
//!
//! Prices an at-the-money call at increasing path counts and estimates the
//! tail risk of a fixed allocation.
//!
//! Run with: cargo run --example price_and_estimate

use qf_engine::{EngineConfig, EuropeanOption, MarketInputs, PortfolioWeights, QuantumFinanceEngine};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let engine = QuantumFinanceEngine::new(EngineConfig::default().with_seed(7));

    println!("=== Batched Option Pricing ===\n");
    let call = EuropeanOption::call(100.0, 1.0);
    let market = MarketInputs {
        spot: 100.0,
        volatility: 0.2,
        risk_free_rate: 0.025,
    };

    for paths in [64, 1024, 16_384] {
        let result = engine.pricer().price_european_option(&call, &market, paths)?;
        println!(
            "  {:>6} paths: {:.4} [{:.4}, {:.4}] (analytical {:.4}, {} batches)",
            paths,
            result.price,
            result.confidence_interval.0,
            result.confidence_interval.1,
            result.analytical_price,
            result.batch_count
        );
    }

    let greeks = engine.pricer().greeks(&call, &market)?;
    println!("\n  Delta: {:.4}", greeks.delta);
    if let (Some(gamma), Some(vega)) = (greeks.gamma, greeks.vega) {
        println!("  Gamma: {:.4}", gamma);
        println!("  Vega:  {:.4}", vega);
    }

    println!("\n=== Batched Risk Estimation ===\n");
    let weights = PortfolioWeights::from_pairs([("SPY", 0.5), ("QQQ", 0.3), ("TLT", 0.2)]);

    for confidence in [0.95, 0.99] {
        let risk = engine.estimator().estimate_portfolio_risk(&weights, confidence, 1.0)?;
        println!(
            "  {:.0}% VaR: {:>7.2}%  CVaR: {:>7.2}%  ({} scenarios, precision {:.4})",
            confidence * 100.0,
            risk.value_at_risk * 100.0,
            risk.conditional_var * 100.0,
            risk.scenario_count,
            risk.precision
        );
    }

    Ok(())
}
