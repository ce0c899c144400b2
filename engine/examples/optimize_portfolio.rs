//! Portfolio optimization example
//!
//! Runs the variational optimizer in both objective modes and prints the
//! chosen allocation with its risk metrics.
//!
//! Run with: cargo run --example optimize_portfolio

use qf_engine::{Asset, EngineConfig, MarketConstraints, QuantumFinanceEngine};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("qf_engine=info".parse()?))
        .init();

    println!("=== Variational Portfolio Optimization ===\n");

    let assets = vec![
        Asset::new("AAPL", "Apple Inc.", 0.15, 0.28, 189.5)?,
        Asset::new("GOOGL", "Alphabet Inc.", 0.13, 0.26, 141.8)?,
        Asset::new("MSFT", "Microsoft Corp.", 0.12, 0.22, 415.2)?,
        Asset::new("JNJ", "Johnson & Johnson", 0.07, 0.14, 152.8)?,
        Asset::new("TLT", "Long Treasuries", 0.04, 0.09, 94.1)?,
    ];

    let constraints = MarketConstraints {
        max_weight_per_asset: 0.5,
        min_weight_per_asset: 0.0,
        max_volatility: 0.25,
        min_return: 0.05,
        risk_free_rate: 0.02,
    };

    let engine = QuantumFinanceEngine::new(EngineConfig::default().with_seed(42));

    // 1. Maximize Sharpe ratio
    println!("--- Maximize Sharpe ---");
    let result = engine.optimizer().optimize(&assets, &constraints, None)?;
    for (symbol, weight) in result.optimal_weights.iter() {
        println!("  {:<6} {:>6.2}%", symbol, weight * 100.0);
    }
    println!("  Expected return: {:.2}%", result.risk_metrics.expected_return * 100.0);
    println!("  Volatility:      {:.2}%", result.risk_metrics.volatility * 100.0);
    match result.risk_metrics.sharpe_ratio {
        Some(sharpe) => println!("  Sharpe ratio:    {:.3}", sharpe),
        None => println!("  Sharpe ratio:    undefined"),
    }
    println!("  Feasible candidates: {}/{}", result.feasible_candidates, result.iterations);
    println!("  Illustrative advantage ratio: {:.4}", result.quantum_advantage);
    println!("  Elapsed: {:?}\n", result.elapsed);

    // 2. Minimize volatility for a target return
    println!("--- Minimize Volatility (target 8%) ---");
    match engine.optimizer().optimize(&assets, &constraints, Some(0.08)) {
        Ok(result) => {
            for (symbol, weight) in result.optimal_weights.iter() {
                println!("  {:<6} {:>6.2}%", symbol, weight * 100.0);
            }
            println!("  Volatility: {:.2}%", result.risk_metrics.volatility * 100.0);
            println!("  95% parametric VaR: {:.2}%", result.risk_metrics.value_at_risk * 100.0);
        }
        Err(e) => println!("  {}", e),
    }

    Ok(())
}
