//! Batched European option pricer
//!
//! Paths are simulated in fixed-size batches so peak memory is bounded by
//! the batch size rather than the path count. Each batch only keeps the
//! streaming moments Σpayoff and Σpayoff², which are combined after all
//! batches finish.
//!
//! Greeks come from closed-form Black–Scholes formulas:
//! - Delta (∂V/∂S), always computed
//! - Gamma (∂²V/∂S²)
//! - Vega (∂V/∂σ, per 1% volatility change)
//! - Theta (∂V/∂t, per calendar day)
//! - Rho (∂V/∂r, per 1% rate change)

use crate::config::PricerConfig;
use crate::error::{EngineError, Result};
use crate::math::{normal_cdf, normal_pdf, Amplitude};
use crate::rng::{resolve_seed, stream_rng};
use crate::state::QuantumPortfolioState;
use chrono::{DateTime, Utc};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Option type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

/// European option contract
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EuropeanOption {
    pub option_type: OptionType,

    /// Strike price
    pub strike: f64,

    /// Time to expiration in years
    pub time_to_expiry: f64,
}

impl EuropeanOption {
    pub fn call(strike: f64, time_to_expiry: f64) -> Self {
        Self {
            option_type: OptionType::Call,
            strike,
            time_to_expiry,
        }
    }

    pub fn put(strike: f64, time_to_expiry: f64) -> Self {
        Self {
            option_type: OptionType::Put,
            strike,
            time_to_expiry,
        }
    }

    /// Payoff at expiry for a terminal underlying price
    pub fn payoff(&self, terminal_price: f64) -> f64 {
        match self.option_type {
            OptionType::Call => (terminal_price - self.strike).max(0.0),
            OptionType::Put => (self.strike - terminal_price).max(0.0),
        }
    }
}

/// Market inputs for a single underlying
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketInputs {
    pub spot: f64,
    pub volatility: f64,
    pub risk_free_rate: f64,
}

/// Option sensitivities
///
/// `None` marks a Greek that was not computed; it never stands for zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: Option<f64>,
    pub vega: Option<f64>,
    pub theta: Option<f64>,
    pub rho: Option<f64>,
}

/// Outcome of a batched pricing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionPriceResult {
    /// Discounted mean payoff
    pub price: f64,

    /// Black–Scholes reference price
    pub analytical_price: f64,

    /// Discounted standard error of the mean payoff
    pub standard_error: f64,

    /// (lower, upper) bounds at `PricerConfig::confidence_z`
    pub confidence_interval: (f64, f64),

    pub greeks: Greeks,

    pub num_paths: usize,
    pub batch_size: usize,
    pub batch_count: usize,

    /// Illustrative √paths ratio, not a measured speedup
    pub quantum_advantage: f64,

    pub elapsed: Duration,
    pub timestamp: DateTime<Utc>,
}

impl OptionPriceResult {
    /// Half width of the confidence interval
    pub fn confidence_half_width(&self) -> f64 {
        (self.confidence_interval.1 - self.confidence_interval.0) / 2.0
    }
}

/// Streaming payoff moments of one batch
#[derive(Debug, Clone, Copy, Default)]
struct PayoffMoments {
    sum: f64,
    sum_sq: f64,
    count: usize,
}

impl PayoffMoments {
    fn push(&mut self, payoff: f64) {
        self.sum += payoff;
        self.sum_sq += payoff * payoff;
        self.count += 1;
    }

    fn merge(self, other: Self) -> Self {
        Self {
            sum: self.sum + other.sum,
            sum_sq: self.sum_sq + other.sum_sq,
            count: self.count + other.count,
        }
    }
}

/// Memory-bounded Monte Carlo pricer
pub struct BatchedOptionPricer {
    config: PricerConfig,
}

impl BatchedOptionPricer {
    pub fn new(config: PricerConfig) -> Self {
        Self { config }
    }

    /// Price a European option over `num_paths` simulated terminal prices
    pub fn price_european_option(
        &self,
        option: &EuropeanOption,
        market: &MarketInputs,
        num_paths: usize,
    ) -> Result<OptionPriceResult> {
        self.config.validate()?;
        validate_inputs(option, market)?;
        if num_paths == 0 {
            return Err(EngineError::InvalidParameter(
                "Number of paths must be positive".to_string(),
            ));
        }

        let started = Instant::now();
        let base_seed = resolve_seed(self.config.seed);
        let batch_size = self.config.max_batch_size.min(num_paths);
        let batch_count = num_paths.div_ceil(batch_size);

        info!(
            "Pricing {:?} K={} T={} over {} paths ({} batches of {})",
            option.option_type, option.strike, option.time_to_expiry, num_paths, batch_count, batch_size
        );

        let batches = (0..batch_count)
            .into_par_iter()
            .map(|batch| {
                let start = batch * batch_size;
                let len = batch_size.min(num_paths - start);
                simulate_batch(option, market, base_seed, batch, len)
            })
            .collect::<Result<Vec<_>>>()?;

        let moments = batches
            .into_iter()
            .fold(PayoffMoments::default(), PayoffMoments::merge);

        let n = moments.count as f64;
        let mean = moments.sum / n;
        let variance = (moments.sum_sq / n - mean * mean).max(0.0);
        let standard_error = (variance / n).sqrt();
        let discount = (-market.risk_free_rate * option.time_to_expiry).exp();
        let half_width = self.config.confidence_z * standard_error;

        let price = discount * mean;
        let analytical_price = black_scholes_price(option, market)?;
        let greeks = self.greeks(option, market)?;
        let elapsed = started.elapsed();

        debug!(
            "Simulated price {:.4} vs analytical {:.4} (se {:.4})",
            price,
            analytical_price,
            discount * standard_error
        );

        Ok(OptionPriceResult {
            price,
            analytical_price,
            standard_error: discount * standard_error,
            confidence_interval: (discount * (mean - half_width), discount * (mean + half_width)),
            greeks,
            num_paths,
            batch_size,
            batch_count,
            quantum_advantage: (num_paths as f64).sqrt(),
            elapsed,
            timestamp: Utc::now(),
        })
    }

    /// Closed-form Greeks; only delta when analytical Greeks are disabled
    pub fn greeks(&self, option: &EuropeanOption, market: &MarketInputs) -> Result<Greeks> {
        validate_inputs(option, market)?;

        let delta = calculate_analytical_delta(option, market)?;
        if !self.config.analytical_greeks {
            return Ok(Greeks {
                delta,
                gamma: None,
                vega: None,
                theta: None,
                rho: None,
            });
        }

        let s = market.spot;
        let k = option.strike;
        let t = option.time_to_expiry;
        let sigma = market.volatility;
        let r = market.risk_free_rate;

        let (d1, d2) = d1_d2(option, market)?;
        let n_prime_d1 = normal_pdf(d1);
        let discounted_strike = k * (-r * t).exp();

        // Gamma and vega are the same for calls and puts
        let gamma = n_prime_d1 / (s * sigma * t.sqrt());
        let vega = s * n_prime_d1 * t.sqrt() / 100.0;

        let decay = -s * n_prime_d1 * sigma / (2.0 * t.sqrt());
        let (theta, rho) = match option.option_type {
            OptionType::Call => (
                (decay - r * discounted_strike * normal_cdf(d2)) / 365.0,
                t * discounted_strike * normal_cdf(d2) / 100.0,
            ),
            OptionType::Put => (
                (decay + r * discounted_strike * normal_cdf(-d2)) / 365.0,
                -t * discounted_strike * normal_cdf(-d2) / 100.0,
            ),
        };

        Ok(Greeks {
            delta,
            gamma: Some(gamma),
            vega: Some(vega),
            theta: Some(theta),
            rho: Some(rho),
        })
    }
}

/// Simulate one batch of terminal prices and return its payoff moments
///
/// Each path samples an entry `a` of a uniform batch state and a phase θ,
/// projects `Re(√N·a·e^{iθ}) = cos θ` and pairs it with an independent
/// uniform `u` to form the shock `z = √(-2 ln u)·cos θ`, which is standard
/// normal.
fn simulate_batch(
    option: &EuropeanOption,
    market: &MarketInputs,
    base_seed: u64,
    batch: usize,
    len: usize,
) -> Result<PayoffMoments> {
    let state = QuantumPortfolioState::for_count(len)?;
    let scale = (state.total_states() as f64).sqrt();
    let mut rng = stream_rng(base_seed, batch as u64);

    let t = option.time_to_expiry;
    let sigma = market.volatility;
    let drift = (market.risk_free_rate - 0.5 * sigma * sigma) * t;
    let diffusion = sigma * t.sqrt();

    let mut moments = PayoffMoments::default();
    for _ in 0..len {
        let amplitude = state.amplitude(state.sample_index(&mut rng));
        let theta = rng.gen_range(0.0..2.0 * PI);
        let projection = (amplitude * Amplitude::new(scale * theta.cos(), scale * theta.sin())).re;

        // 1 - u lies in (0, 1], keeping the logarithm finite
        let u = 1.0 - rng.gen::<f64>();
        let shock = (-2.0 * u.ln()).sqrt() * projection;

        let terminal = market.spot * (drift + diffusion * shock).exp();
        moments.push(option.payoff(terminal));
    }

    Ok(moments)
}

/// Black–Scholes d1 and d2
fn d1_d2(option: &EuropeanOption, market: &MarketInputs) -> Result<(f64, f64)> {
    let sigma = market.volatility;
    let t = option.time_to_expiry;
    if sigma <= 0.0 || t <= 0.0 {
        return Err(EngineError::InvalidParameter(
            "Volatility and time must be positive".to_string(),
        ));
    }

    let sqrt_t = t.sqrt();
    let d1 = ((market.spot / option.strike).ln()
        + (market.risk_free_rate + 0.5 * sigma * sigma) * t)
        / (sigma * sqrt_t);
    Ok((d1, d1 - sigma * sqrt_t))
}

/// Black–Scholes delta: N(d1) for calls, N(d1) - 1 for puts
pub fn calculate_analytical_delta(option: &EuropeanOption, market: &MarketInputs) -> Result<f64> {
    validate_inputs(option, market)?;
    let (d1, _) = d1_d2(option, market)?;

    Ok(match option.option_type {
        OptionType::Call => normal_cdf(d1),
        OptionType::Put => normal_cdf(d1) - 1.0,
    })
}

/// Closed-form Black–Scholes price
pub fn black_scholes_price(option: &EuropeanOption, market: &MarketInputs) -> Result<f64> {
    validate_inputs(option, market)?;
    let (d1, d2) = d1_d2(option, market)?;

    let discounted_strike = option.strike * (-market.risk_free_rate * option.time_to_expiry).exp();
    Ok(match option.option_type {
        OptionType::Call => market.spot * normal_cdf(d1) - discounted_strike * normal_cdf(d2),
        OptionType::Put => discounted_strike * normal_cdf(-d2) - market.spot * normal_cdf(-d1),
    })
}

fn validate_inputs(option: &EuropeanOption, market: &MarketInputs) -> Result<()> {
    if market.spot <= 0.0 || !market.spot.is_finite() {
        return Err(EngineError::NegativePrice);
    }

    if option.strike <= 0.0 || !option.strike.is_finite() {
        return Err(EngineError::InvalidParameter(
            "Strike price must be positive".to_string(),
        ));
    }

    if market.volatility < 0.0 {
        return Err(EngineError::NegativeVolatility);
    }

    if market.volatility == 0.0 || !market.volatility.is_finite() {
        return Err(EngineError::InvalidParameter(
            "Volatility must be positive".to_string(),
        ));
    }

    if option.time_to_expiry <= 0.0 || !option.time_to_expiry.is_finite() {
        return Err(EngineError::InvalidParameter(
            "Time to expiry must be positive".to_string(),
        ));
    }

    if !market.risk_free_rate.is_finite() {
        return Err(EngineError::InvalidParameter(
            "Risk-free rate must be finite".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn seeded(seed: u64) -> BatchedOptionPricer {
        BatchedOptionPricer::new(PricerConfig {
            seed: Some(seed),
            ..Default::default()
        })
    }

    fn atm_market(r: f64) -> MarketInputs {
        MarketInputs {
            spot: 100.0,
            volatility: 0.2,
            risk_free_rate: r,
        }
    }

    #[test]
    fn test_black_scholes_reference_value() {
        let call = EuropeanOption::call(100.0, 1.0);
        let price = black_scholes_price(&call, &atm_market(0.05)).unwrap();
        assert_abs_diff_eq!(price, 10.4506, epsilon = 1e-3);
    }

    #[test]
    fn test_put_call_parity() {
        let market = atm_market(0.025);
        let call = black_scholes_price(&EuropeanOption::call(95.0, 0.5), &market).unwrap();
        let put = black_scholes_price(&EuropeanOption::put(95.0, 0.5), &market).unwrap();

        let forward = market.spot - 95.0 * (-0.025f64 * 0.5).exp();
        assert_abs_diff_eq!(call - put, forward, epsilon = 1e-5);
    }

    #[test]
    fn test_simulated_price_converges() {
        let call = EuropeanOption::call(100.0, 1.0);
        let market = atm_market(0.025);
        let pricer = seeded(42);

        let coarse = pricer.price_european_option(&call, &market, 64).unwrap();
        let fine = pricer.price_european_option(&call, &market, 16_384).unwrap();

        for result in [&coarse, &fine] {
            assert!(result.confidence_interval.0 <= result.price);
            assert!(result.price <= result.confidence_interval.1);
        }
        assert!(fine.confidence_half_width() < coarse.confidence_half_width());
        assert!(
            (fine.price - fine.analytical_price).abs() < 4.0 * fine.confidence_half_width(),
            "simulated {} vs analytical {}",
            fine.price,
            fine.analytical_price
        );
    }

    #[test]
    fn test_batch_plan() {
        let call = EuropeanOption::call(100.0, 1.0);
        let market = atm_market(0.025);
        let pricer = seeded(1);

        let small = pricer.price_european_option(&call, &market, 64).unwrap();
        assert_eq!(small.batch_size, 64);
        assert_eq!(small.batch_count, 1);

        let large = pricer.price_european_option(&call, &market, 1000).unwrap();
        assert_eq!(large.batch_size, 256);
        assert_eq!(large.batch_count, 4);
        assert_eq!(large.num_paths, 1000);
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let put = EuropeanOption::put(105.0, 0.75);
        let market = atm_market(0.03);

        let a = seeded(9).price_european_option(&put, &market, 1024).unwrap();
        let b = seeded(9).price_european_option(&put, &market, 1024).unwrap();
        assert_eq!(a.price, b.price);
        assert_eq!(a.confidence_interval, b.confidence_interval);
    }

    #[test]
    fn test_call_greeks() {
        let call = EuropeanOption::call(100.0, 1.0);
        let greeks = seeded(1).greeks(&call, &atm_market(0.05)).unwrap();

        assert!(greeks.delta > 0.5 && greeks.delta < 0.7);
        assert!(greeks.gamma.unwrap() > 0.0);
        assert!(greeks.vega.unwrap() > 0.0);
        assert!(greeks.theta.unwrap() < 0.0);
        assert!(greeks.rho.unwrap() > 0.0);
    }

    #[test]
    fn test_put_greeks() {
        let put = EuropeanOption::put(100.0, 1.0);
        let greeks = seeded(1).greeks(&put, &atm_market(0.05)).unwrap();

        assert!(greeks.delta < -0.3 && greeks.delta > -0.5);
        assert!(greeks.gamma.unwrap() > 0.0);
        assert!(greeks.rho.unwrap() < 0.0);
    }

    #[test]
    fn test_greeks_not_computed_are_absent() {
        let pricer = BatchedOptionPricer::new(PricerConfig {
            analytical_greeks: false,
            seed: Some(3),
            ..Default::default()
        });
        let call = EuropeanOption::call(100.0, 1.0);

        let result = pricer.price_european_option(&call, &atm_market(0.025), 128).unwrap();
        assert!(result.greeks.delta > 0.0);
        assert!(result.greeks.gamma.is_none());
        assert!(result.greeks.vega.is_none());
        assert!(result.greeks.theta.is_none());
        assert!(result.greeks.rho.is_none());
    }

    #[test]
    fn test_invalid_inputs() {
        let pricer = seeded(1);
        let call = EuropeanOption::call(100.0, 1.0);

        let bad_spot = MarketInputs { spot: -1.0, ..atm_market(0.02) };
        assert!(matches!(
            pricer.price_european_option(&call, &bad_spot, 100),
            Err(EngineError::NegativePrice)
        ));

        let bad_vol = MarketInputs { volatility: -0.2, ..atm_market(0.02) };
        assert!(matches!(
            pricer.price_european_option(&call, &bad_vol, 100),
            Err(EngineError::NegativeVolatility)
        ));

        assert!(pricer.price_european_option(&call, &atm_market(0.02), 0).is_err());
        assert!(pricer
            .price_european_option(&EuropeanOption::call(100.0, 0.0), &atm_market(0.02), 10)
            .is_err());
    }

    #[test]
    fn test_payoff() {
        assert_eq!(EuropeanOption::call(100.0, 1.0).payoff(120.0), 20.0);
        assert_eq!(EuropeanOption::call(100.0, 1.0).payoff(80.0), 0.0);
        assert_eq!(EuropeanOption::put(100.0, 1.0).payoff(80.0), 20.0);
        assert_eq!(EuropeanOption::put(100.0, 1.0).payoff(120.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_delta_bounds(
            spot in 1.0f64..500.0,
            strike in 1.0f64..500.0,
            volatility in 0.01f64..2.0,
            time_to_expiry in 0.01f64..5.0,
            risk_free_rate in -0.02f64..0.15,
        ) {
            let market = MarketInputs { spot, volatility, risk_free_rate };

            let call = calculate_analytical_delta(&EuropeanOption::call(strike, time_to_expiry), &market).unwrap();
            prop_assert!((0.0..=1.0).contains(&call));

            let put = calculate_analytical_delta(&EuropeanOption::put(strike, time_to_expiry), &market).unwrap();
            prop_assert!((-1.0..=0.0).contains(&put));
        }
    }
}
