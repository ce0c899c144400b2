//! Numeric primitives shared by the engines
//!
//! - `Complex`: amplitude scalar (re-exported from nalgebra)
//! - `normal_cdf`: Abramowitz–Stegun 7.1.26 approximation, |error| < 1.5e-7
//! - `normal_pdf`: standard normal density

use std::f64::consts::{PI, SQRT_2};

pub use nalgebra::Complex;

/// Complex amplitude with f64 parts
pub type Amplitude = Complex<f64>;

/// Trading days used to annualize daily figures
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One-tailed z-score at ~95% confidence
pub const Z_95: f64 = 1.645;

/// One-tailed z-score at ~99% confidence
pub const Z_99: f64 = 2.326;

const ERF_P: f64 = 0.327_591_1;
const ERF_A1: f64 = 0.254_829_592;
const ERF_A2: f64 = -0.284_496_736;
const ERF_A3: f64 = 1.421_413_741;
const ERF_A4: f64 = -1.453_152_027;
const ERF_A5: f64 = 1.061_405_429;

/// Error function via the Abramowitz–Stegun rational approximation
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + ERF_P * x);
    let poly = ((((ERF_A5 * t + ERF_A4) * t + ERF_A3) * t + ERF_A2) * t + ERF_A1) * t;

    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal cumulative distribution function
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / SQRT_2))
}

/// Standard normal probability density function
pub fn normal_pdf(x: f64) -> f64 {
    (1.0 / (2.0 * PI).sqrt()) * (-0.5 * x * x).exp()
}

/// Probability-like weight of an amplitude
#[inline]
pub fn magnitude_squared(amplitude: &Amplitude) -> f64 {
    amplitude.norm_sqr()
}
