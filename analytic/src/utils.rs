use libm::erfc;
use linfa::Float;

const SQRT_2PI: f64 = 2.5066282746310007;

/// Cumulative distribution function of Standard Normal at x
pub fn norm_cdf<F: Float>(x: F) -> F {
    let x = x.to_f64().unwrap_or(f64::NAN);
    F::cast(0.5 * erfc(-x / std::f64::consts::SQRT_2))
}

/// Probability density function of Standard Normal at x
pub fn norm_pdf<F: Float>(x: F) -> F {
    let x = x.to_f64().unwrap_or(f64::NAN);
    F::cast((-0.5 * x * x).exp() / SQRT_2PI)
}
