//! Available analytic acquisition functions
mod cei;
mod ei;
mod nei;
mod pi;
mod pm;
mod ucb;

pub use cei::ConstrainedExpectedImprovement;
pub use ei::ExpectedImprovement;
pub use nei::{NoisyExpectedImprovement, DEFAULT_NUM_FANTASIES};
pub use pi::ProbabilityOfImprovement;
pub use pm::PosteriorMean;
pub use ucb::UpperConfidenceBound;

pub(crate) use ei::{ei_value, expected_improvement};

/// Lower bound of the posterior variance used by expected improvement
pub const EI_VARIANCE_MIN: f64 = 1e-9;
/// Lower bound of the posterior standard deviation used by probability of improvement
/// and constrained expected improvement
pub const SIGMA_MIN: f64 = 1e-9;
