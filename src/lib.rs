//! `acqbox` gathers analytic acquisition functions for Bayesian optimization together
//! with the gaussian process surrogate they are computed from.
//!
//! * [gp] (`acqbox-gp` crate): the [Surrogate](gp::Surrogate) model interface, its
//!   [MultivariateNormal](gp::MultivariateNormal) posterior, a batched fixed noise
//!   gaussian process [FixedNoiseGp](gp::FixedNoiseGp) and a posterior sampler,
//! * [analytic] (`acqbox-analytic` crate): expected improvement, posterior mean,
//!   probability of improvement, upper confidence bound, constrained and noisy
//!   expected improvement.
//!
//! # Example
//!
//! ```
//! use acqbox::prelude::*;
//! use ndarray::{array, Array};
//!
//! // noisy observations of some function to maximize
//! let xt = array![[0.], [0.3], [0.6], [1.]];
//! let yt = array![0.1, 0.8, 0.7, -0.2];
//! let gp = FixedNoiseGp::params(SquaredExponentialCorr::default())
//!     .theta(array![10.])
//!     .fit(&xt, &yt, &Array::from_elem(4, 0.01))
//!     .expect("GP fitted");
//!
//! let nei = NoisyExpectedImprovement::new_with_sampler(
//!     &gp,
//!     &xt,
//!     DEFAULT_NUM_FANTASIES,
//!     true,
//!     &NormalSampler::seed_from_u64(42),
//! )
//! .expect("NEI built");
//!
//! let x = Array::linspace(0., 1., 11).into_shape((11, 1, 1)).unwrap();
//! let scores = nei.value(&x.into_dyn().view()).expect("NEI scores");
//! assert_eq!(scores.shape(), &[11]);
//! ```
pub use acqbox_analytic as analytic;
pub use acqbox_gp as gp;

/// Most used types and traits
pub mod prelude {
    pub use acqbox_analytic::{
        AcqError, AcquisitionFunction, BatchParam, ConstrainedExpectedImprovement,
        ExpectedImprovement, NoisyExpectedImprovement, PosteriorMean, ProbabilityOfImprovement,
        ScalarizedObjective, UpperConfidenceBound, DEFAULT_NUM_FANTASIES,
    };
    pub use acqbox_gp::correlation_models::*;
    pub use acqbox_gp::{
        FixedNoiseGp, GpError, MultivariateNormal, NormalSampler, PosteriorSampler, Surrogate,
    };
}
