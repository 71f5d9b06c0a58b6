//! This library implements analytic acquisition functions for Bayesian optimization:
//! closed-form scores of candidate points computed from the gaussian posterior of a
//! [Surrogate](acqbox_gp::Surrogate) model, one candidate point at a time.
//!
//! * [ExpectedImprovement]: expected improvement over the best value observed so far,
//! * [PosteriorMean]: pure exploitation with the posterior mean,
//! * [ProbabilityOfImprovement]: probability to improve the best value observed so far,
//! * [UpperConfidenceBound]: optimistic bound `mean + sqrt(beta * variance)`,
//! * [ConstrainedExpectedImprovement]: expected improvement of one output weighted by
//!   the probability that the other outputs satisfy their bounds,
//! * [NoisyExpectedImprovement]: expected improvement averaged over models conditioned
//!   on fantasized noiseless observations, for noisy observations.
//!
//! Every criterion implements [AcquisitionFunction]: candidates are given as
//! `(batch.., 1, d)` arrays and scores are returned as `(batch..)` arrays, higher
//! scores being better whatever the optimization direction.
//!
//! Multi-output models can be reduced to a single output with a [ScalarizedObjective].
//!
//! # Example
//!
//! ```
//! use acqbox_analytic::{AcquisitionFunction, UpperConfidenceBound};
//! use acqbox_gp::{correlation_models::Matern32Corr, FixedNoiseGp};
//! use ndarray::{array, Array};
//!
//! let xt = array![[0.], [1.], [2.], [3.]];
//! let yt = array![0., 1., 1.5, 0.9];
//! let gp = FixedNoiseGp::params(Matern32Corr::default())
//!     .fit(&xt, &yt, &Array::from_elem(4, 1e-3))
//!     .expect("GP fitted");
//!
//! let ucb = UpperConfidenceBound::new(&gp, 2., true).expect("valid beta");
//! let x = Array::linspace(0., 3., 31).into_shape((31, 1, 1)).unwrap();
//! let scores = ucb.value(&x.into_dyn().view()).expect("UCB scores");
//! assert_eq!(scores.shape(), &[31]);
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

mod acquisition;
mod constraints;
pub mod criteria;
mod errors;
mod objective;
mod utils;

#[cfg(test)]
mod test_utils;

pub use acquisition::*;
pub use constraints::*;
pub use criteria::*;
pub use errors::*;
pub use objective::*;
pub use utils::{norm_cdf, norm_pdf};
