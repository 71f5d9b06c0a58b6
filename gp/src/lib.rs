//! This library implements the probabilistic model side of analytic Bayesian optimization
//! acquisition functions:
//!
//! * [Surrogate] is the interface of a model exposing a gaussian posterior
//!   ([MultivariateNormal]) over its outputs at batches of candidate points,
//! * [FixedNoiseGp] is a constant mean [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process)
//!   regression model with given hyperparameters ([FixedNoiseGpParams]) and known observation noise,
//!   possibly batched, which can be conditioned on fantasized noiseless observations,
//! * [PosteriorSampler] draws joint samples out of a posterior, [NormalSampler] being
//!   the default implementation.
//!
//! # Example
//!
//! ```
//! use acqbox_gp::correlation_models::Matern52Corr;
//! use acqbox_gp::{FixedNoiseGp, NormalSampler, PosteriorSampler, Surrogate};
//! use ndarray::array;
//!
//! let xt = array![[0.], [1.], [2.]];
//! let yt = array![0., 1., 0.];
//! let gp = FixedNoiseGp::params(Matern52Corr::default())
//!     .theta(array![1.])
//!     .fit(&xt, &yt, &array![0.01, 0.01, 0.01])
//!     .expect("GP fitted");
//!
//! let posterior = gp.posterior(&xt.view().into_dyn()).expect("posterior");
//! let draws = NormalSampler::seed_from_u64(42)
//!     .sample(&posterior, 16)
//!     .expect("samples");
//! assert_eq!(draws.shape(), &[16, 3, 1]);
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

mod algorithm;
pub mod correlation_models;
mod errors;
mod parameters;
mod posterior;
mod sampling;
mod surrogate;
mod utils;

pub use algorithm::*;
pub use errors::*;
pub use parameters::*;
pub use posterior::*;
pub use sampling::*;
pub use surrogate::*;
