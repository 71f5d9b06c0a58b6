use crate::errors::{GpError, Result};
use crate::posterior::MultivariateNormal;
use linfa::Float;
use ndarray::{Array2, Array3, ArrayViewD};
use std::fmt;

/// A probabilistic model exposing a gaussian posterior over its outputs.
///
/// Inputs are shaped `(batch.., q, d)` and the returned posterior is shaped
/// `(batch.., q, t)`, the model own batch dimensions being broadcast against
/// the input ones.
pub trait Surrogate<F: Float>: fmt::Display {
    /// Dimension `d` of the input space
    fn input_dim(&self) -> usize;

    /// Number `t` of modeled outputs
    fn num_outputs(&self) -> usize;

    /// Batch shape of the model, empty for a single model
    fn batch_shape(&self) -> Vec<usize> {
        vec![]
    }

    /// Posterior distribution at given `x` points
    fn posterior(&self, x: &ArrayViewD<F>) -> Result<MultivariateNormal<F>>;

    /// Whether the model carries a fixed known observation noise and can be
    /// conditioned on noiseless fantasies.
    fn supports_fixed_noise(&self) -> bool {
        false
    }

    /// Build a batched model of the same kind and hyperparameters trained on
    /// `x` `(nb, m, d)` and `y` `(nb, m)` with a negligible observation noise.
    fn condition_noiseless(&self, _x: &Array3<F>, _y: &Array2<F>) -> Result<Box<dyn Surrogate<F>>> {
        Err(GpError::UnsupportedError(format!(
            "{} cannot be conditioned on noiseless fantasies",
            self
        )))
    }
}
