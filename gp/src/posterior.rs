//! Gaussian posterior distribution returned by surrogates.

use crate::errors::{GpError, Result};
use crate::utils::{batch_len, with_tail};
use linfa::Float;
use ndarray::{Array3, ArrayD, Dimension, IxDyn};

/// A (batched) multivariate normal distribution over `q` points and `t` outputs.
///
/// * `mean` is shaped `(batch.., q, t)`,
/// * `covariance` is the joint covariance over the `q * t` values, shaped
///   `(batch.., q * t, q * t)`, the value of output `j` at point `i` being
///   stored at index `i * t + j`.
#[derive(Clone, Debug, PartialEq)]
pub struct MultivariateNormal<F: Float> {
    mean: ArrayD<F>,
    covariance: ArrayD<F>,
}

impl<F: Float> MultivariateNormal<F> {
    /// Constructor given mean `(batch.., q, t)` and joint covariance `(batch.., q*t, q*t)`
    pub fn new(mean: ArrayD<F>, covariance: ArrayD<F>) -> Result<Self> {
        let nd = mean.ndim();
        if nd < 2 {
            return Err(GpError::InvalidValueError(format!(
                "Posterior mean should be at least (q, t) shaped, got {:?}",
                mean.shape()
            )));
        }
        let (q, t) = (mean.shape()[nd - 2], mean.shape()[nd - 1]);
        let expected = with_tail(&mean.shape()[..nd - 2], &[q * t, q * t]);
        if covariance.shape() != expected.as_slice() {
            return Err(GpError::InvalidValueError(format!(
                "Posterior covariance shape {:?} does not match mean shape {:?} (expected {:?})",
                covariance.shape(),
                mean.shape(),
                expected
            )));
        }
        Ok(MultivariateNormal {
            mean: mean.as_standard_layout().into_owned(),
            covariance: covariance.as_standard_layout().into_owned(),
        })
    }

    /// Constructor of a posterior with independent marginals given mean and variance
    /// both shaped `(batch.., q, t)`
    pub fn from_independent(mean: ArrayD<F>, variance: ArrayD<F>) -> Result<Self> {
        if mean.shape() != variance.shape() || mean.ndim() < 2 {
            return Err(GpError::InvalidValueError(format!(
                "Mean {:?} and variance {:?} should share the same (batch.., q, t) shape",
                mean.shape(),
                variance.shape()
            )));
        }
        let nd = mean.ndim();
        let batch_shape = mean.shape()[..nd - 2].to_vec();
        let qt = mean.shape()[nd - 2] * mean.shape()[nd - 1];
        let n = batch_len(&batch_shape);

        let variance = variance
            .as_standard_layout()
            .into_owned()
            .into_shape((n, qt))?;
        let mut covariance = Array3::zeros((n, qt, qt));
        for (mut cov, var) in covariance.outer_iter_mut().zip(variance.outer_iter()) {
            cov.diag_mut().assign(&var);
        }
        let covariance = covariance.into_shape(with_tail(&batch_shape, &[qt, qt]))?;
        Self::new(mean, covariance)
    }

    /// Constructor from flattened batches: `mean` as `(n, q, t)` and `covariance` as
    /// `(n, q*t, q*t)` where `n` is the number of elements of `batch_shape`
    pub fn from_batches(
        batch_shape: &[usize],
        mean: Array3<F>,
        covariance: Array3<F>,
    ) -> Result<Self> {
        let (_, q, t) = mean.dim();
        let mean = mean.into_shape(with_tail(batch_shape, &[q, t]))?;
        let covariance = covariance.into_shape(with_tail(batch_shape, &[q * t, q * t]))?;
        Self::new(mean, covariance)
    }

    /// Flattened batches: mean `(n, q, t)` and covariance `(n, q*t, q*t)`
    pub fn to_batches(&self) -> Result<(Array3<F>, Array3<F>)> {
        let n = batch_len(self.batch_shape());
        let (q, t) = self.event_shape();
        let mean = self.mean.to_owned().into_shape((n, q, t))?;
        let covariance = self.covariance.to_owned().into_shape((n, q * t, q * t))?;
        Ok((mean, covariance))
    }

    /// Posterior mean `(batch.., q, t)`
    pub fn mean(&self) -> &ArrayD<F> {
        &self.mean
    }

    /// Joint covariance `(batch.., q*t, q*t)`
    pub fn covariance(&self) -> &ArrayD<F> {
        &self.covariance
    }

    /// Marginal variances `(batch.., q, t)` taken from the covariance diagonal
    pub fn variance(&self) -> ArrayD<F> {
        let nd = self.mean.ndim();
        let t = self.mean.shape()[nd - 1];
        ArrayD::from_shape_fn(self.mean.raw_dim(), |idx: IxDyn| {
            let mut cidx = idx.slice().to_vec();
            let a = cidx[nd - 2] * t + cidx[nd - 1];
            cidx[nd - 2] = a;
            cidx[nd - 1] = a;
            self.covariance[IxDyn(&cidx)]
        })
    }

    /// Leading batch dimensions
    pub fn batch_shape(&self) -> &[usize] {
        &self.mean.shape()[..self.mean.ndim() - 2]
    }

    /// Number of points and number of outputs `(q, t)`
    pub fn event_shape(&self) -> (usize, usize) {
        let nd = self.mean.ndim();
        (self.mean.shape()[nd - 2], self.mean.shape()[nd - 1])
    }

    /// Number of outputs `t`
    pub fn num_outputs(&self) -> usize {
        self.event_shape().1
    }
}
