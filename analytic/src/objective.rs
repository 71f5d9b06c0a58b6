use crate::errors::{AcqError, Result};
use acqbox_gp::MultivariateNormal;
use linfa::Float;
use ndarray::{Array, Array1, Array2, Array3, Dimension, Ix1};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// An affine scalarization `offset + sum_j weights_j * y_j` of the `t` outputs of a posterior.
///
/// Applied to a `(batch.., q, t)` posterior it gives the `(batch.., q, 1)` posterior
/// with mean `offset + mean.weights` and covariance `W^T.cov.W`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct ScalarizedObjective {
    weights: Array1<f64>,
    offset: f64,
}

impl ScalarizedObjective {
    /// Constructor given a one-dimensional weights array and an offset
    pub fn new<D: Dimension>(weights: Array<f64, D>, offset: f64) -> Result<Self> {
        if weights.ndim() != 1 {
            return Err(AcqError::InvalidConfigError(format!(
                "Scalarization weights should be one-dimensional, got shape {:?}",
                weights.shape()
            )));
        }
        let weights = weights
            .into_dimensionality::<Ix1>()
            .map_err(|e| AcqError::InvalidConfigError(e.to_string()))?;
        if weights.is_empty() {
            return Err(AcqError::InvalidConfigError(
                "Scalarization weights should not be empty".to_string(),
            ));
        }
        if !offset.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(AcqError::InvalidConfigError(
                "Scalarization weights and offset should be finite".to_string(),
            ));
        }
        Ok(ScalarizedObjective { weights, offset })
    }

    /// Scalarization weights
    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    /// Scalarization offset
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Single output posterior resulting from the scalarization of the given posterior
    pub fn apply<F: Float>(
        &self,
        posterior: &MultivariateNormal<F>,
    ) -> Result<MultivariateNormal<F>> {
        let (q, t) = posterior.event_shape();
        if t != self.weights.len() {
            return Err(AcqError::ShapeError(format!(
                "Scalarization weights ({}) do not match the number of outputs ({})",
                self.weights.len(),
                t
            )));
        }
        let w = self.weights.mapv(F::cast);
        let offset = F::cast(self.offset);

        // block matrix W (q*t, q) such that W[i*t + j, i] = w_j
        let mut wmat = Array2::zeros((q * t, q));
        for i in 0..q {
            for j in 0..t {
                wmat[[i * t + j, i]] = w[j];
            }
        }

        let (means, covs) = posterior.to_batches()?;
        let n = means.len_of(ndarray::Axis(0));
        let mut scal_means = Array3::zeros((n, q, 1));
        let mut scal_covs = Array3::zeros((n, q, q));
        for (b, (mean, cov)) in means.outer_iter().zip(covs.outer_iter()).enumerate() {
            let m = mean.dot(&w) + offset;
            scal_means
                .index_axis_mut(ndarray::Axis(0), b)
                .assign(&m.insert_axis(ndarray::Axis(1)));
            scal_covs
                .index_axis_mut(ndarray::Axis(0), b)
                .assign(&wmat.t().dot(&cov).dot(&wmat));
        }
        Ok(MultivariateNormal::from_batches(
            posterior.batch_shape(),
            scal_means,
            scal_covs,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array, Array0, ArrayD, Axis, IxDyn};

    // posterior with a full covariance over q = 2 points and t outputs
    fn posterior(batch_shape: &[usize], t: usize) -> MultivariateNormal<f64> {
        let q = 2;
        let n: usize = batch_shape.iter().product();
        let mean = Array::from_shape_fn((n, q, t), |(b, i, j)| {
            b as f64 + 0.5 * i as f64 - j as f64
        });
        let mut cov = Array3::zeros((n, q * t, q * t));
        for b in 0..n {
            let a = Array::from_shape_fn((q * t, q * t), |(i, j)| {
                ((i + 1) * (j + 2) + b) as f64 / 10. + if i == j { 1. } else { 0. }
            });
            cov.index_axis_mut(Axis(0), b).assign(&a.t().dot(&a));
        }
        MultivariateNormal::from_batches(batch_shape, mean, cov).unwrap()
    }

    fn check_linearity(batch_shape: &[usize], weights: Array1<f64>) {
        let t = weights.len();
        let offset = 0.7;
        let post = posterior(batch_shape, t);
        let obj = ScalarizedObjective::new(weights.clone(), offset).unwrap();
        let scal = obj.apply(&post).unwrap();
        assert_eq!(scal.batch_shape(), batch_shape);
        assert_eq!(scal.event_shape(), (2, 1));

        let (means, covs) = post.to_batches().unwrap();
        let (smeans, scovs) = scal.to_batches().unwrap();
        for b in 0..means.len_of(Axis(0)) {
            let cov = covs.index_axis(Axis(0), b);
            for i in 0..2 {
                // mean: c + mean . w
                let mut expected = offset;
                for j in 0..t {
                    expected += means[[b, i, j]] * weights[j];
                }
                assert_abs_diff_eq!(smeans[[b, i, 0]], expected, epsilon = 1e-10);
                // covariance: sum_jk w_j w_k cov[i*t+j, l*t+k]
                for l in 0..2 {
                    let mut expected = 0.;
                    for j in 0..t {
                        for k in 0..t {
                            expected += weights[j] * weights[k] * cov[[i * t + j, l * t + k]];
                        }
                    }
                    assert_abs_diff_eq!(scovs[[b, i, l]], expected, epsilon = 1e-10);
                }
            }
        }
    }

    #[test]
    fn test_scalarization_linearity() {
        check_linearity(&[], array![2.]);
        check_linearity(&[], array![1., -0.5]);
        check_linearity(&[3], array![2.]);
        check_linearity(&[3], array![1., -0.5]);
    }

    #[test]
    fn test_scalarization_variance() {
        // two independent outputs: var = w1^2 v1 + w2^2 v2
        let mean = array![[[1., 2.]]].into_dyn();
        let var = array![[[0.5, 2.]]].into_dyn();
        let post = MultivariateNormal::from_independent(mean, var).unwrap();
        let obj = ScalarizedObjective::new(array![3., -1.], 1.).unwrap();
        let scal = obj.apply(&post).unwrap();
        assert_abs_diff_eq!(scal.mean()[[0, 0, 0]], 1. + 3. - 2., epsilon = 1e-12);
        assert_abs_diff_eq!(scal.variance()[[0, 0, 0]], 9. * 0.5 + 2., epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_weights() {
        assert!(matches!(
            ScalarizedObjective::new(array![[1., 2.]], 0.),
            Err(AcqError::InvalidConfigError(_))
        ));
        assert!(matches!(
            ScalarizedObjective::new(Array0::from_elem((), 1.), 0.),
            Err(AcqError::InvalidConfigError(_))
        ));
        assert!(ScalarizedObjective::new(ArrayD::<f64>::zeros(IxDyn(&[0])), 0.).is_err());
        assert!(ScalarizedObjective::new(array![1., f64::NAN], 0.).is_err());
        assert!(ScalarizedObjective::new(array![1.], f64::INFINITY).is_err());
    }

    #[test]
    fn test_outputs_mismatch() {
        let post = posterior(&[], 2);
        let obj = ScalarizedObjective::new(array![1., 2., 3.], 0.).unwrap();
        assert!(matches!(obj.apply(&post), Err(AcqError::ShapeError(_))));
    }
}
