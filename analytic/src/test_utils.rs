use acqbox_gp::{GpError, MultivariateNormal, Surrogate};
use ndarray::{Array1, Array3, ArrayViewD};
use std::fmt;

/// A surrogate returning the same independent gaussian moments for every
/// candidate point, only the candidates batch shape matters.
pub(crate) struct MockSurrogate {
    mean: Array1<f64>,
    variance: Array1<f64>,
}

impl MockSurrogate {
    pub(crate) fn new(mean: Array1<f64>, variance: Array1<f64>) -> Self {
        MockSurrogate { mean, variance }
    }
}

impl fmt::Display for MockSurrogate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MockSurrogate(mean={}, variance={})", self.mean, self.variance)
    }
}

impl Surrogate<f64> for MockSurrogate {
    fn input_dim(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        self.mean.len()
    }

    fn posterior(&self, x: &ArrayViewD<f64>) -> acqbox_gp::Result<MultivariateNormal<f64>> {
        let nd = x.ndim();
        if nd < 2 {
            return Err(GpError::InvalidValueError("bad input".to_string()));
        }
        let batch_shape = &x.shape()[..nd - 2];
        let n: usize = batch_shape.iter().product();
        let q = x.shape()[nd - 2];
        let t = self.mean.len();
        let mean = Array3::from_shape_fn((n, q, t), |(_, _, j)| self.mean[j]);
        let mut cov = Array3::zeros((n, q * t, q * t));
        for b in 0..n {
            for i in 0..q {
                for j in 0..t {
                    cov[[b, i * t + j, i * t + j]] = self.variance[j];
                }
            }
        }
        MultivariateNormal::from_batches(batch_shape, mean, cov)
    }
}
