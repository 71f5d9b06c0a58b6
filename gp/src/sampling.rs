//! Joint sampling of gaussian posteriors.

use crate::errors::{GpError, Result};
use crate::posterior::MultivariateNormal;
use crate::utils::with_tail;
use linfa::Float;
use linfa_linalg::{cholesky::*, eigh::*};
use log::warn;
use ndarray::{s, Array, Array1, Array2, Array3, ArrayD};
use ndarray_rand::{rand::Rng, rand::SeedableRng, rand_distr::StandardNormal, RandomExt};
use rand_xoshiro::Xoshiro256Plus;
use std::sync::{Arc, RwLock};

/// Factorization used to get `C` such that `C.C^T = covariance`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SamplingMethod {
    /// Cholesky decomposition, falls back to eigenvalues when the
    /// covariance is not numerically positive definite
    #[default]
    Cholesky,
    /// Eigenvalues decomposition, eigenvalues lower than 1e-9 being zeroed
    EigenValues,
}

/// A trait for drawing joint samples out of a gaussian posterior
pub trait PosteriorSampler<F: Float> {
    /// Draw `n_samples` joint samples from the given posterior.
    ///
    /// Returns an array shaped `(n_samples, batch.., q, t)`.
    fn sample(&self, posterior: &MultivariateNormal<F>, n_samples: usize) -> Result<ArrayD<F>>;
}

type RngRef<R> = Arc<RwLock<R>>;

/// A sampler drawing `mean + C.z` samples where `z ~ Normal(0, I)`
#[derive(Clone, Debug)]
pub struct NormalSampler<R: Rng> {
    method: SamplingMethod,
    rng: RngRef<R>,
}

impl NormalSampler<Xoshiro256Plus> {
    /// Constructor with a random generator seeded from entropy
    pub fn new() -> Self {
        Self::new_with_rng(Xoshiro256Plus::from_entropy())
    }

    /// Constructor with a seeded random generator, for reproducibility
    pub fn seed_from_u64(seed: u64) -> Self {
        Self::new_with_rng(Xoshiro256Plus::seed_from_u64(seed))
    }
}

impl Default for NormalSampler<Xoshiro256Plus> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> NormalSampler<R> {
    /// Constructor given a random generator
    pub fn new_with_rng(rng: R) -> Self {
        NormalSampler {
            method: SamplingMethod::default(),
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    /// Sets the covariance factorization method
    pub fn method(mut self, method: SamplingMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the random generator
    pub fn with_rng<R2: Rng>(self, rng: R2) -> NormalSampler<R2> {
        NormalSampler {
            method: self.method,
            rng: Arc::new(RwLock::new(rng)),
        }
    }

    fn factor<F: Float>(&self, cov: &Array2<F>) -> Result<Array2<F>> {
        match self.method {
            SamplingMethod::Cholesky => match cov.cholesky() {
                Ok(c) => Ok(c),
                Err(err) => {
                    warn!("Cholesky decomposition error ({err}) while sampling, use eigenvalues");
                    eigen_factor(cov)
                }
            },
            SamplingMethod::EigenValues => eigen_factor(cov),
        }
    }
}

fn eigen_factor<F: Float>(cov: &Array2<F>) -> Result<Array2<F>> {
    let (v, w) = cov.to_owned().eigh_into()?;
    let v: Array1<F> = v.mapv(|x| {
        // lower bound at 1e-9
        if x < F::cast(1e-9) {
            return F::zero();
        }
        x.sqrt()
    });
    Ok(w.dot(&Array2::from_diag(&v)))
}

impl<F: Float, R: Rng> PosteriorSampler<F> for NormalSampler<R> {
    fn sample(&self, posterior: &MultivariateNormal<F>, n_samples: usize) -> Result<ArrayD<F>> {
        let (means, covs) = posterior.to_batches()?;
        let (n, q, t) = means.dim();
        let qt = q * t;

        let mut rng = self
            .rng
            .write()
            .map_err(|_| GpError::InvalidValueError("Poisoned random generator".to_string()))?;
        let mut samples = Array3::zeros((n_samples, n, qt));
        for (i, (mean, cov)) in means.outer_iter().zip(covs.outer_iter()).enumerate() {
            let c = self.factor(&cov.to_owned())?;
            let z = Array::random_using((qt, n_samples), StandardNormal, &mut *rng)
                .mapv(|v: f64| F::cast(v));
            let mean = mean.to_owned().into_shape((qt, 1))?;
            let draws = mean + c.dot(&z);
            samples.slice_mut(s![.., i, ..]).assign(&draws.t());
        }

        let shape = with_tail(
            &with_tail(&[n_samples], posterior.batch_shape()),
            &[q, t],
        );
        Ok(samples.into_shape(shape)?)
    }
}
