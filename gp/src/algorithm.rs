use crate::correlation_models::*;
use crate::errors::{GpError, Result};
use crate::parameters::{FixedNoiseGpParams, GpHyperparameters, FANTASY_NOISE_VARIANCE};
use crate::posterior::MultivariateNormal;
use crate::surrogate::Surrogate;
use crate::utils::{batch_len, pairwise_differences, with_tail};

use linfa::{Float, ParamGuard};
use linfa_linalg::{cholesky::*, triangular::*};
use ndarray::{
    s, Array1, Array2, Array3, ArrayBase, ArrayView1, ArrayView2, ArrayViewD, Axis, Data, Ix1,
    Ix2, Zip,
};

use log::debug;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal parameters computed at training time
/// used later on in posterior computations
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(deserialize = "F: Deserialize<'de>"))
)]
pub(crate) struct GpInnerParams<F: Float> {
    /// Cholesky decomposition of the noisy covariance matrix \[K + diag(noise)\]
    r_chol: Array2<F>,
    /// Gaussian Process weights \[K + diag(noise)\]^-1 (y - mean)
    gamma: Array1<F>,
}

/// A single output GP regression model with a constant mean, given hyperparameters
/// and a known (fixed) observation noise variance for each training point.
///
/// The model is either a single model or a batch of `nb` independent models sharing
/// the same hyperparameters, each one trained on its own data. The latter is
/// the result of conditioning on fantasized observations.
///
/// The prior is
///
/// `Y(x) = mean + Z(x)`, `cov(Z(x), Z(x')) = sigma2 * corr(x - x')`
///
/// and observations are `y_i = Y(x_i) + e_i` with `e_i ~ Normal(0, yvar_i)`.
///
/// # Example
///
/// ```
/// use acqbox_gp::{correlation_models::SquaredExponentialCorr, FixedNoiseGp, Surrogate};
/// use ndarray::array;
///
/// let xt = array![[0.], [0.5], [1.]];
/// let yt = array![0., 1., 0.5];
/// let yvar = array![1e-4, 1e-4, 1e-4];
///
/// let gp = FixedNoiseGp::params(SquaredExponentialCorr::default())
///     .theta(array![2.])
///     .fit(&xt, &yt, &yvar)
///     .expect("GP fitted");
///
/// let posterior = gp.posterior(&array![[0.25]].into_dyn().view()).expect("posterior");
/// assert_eq!(posterior.mean().shape(), &[1, 1]);
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(
        serialize = "F: Serialize, Corr: Serialize",
        deserialize = "F: Deserialize<'de>, Corr: Deserialize<'de>"
    ))
)]
pub struct FixedNoiseGp<F: Float, Corr: CorrelationModel<F>> {
    /// Hyperparameters shared by every model of the batch
    hyper: GpHyperparameters<F, Corr>,
    /// Batch size, None for a single model
    batch: Option<usize>,
    /// Training inputs (nb, m, d)
    xtrain: Array3<F>,
    /// Training outputs (nb, m)
    ytrain: Array2<F>,
    /// Observation noise variances (nb, m)
    yvar: Array2<F>,
    /// One set of inner parameters per model of the batch
    inner_params: Vec<GpInnerParams<F>>,
}

impl<F: Float, Corr: CorrelationModel<F>> FixedNoiseGp<F, Corr> {
    /// Gp parameters constructor
    pub fn params(corr: Corr) -> FixedNoiseGpParams<F, Corr> {
        FixedNoiseGpParams::new(corr)
    }

    /// Build a batch of `nb` models sharing the given hyperparameters,
    /// `x` being `(nb, m, d)`, `y` and `yvar` being `(nb, m)`.
    pub fn from_hyperparameters(
        hyper: GpHyperparameters<F, Corr>,
        x: Array3<F>,
        y: Array2<F>,
        yvar: Array2<F>,
    ) -> Result<Self> {
        let nb = x.len_of(Axis(0));
        Self::train(hyper, Some(nb), x, y, yvar)
    }

    fn train(
        hyper: GpHyperparameters<F, Corr>,
        batch: Option<usize>,
        xtrain: Array3<F>,
        ytrain: Array2<F>,
        yvar: Array2<F>,
    ) -> Result<Self> {
        let (nb, m, d) = xtrain.dim();
        if nb == 0 || m == 0 {
            return Err(GpError::InvalidValueError(format!(
                "Training data should not be empty, got inputs of shape {:?}",
                xtrain.shape()
            )));
        }
        if d != hyper.input_dim() {
            return Err(GpError::InvalidValueError(format!(
                "Training input dimension ({}) does not match theta length ({})",
                d,
                hyper.input_dim()
            )));
        }
        if ytrain.dim() != (nb, m) || yvar.dim() != (nb, m) {
            return Err(GpError::InvalidValueError(format!(
                "Training outputs {:?} and noise {:?} should be shaped ({}, {})",
                ytrain.shape(),
                yvar.shape(),
                nb,
                m
            )));
        }
        if yvar.iter().any(|v| !v.is_finite() || *v < F::zero()) {
            return Err(GpError::InvalidValueError(
                "Observation noise variances should be finite and non negative".to_string(),
            ));
        }

        let inner_params = xtrain
            .outer_iter()
            .zip(ytrain.outer_iter())
            .zip(yvar.outer_iter())
            .map(|((x, y), v)| Self::train_inner(&hyper, &x, &y, &v))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "FixedNoiseGp trained: {} model(s) on {} point(s) in dimension {}",
            nb, m, d
        );

        Ok(FixedNoiseGp {
            hyper,
            batch,
            xtrain,
            ytrain,
            yvar,
            inner_params,
        })
    }

    fn train_inner(
        hyper: &GpHyperparameters<F, Corr>,
        x: &ArrayView2<F>,
        y: &ArrayView1<F>,
        yvar: &ArrayView1<F>,
    ) -> Result<GpInnerParams<F>> {
        let mut k = Self::covariance(hyper, x, x)?;
        Zip::from(k.diag_mut()).and(yvar).for_each(|k_ii, v| *k_ii += *v);
        let r_chol = k.cholesky()?;

        let centered = (y - hyper.constant_mean).insert_axis(Axis(1));
        let a = r_chol.solve_triangular(&centered, UPLO::Lower)?;
        let gamma = r_chol.t().solve_triangular(&a, UPLO::Upper)?;
        Ok(GpInnerParams {
            r_chol,
            gamma: gamma.index_axis_move(Axis(1), 0),
        })
    }

    /// Prior covariance `sigma2 * corr(a_i - b_j)` between rows of `a` and rows of `b`
    fn covariance(
        hyper: &GpHyperparameters<F, Corr>,
        a: &ArrayBase<impl Data<Elem = F>, Ix2>,
        b: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<Array2<F>> {
        let d = pairwise_differences(a, b);
        let r = hyper.corr.value(&d, &hyper.theta) * hyper.sigma2;
        Ok(r.into_shape((a.nrows(), b.nrows()))?)
    }

    /// Posterior mean (q) and covariance (q, q) of the `k`-th model at `x` (q, d)
    fn posterior_at(&self, k: usize, x: &ArrayView2<F>) -> Result<(Array1<F>, Array2<F>)> {
        let inner = &self.inner_params[k];
        let xt = self.xtrain.index_axis(Axis(0), k);

        let kxt = Self::covariance(&self.hyper, x, &xt)?;
        let mean = kxt.dot(&inner.gamma) + self.hyper.constant_mean;

        let v = inner.r_chol.solve_triangular(&kxt.t(), UPLO::Lower)?;
        let mut cov = Self::covariance(&self.hyper, x, x)? - v.t().dot(&v);
        cov.diag_mut().mapv_inplace(|c| c.max(F::zero()));
        Ok((mean, cov))
    }

    /// Map each output batch element to a (flattened input batch index, model index) pair
    /// and compute the output batch shape.
    ///
    /// A single model keeps the input batch shape. A batch of `nb` models requires
    /// the last input batch dimension to be 1 or `nb` (or no batch dimension at all)
    /// and the output batch shape ends with `nb`.
    fn broadcast_batch(&self, x_batch: &[usize]) -> Result<(Vec<usize>, Vec<(usize, usize)>)> {
        match self.batch {
            None => Ok((
                x_batch.to_vec(),
                (0..batch_len(x_batch)).map(|i| (i, 0)).collect(),
            )),
            Some(nb) => {
                let (prefix, last) = match x_batch.split_last() {
                    None => (x_batch, 1),
                    Some((last, prefix)) if *last == 1 || *last == nb => (prefix, *last),
                    Some(_) => {
                        return Err(GpError::InvalidValueError(format!(
                            "Input batch shape {:?} cannot be broadcast with model batch size {}",
                            x_batch, nb
                        )))
                    }
                };
                let pairs = (0..batch_len(prefix))
                    .flat_map(|p| {
                        (0..nb).map(move |k| (p * last + if last == 1 { 0 } else { k }, k))
                    })
                    .collect();
                Ok((with_tail(prefix, &[nb]), pairs))
            }
        }
    }

    /// Hyperparameters snapshot
    pub fn hyperparameters(&self) -> &GpHyperparameters<F, Corr> {
        &self.hyper
    }

    /// Number of models in the batch, None for a single model
    pub fn batch_size(&self) -> Option<usize> {
        self.batch
    }

    /// Training inputs `(nb, m, d)`, nb being 1 for a single model
    pub fn training_inputs(&self) -> &Array3<F> {
        &self.xtrain
    }

    /// Training outputs `(nb, m)`
    pub fn training_outputs(&self) -> &Array2<F> {
        &self.ytrain
    }

    /// Observation noise variances `(nb, m)`
    pub fn training_noise(&self) -> &Array2<F> {
        &self.yvar
    }
}

impl<F: Float, Corr: CorrelationModel<F>> fmt::Display for FixedNoiseGp<F, Corr> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "FixedNoiseGp(corr={}, theta={}, mean={}, sigma2={}",
            self.hyper.corr, self.hyper.theta, self.hyper.constant_mean, self.hyper.sigma2
        )?;
        if let Some(nb) = self.batch {
            write!(f, ", batch={}", nb)?;
        }
        write!(f, ")")
    }
}

impl<F: Float, Corr: CorrelationModel<F>> Surrogate<F> for FixedNoiseGp<F, Corr> {
    fn input_dim(&self) -> usize {
        self.hyper.input_dim()
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn batch_shape(&self) -> Vec<usize> {
        self.batch.map(|nb| vec![nb]).unwrap_or_default()
    }

    fn posterior(&self, x: &ArrayViewD<F>) -> Result<MultivariateNormal<F>> {
        let nd = x.ndim();
        if nd < 2 {
            return Err(GpError::InvalidValueError(format!(
                "Input points should be at least (q, d) shaped, got {:?}",
                x.shape()
            )));
        }
        let (q, d) = (x.shape()[nd - 2], x.shape()[nd - 1]);
        if d != self.input_dim() {
            return Err(GpError::InvalidValueError(format!(
                "Input dimension ({}) does not match model input dimension ({})",
                d,
                self.input_dim()
            )));
        }
        let x_batch = &x.shape()[..nd - 2];
        let xs = x
            .as_standard_layout()
            .into_owned()
            .into_shape((batch_len(x_batch), q, d))?;
        let (out_batch, pairs) = self.broadcast_batch(x_batch)?;

        let mut mean = Array3::zeros((pairs.len(), q, 1));
        let mut cov = Array3::zeros((pairs.len(), q, q));
        for (i, (ix, k)) in pairs.into_iter().enumerate() {
            let (m, c) = self.posterior_at(k, &xs.index_axis(Axis(0), ix))?;
            mean.slice_mut(s![i, .., 0]).assign(&m);
            cov.index_axis_mut(Axis(0), i).assign(&c);
        }
        MultivariateNormal::from_batches(&out_batch, mean, cov)
    }

    fn supports_fixed_noise(&self) -> bool {
        true
    }

    fn condition_noiseless(&self, x: &Array3<F>, y: &Array2<F>) -> Result<Box<dyn Surrogate<F>>> {
        debug!(
            "Condition {} on {} fantasy set(s) of {} point(s)",
            self,
            y.nrows(),
            y.ncols()
        );
        let noise = Array2::from_elem(y.dim(), F::cast(FANTASY_NOISE_VARIANCE));
        let gp = FixedNoiseGp::from_hyperparameters(
            self.hyper.clone(),
            x.to_owned(),
            y.to_owned(),
            noise,
        )?;
        Ok(Box::new(gp))
    }
}

impl<F: Float, Corr: CorrelationModel<F>> FixedNoiseGpParams<F, Corr> {
    /// Fit a single model on `x` (m, d) with outputs `y` (m) observed
    /// with noise variances `yvar` (m)
    pub fn fit(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
        yvar: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<FixedNoiseGp<F, Corr>> {
        let hyper = self.check_ref()?.clone();
        FixedNoiseGp::train(
            hyper,
            None,
            x.to_owned().insert_axis(Axis(0)),
            y.to_owned().insert_axis(Axis(0)),
            yvar.to_owned().insert_axis(Axis(0)),
        )
    }
}
