use crate::correlation_models::{CorrelationModel, SquaredExponentialCorr};
use crate::errors::{GpError, Result};
use linfa::{Float, ParamGuard};
use ndarray::{array, Array1};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// Noise variance attached to fantasized observations
pub const FANTASY_NOISE_VARIANCE: f64 = 1e-7;

/// A set of validated hyperparameters of a [FixedNoiseGp](crate::FixedNoiseGp).
///
/// It is a plain value snapshot: cloning it is enough to build a new model
/// sharing the same hyperparameters on other training data.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(bound(
        serialize = "F: Serialize, Corr: Serialize",
        deserialize = "F: Deserialize<'de>, Corr: Deserialize<'de>"
    ))
)]
pub struct GpHyperparameters<F: Float, Corr: CorrelationModel<F>> {
    /// Inverse lengthscales of the correlation model, one per input component
    pub(crate) theta: Array1<F>,
    /// Constant prior mean
    pub(crate) constant_mean: F,
    /// Process variance
    pub(crate) sigma2: F,
    /// Correlation model
    pub(crate) corr: Corr,
}

impl<F: Float, Corr: CorrelationModel<F>> Default for GpHyperparameters<F, Corr> {
    fn default() -> GpHyperparameters<F, Corr> {
        GpHyperparameters {
            theta: array![F::one()],
            constant_mean: F::zero(),
            sigma2: F::one(),
            corr: Corr::default(),
        }
    }
}

impl<F: Float, Corr: CorrelationModel<F>> GpHyperparameters<F, Corr> {
    /// Get inverse lengthscales
    pub fn theta(&self) -> &Array1<F> {
        &self.theta
    }

    /// Get constant prior mean
    pub fn constant_mean(&self) -> F {
        self.constant_mean
    }

    /// Get process variance
    pub fn sigma2(&self) -> F {
        self.sigma2
    }

    /// Get correlation model
    pub fn corr(&self) -> &Corr {
        &self.corr
    }

    /// Expected input dimension
    pub fn input_dim(&self) -> usize {
        self.theta.len()
    }
}

#[derive(Clone, Debug)]
/// The set of hyperparameters that can be specified to build
/// a [FixedNoiseGp](crate::FixedNoiseGp).
///
/// Hyperparameters are given, not estimated.
pub struct FixedNoiseGpParams<F: Float, Corr: CorrelationModel<F>>(GpHyperparameters<F, Corr>);

impl<F: Float, Corr: CorrelationModel<F>> FixedNoiseGpParams<F, Corr> {
    /// A constructor for GP parameters given a correlation model
    pub fn new(corr: Corr) -> FixedNoiseGpParams<F, Corr> {
        Self(GpHyperparameters {
            corr,
            ..Default::default()
        })
    }

    /// A constructor for GP parameters from validated hyperparameters
    pub fn new_from_valid(hyper: &GpHyperparameters<F, Corr>) -> Self {
        Self(hyper.clone())
    }

    /// Set correlation model.
    pub fn corr(mut self, corr: Corr) -> Self {
        self.0.corr = corr;
        self
    }

    /// Set inverse lengthscales, its length gives the expected input dimension.
    pub fn theta(mut self, theta: Array1<F>) -> Self {
        self.0.theta = theta;
        self
    }

    /// Set the constant prior mean.
    pub fn constant_mean(mut self, constant_mean: F) -> Self {
        self.0.constant_mean = constant_mean;
        self
    }

    /// Set the process variance.
    pub fn sigma2(mut self, sigma2: F) -> Self {
        self.0.sigma2 = sigma2;
        self
    }
}

impl<F: Float> Default for FixedNoiseGpParams<F, SquaredExponentialCorr> {
    fn default() -> Self {
        Self::new(SquaredExponentialCorr::default())
    }
}

impl<F: Float, Corr: CorrelationModel<F>> From<GpHyperparameters<F, Corr>>
    for FixedNoiseGpParams<F, Corr>
{
    fn from(valid: GpHyperparameters<F, Corr>) -> Self {
        FixedNoiseGpParams(valid)
    }
}

impl<F: Float, Corr: CorrelationModel<F>> ParamGuard for FixedNoiseGpParams<F, Corr> {
    type Checked = GpHyperparameters<F, Corr>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let hyper = &self.0;
        if hyper.theta.is_empty() {
            return Err(GpError::InvalidValueError(
                "`theta` should not be empty".to_string(),
            ));
        }
        if hyper.theta.iter().any(|t| !t.is_finite() || *t <= F::zero()) {
            return Err(GpError::InvalidValueError(format!(
                "`theta` components should be finite and strictly positive, got {}",
                hyper.theta
            )));
        }
        if !hyper.sigma2.is_finite() || hyper.sigma2 <= F::zero() {
            return Err(GpError::InvalidValueError(format!(
                "`sigma2` should be finite and strictly positive, got {}",
                hyper.sigma2
            )));
        }
        if !hyper.constant_mean.is_finite() {
            return Err(GpError::InvalidValueError(format!(
                "`constant_mean` should be finite, got {}",
                hyper.constant_mean
            )));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
