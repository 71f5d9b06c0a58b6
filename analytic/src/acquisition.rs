use crate::errors::{AcqError, Result};
use crate::objective::ScalarizedObjective;
use acqbox_gp::{MultivariateNormal, Surrogate};
use linfa::Float;
use ndarray::{Array, ArrayD, ArrayViewD, Axis, Dimension, IxDyn};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};

/// A trait for analytic acquisition functions scoring candidate points
/// with regards to a surrogate posterior. Higher is better whatever
/// the optimization direction.
pub trait AcquisitionFunction<F: Float> {
    /// Name of the acquisition function
    fn name(&self) -> &'static str;

    /// Acquisition values at given `x` points shaped `(batch.., 1, d)`:
    /// one candidate point per batch element.
    ///
    /// Returns values shaped as the posterior batch shape, that is
    /// `(batch..)` for a non batched model.
    fn value(&self, x: &ArrayViewD<F>) -> Result<ArrayD<F>>;

    /// Register points under evaluation, analytic acquisition functions
    /// only score independent candidates and do not support pending points.
    fn set_pending_points(&mut self, _x_pending: Option<ArrayViewD<F>>) -> Result<()> {
        Err(AcqError::UnsupportedError(format!(
            "Analytic acquisition function {} does not account for pending points",
            self.name()
        )))
    }
}

/// A parameter given either as a scalar or as a tensor broadcastable
/// against the batch shape of the candidate points
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum BatchParam {
    /// Same value for every batch element
    Scalar(f64),
    /// Values broadcast against the batch shape
    Batch(ArrayD<f64>),
}

impl From<f64> for BatchParam {
    fn from(value: f64) -> Self {
        BatchParam::Scalar(value)
    }
}

impl<D: Dimension> From<Array<f64, D>> for BatchParam {
    fn from(values: Array<f64, D>) -> Self {
        BatchParam::Batch(values.into_dyn())
    }
}

impl BatchParam {
    /// Parameter values cast to the candidate element type and broadcast
    /// against the given batch shape
    pub fn ensure_compatible<F: Float>(&self, batch_shape: &[usize]) -> Result<ArrayD<F>> {
        match self {
            BatchParam::Scalar(v) => Ok(ArrayD::from_elem(IxDyn(batch_shape), F::cast(*v))),
            BatchParam::Batch(values) => values
                .broadcast(IxDyn(batch_shape))
                .map(|b| b.mapv(F::cast))
                .ok_or_else(|| {
                    AcqError::ShapeError(format!(
                        "Parameter of shape {:?} cannot be broadcast to batch shape {:?}",
                        values.shape(),
                        batch_shape
                    ))
                }),
        }
    }

    /// Whether every value satisfies the predicate
    pub(crate) fn all(&self, pred: impl Fn(f64) -> bool) -> bool {
        match self {
            BatchParam::Scalar(v) => pred(*v),
            BatchParam::Batch(values) => values.iter().all(|v| pred(*v)),
        }
    }
}

/// Check candidates are shaped `(batch.., 1, d)`
pub(crate) fn check_single_point<F: Float>(x: &ArrayViewD<F>, name: &str) -> Result<()> {
    let nd = x.ndim();
    if nd < 2 || x.shape()[nd - 2] != 1 {
        return Err(AcqError::ShapeError(format!(
            "{} expects candidates shaped (batch.., 1, d), got {:?}",
            name,
            x.shape()
        )));
    }
    Ok(())
}

/// Posterior of the `model` at `x` scalarized by the optional `objective`.
///
/// When `require_single_output` is set, the resulting posterior must have
/// exactly one output.
pub fn get_posterior<F: Float>(
    model: &dyn Surrogate<F>,
    objective: Option<&ScalarizedObjective>,
    x: &ArrayViewD<F>,
    require_single_output: bool,
) -> Result<MultivariateNormal<F>> {
    let posterior = model.posterior(x)?;
    let posterior = match objective {
        Some(objective) => objective.apply(&posterior)?,
        None => posterior,
    };
    if require_single_output && posterior.num_outputs() != 1 {
        return Err(AcqError::ShapeError(format!(
            "Expected a single output posterior, got {} outputs; use a scalarized objective",
            posterior.num_outputs()
        )));
    }
    Ok(posterior)
}

/// Per output means and variances `(batch.., t)` at the single point of a
/// `(batch.., 1, t)` posterior
pub(crate) fn point_moments<F: Float>(posterior: &MultivariateNormal<F>) -> (ArrayD<F>, ArrayD<F>) {
    let axis = Axis(posterior.mean().ndim() - 2);
    let mean = posterior.mean().index_axis(axis, 0).to_owned();
    let variance = posterior.variance().index_axis_move(axis, 0);
    (mean, variance)
}

/// Mean and variance `(batch..)` of a single output posterior at a single point
pub(crate) fn scalar_moments<F: Float>(
    posterior: &MultivariateNormal<F>,
) -> (ArrayD<F>, ArrayD<F>) {
    let (mean, variance) = point_moments(posterior);
    let last = Axis(mean.ndim() - 1);
    (
        mean.index_axis_move(last, 0),
        variance.index_axis_move(last, 0),
    )
}
