use crate::acquisition::{check_single_point, get_posterior, scalar_moments, AcquisitionFunction};
use crate::errors::Result;
use crate::objective::ScalarizedObjective;
use acqbox_gp::Surrogate;
use linfa::Float;
use ndarray::{ArrayD, ArrayViewD};

/// Single-outcome Posterior Mean.
///
/// Only supports the case of q=1. Pure exploitation criterion: the value
/// is the (possibly scalarized) posterior mean.
pub struct PosteriorMean<'a, F: Float> {
    model: &'a dyn Surrogate<F>,
    objective: Option<ScalarizedObjective>,
}

impl<'a, F: Float> PosteriorMean<'a, F> {
    /// Constructor given the `model`
    pub fn new(model: &'a dyn Surrogate<F>) -> Self {
        PosteriorMean {
            model,
            objective: None,
        }
    }

    /// Sets a scalarization of the model outputs
    pub fn objective(mut self, objective: ScalarizedObjective) -> Self {
        self.objective = Some(objective);
        self
    }
}

impl<'a, F: Float> AcquisitionFunction<F> for PosteriorMean<'a, F> {
    fn name(&self) -> &'static str {
        "PM"
    }

    fn value(&self, x: &ArrayViewD<F>) -> Result<ArrayD<F>> {
        check_single_point(x, self.name())?;
        let posterior = get_posterior(self.model, self.objective.as_ref(), x, true)?;
        let (mean, _) = scalar_moments(&posterior);
        Ok(mean)
    }
}
