use crate::acquisition::{
    check_single_point, get_posterior, scalar_moments, AcquisitionFunction, BatchParam,
};
use crate::errors::{AcqError, Result};
use crate::objective::ScalarizedObjective;
use acqbox_gp::Surrogate;
use linfa::Float;
use ndarray::{ArrayD, ArrayViewD, Zip};

/// Single-outcome Upper Confidence Bound.
///
/// Analytic upper confidence bound that comprises of the posterior mean plus an
/// additional term: the posterior standard deviation weighted by a trade-off
/// parameter `beta`. Only supports the case of q=1.
///
/// `UCB(x) = mu(x) + sqrt(beta) * sigma(x)`, the sign of the second term being
/// negative when minimizing.
pub struct UpperConfidenceBound<'a, F: Float> {
    model: &'a dyn Surrogate<F>,
    objective: Option<ScalarizedObjective>,
    beta: BatchParam,
    maximize: bool,
}

fn check_beta(beta: &BatchParam) -> Result<()> {
    if !beta.all(|b| b.is_finite() && b >= 0.) {
        return Err(AcqError::InvalidConfigError(format!(
            "UCB beta should be finite and non negative, got {:?}",
            beta
        )));
    }
    Ok(())
}

impl<'a, F: Float> UpperConfidenceBound<'a, F> {
    /// Constructor given the `model`, the trade-off parameter `beta`
    /// and the optimization direction.
    pub fn new(
        model: &'a dyn Surrogate<F>,
        beta: impl Into<BatchParam>,
        maximize: bool,
    ) -> Result<Self> {
        let beta = beta.into();
        check_beta(&beta)?;
        Ok(UpperConfidenceBound {
            model,
            objective: None,
            beta,
            maximize,
        })
    }

    /// Sets a scalarization of the model outputs
    pub fn objective(mut self, objective: ScalarizedObjective) -> Self {
        self.objective = Some(objective);
        self
    }

    /// Trade-off parameter
    pub fn beta(&self) -> &BatchParam {
        &self.beta
    }

    /// Refresh the trade-off parameter
    pub fn set_beta(&mut self, beta: impl Into<BatchParam>) -> Result<()> {
        let beta = beta.into();
        check_beta(&beta)?;
        self.beta = beta;
        Ok(())
    }

    /// Whether the optimization is a maximization
    pub fn maximize(&self) -> bool {
        self.maximize
    }
}

impl<'a, F: Float> AcquisitionFunction<F> for UpperConfidenceBound<'a, F> {
    fn name(&self) -> &'static str {
        "UCB"
    }

    fn value(&self, x: &ArrayViewD<F>) -> Result<ArrayD<F>> {
        check_single_point(x, self.name())?;
        let posterior = get_posterior(self.model, self.objective.as_ref(), x, true)?;
        let (mean, variance) = scalar_moments(&posterior);
        let beta = self.beta.ensure_compatible::<F>(mean.shape())?;
        Ok(Zip::from(&mean)
            .and(&variance)
            .and(&beta)
            .map_collect(|&m, &v, &b| {
                let delta = (b * v).sqrt();
                if self.maximize {
                    m + delta
                } else {
                    m - delta
                }
            }))
    }
}
