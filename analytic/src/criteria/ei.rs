use crate::acquisition::{
    check_single_point, get_posterior, scalar_moments, AcquisitionFunction, BatchParam,
};
use crate::criteria::EI_VARIANCE_MIN;
use crate::errors::Result;
use crate::objective::ScalarizedObjective;
use crate::utils::{norm_cdf, norm_pdf};
use acqbox_gp::Surrogate;
use linfa::Float;
use ndarray::{ArrayD, ArrayViewD, Zip};

/// Expected improvement of a gaussian `N(mean, sigma^2)` over `best_f`
pub(crate) fn ei_value<F: Float>(mean: F, sigma: F, best_f: F, maximize: bool) -> F {
    let u = (mean - best_f) / sigma;
    let u = if maximize { u } else { -u };
    // pdf(u) + u * cdf(u) cancels out in the far negative tail
    (sigma * (norm_pdf(u) + u * norm_cdf(u))).max(F::zero())
}

/// Element-wise expected improvement given means, variances and best values of same shape
pub(crate) fn expected_improvement<F: Float>(
    mean: &ArrayD<F>,
    variance: &ArrayD<F>,
    best_f: &ArrayD<F>,
    maximize: bool,
) -> ArrayD<F> {
    let var_min = F::cast(EI_VARIANCE_MIN);
    Zip::from(mean)
        .and(variance)
        .and(best_f)
        .map_collect(|&m, &v, &f| ei_value(m, v.max(var_min).sqrt(), f, maximize))
}

/// Single-outcome Expected Improvement (analytic).
///
/// Computes classic expected improvement over the current best observed value
/// `best_f`, using the analytic formula for a normal posterior distribution:
///
/// `EI(x) = E(max(y - best_f, 0))`, `y ~ f(x)`
///
/// that is `EI = sigma * (pdf(u) + u * cdf(u))` where `u = (mean - best_f) / sigma`,
/// `u` being negated when minimizing.
///
/// # Example
///
/// ```
/// use acqbox_analytic::{AcquisitionFunction, ExpectedImprovement};
/// use acqbox_gp::{correlation_models::SquaredExponentialCorr, FixedNoiseGp};
/// use ndarray::{array, Array};
///
/// let gp = FixedNoiseGp::params(SquaredExponentialCorr::default())
///     .fit(&array![[0.], [1.]], &array![0., 1.], &array![1e-4, 1e-4])
///     .expect("GP fitted");
/// let ei = ExpectedImprovement::new(&gp, 1., true);
///
/// // 10 candidates, one point each
/// let x = Array::linspace(0., 2., 10).into_shape((10, 1, 1)).unwrap();
/// let values = ei.value(&x.into_dyn().view()).expect("EI values");
/// assert_eq!(values.shape(), &[10]);
/// ```
pub struct ExpectedImprovement<'a, F: Float> {
    model: &'a dyn Surrogate<F>,
    objective: Option<ScalarizedObjective>,
    best_f: BatchParam,
    maximize: bool,
}

impl<'a, F: Float> ExpectedImprovement<'a, F> {
    /// Constructor given the `model`, the best value observed so far `best_f`
    /// (a scalar or values broadcastable against the candidates batch shape)
    /// and the optimization direction.
    pub fn new(model: &'a dyn Surrogate<F>, best_f: impl Into<BatchParam>, maximize: bool) -> Self {
        ExpectedImprovement {
            model,
            objective: None,
            best_f: best_f.into(),
            maximize,
        }
    }

    /// Sets a scalarization of the model outputs
    pub fn objective(mut self, objective: ScalarizedObjective) -> Self {
        self.objective = Some(objective);
        self
    }

    /// Best value observed so far
    pub fn best_f(&self) -> &BatchParam {
        &self.best_f
    }

    /// Refresh the best value observed so far
    pub fn set_best_f(&mut self, best_f: impl Into<BatchParam>) {
        self.best_f = best_f.into();
    }

    /// Whether the optimization is a maximization
    pub fn maximize(&self) -> bool {
        self.maximize
    }
}

impl<'a, F: Float> AcquisitionFunction<F> for ExpectedImprovement<'a, F> {
    fn name(&self) -> &'static str {
        "EI"
    }

    fn value(&self, x: &ArrayViewD<F>) -> Result<ArrayD<F>> {
        check_single_point(x, self.name())?;
        let posterior = get_posterior(self.model, self.objective.as_ref(), x, true)?;
        let (mean, variance) = scalar_moments(&posterior);
        let best_f = self.best_f.ensure_compatible::<F>(mean.shape())?;
        Ok(expected_improvement(&mean, &variance, &best_f, self.maximize))
    }
}
