use crate::acquisition::{
    check_single_point, get_posterior, point_moments, AcquisitionFunction, BatchParam,
};
use crate::constraints::{Bounds, ConstraintBounds};
use crate::criteria::{ei_value, SIGMA_MIN};
use crate::errors::{AcqError, Result};
use acqbox_gp::Surrogate;
use linfa::Float;
use ndarray::{ArrayD, ArrayViewD, Axis, Zip};
use std::collections::BTreeMap;

/// Constrained Expected Improvement (feasibility-weighted).
///
/// Computes the analytic expected improvement of the objective output,
/// weighted by the probability of feasibility of the other outputs with
/// regards to their bounds, outputs being assumed independent.
/// Only supports the case of q=1, the model has to be multi-output.
///
/// `CEI(x) = EI(x) * P(feasible | x)`
///
/// # Example
///
/// ```no_run
/// use acqbox_analytic::{AcquisitionFunction, ConstrainedExpectedImprovement};
/// use acqbox_gp::Surrogate;
/// use ndarray::ArrayViewD;
/// use std::collections::BTreeMap;
///
/// fn cei_values(model: &dyn Surrogate<f64>, x: &ArrayViewD<f64>) {
///     // output 0 is the objective, output 1 is constrained to be non negative
///     let constraints = BTreeMap::from([(1, (Some(0.), None))]);
///     let cei = ConstrainedExpectedImprovement::new(model, 0.2, 0, &constraints, true)
///         .expect("valid constraints");
///     let values = cei.value(x).expect("CEI values");
/// }
/// ```
pub struct ConstrainedExpectedImprovement<'a, F: Float> {
    model: &'a dyn Surrogate<F>,
    best_f: BatchParam,
    objective_index: usize,
    constraints: ConstraintBounds,
    maximize: bool,
}

impl<'a, F: Float> ConstrainedExpectedImprovement<'a, F> {
    /// Constructor given the multi-output `model`, the best feasible objective value
    /// observed so far `best_f`, the index of the objective output, constraints given
    /// as `output index -> (lower, upper)` bounds and the optimization direction.
    pub fn new(
        model: &'a dyn Surrogate<F>,
        best_f: impl Into<BatchParam>,
        objective_index: usize,
        constraints: &BTreeMap<usize, Bounds>,
        maximize: bool,
    ) -> Result<Self> {
        let constraints = ConstraintBounds::new(objective_index, constraints)?;
        Ok(ConstrainedExpectedImprovement {
            model,
            best_f: best_f.into(),
            objective_index,
            constraints,
            maximize,
        })
    }

    /// Best feasible objective value observed so far
    pub fn best_f(&self) -> &BatchParam {
        &self.best_f
    }

    /// Refresh the best feasible objective value observed so far
    pub fn set_best_f(&mut self, best_f: impl Into<BatchParam>) {
        self.best_f = best_f.into();
    }

    /// Index of the objective output
    pub fn objective_index(&self) -> usize {
        self.objective_index
    }

    /// Partitioned constraint bounds
    pub fn constraint_bounds(&self) -> &ConstraintBounds {
        &self.constraints
    }

    /// Whether the optimization is a maximization
    pub fn maximize(&self) -> bool {
        self.maximize
    }
}

impl<'a, F: Float> AcquisitionFunction<F> for ConstrainedExpectedImprovement<'a, F> {
    fn name(&self) -> &'static str {
        "CEI"
    }

    fn value(&self, x: &ArrayViewD<F>) -> Result<ArrayD<F>> {
        check_single_point(x, self.name())?;
        let posterior = get_posterior(self.model, None, x, false)?;
        let (means, variances) = point_moments(&posterior);
        let last = Axis(means.ndim() - 1);
        if self.objective_index >= means.len_of(last) {
            return Err(AcqError::ShapeError(format!(
                "Objective index {} out of bounds for a {}-output posterior",
                self.objective_index,
                means.len_of(last)
            )));
        }
        let sigma_min = F::cast(SIGMA_MIN);
        let sigmas = variances.mapv(|v| v.sqrt().max(sigma_min));

        let mean_obj = means.index_axis(last, self.objective_index);
        let sigma_obj = sigmas.index_axis(last, self.objective_index);
        let best_f = self.best_f.ensure_compatible::<F>(mean_obj.shape())?;
        let ei = Zip::from(&mean_obj)
            .and(&sigma_obj)
            .and(&best_f)
            .map_collect(|&m, &s, &f| ei_value(m, s, f, self.maximize));

        let prob_feas = self
            .constraints
            .prob_feasibility(&means.view(), &sigmas.view())?;
        Ok(ei * prob_feas)
    }
}
