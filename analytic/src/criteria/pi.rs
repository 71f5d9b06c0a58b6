use crate::acquisition::{
    check_single_point, get_posterior, scalar_moments, AcquisitionFunction, BatchParam,
};
use crate::criteria::SIGMA_MIN;
use crate::errors::Result;
use crate::objective::ScalarizedObjective;
use crate::utils::norm_cdf;
use acqbox_gp::Surrogate;
use linfa::Float;
use ndarray::{ArrayD, ArrayViewD, Zip};

/// Single-outcome Probability of Improvement.
///
/// Probability of improvement over the current best observed value,
/// computed using the analytic formula under a normal posterior distribution.
/// Only supports the case of q=1.
///
/// `PI(x) = P(y >= best_f)`, `y ~ f(x)`
pub struct ProbabilityOfImprovement<'a, F: Float> {
    model: &'a dyn Surrogate<F>,
    objective: Option<ScalarizedObjective>,
    best_f: BatchParam,
    maximize: bool,
}

impl<'a, F: Float> ProbabilityOfImprovement<'a, F> {
    /// Constructor given the `model`, the best value observed so far `best_f`
    /// and the optimization direction.
    pub fn new(model: &'a dyn Surrogate<F>, best_f: impl Into<BatchParam>, maximize: bool) -> Self {
        ProbabilityOfImprovement {
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

impl<'a, F: Float> AcquisitionFunction<F> for ProbabilityOfImprovement<'a, F> {
    fn name(&self) -> &'static str {
        "PI"
    }

    fn value(&self, x: &ArrayViewD<F>) -> Result<ArrayD<F>> {
        check_single_point(x, self.name())?;
        let posterior = get_posterior(self.model, self.objective.as_ref(), x, true)?;
        let (mean, variance) = scalar_moments(&posterior);
        let best_f = self.best_f.ensure_compatible::<F>(mean.shape())?;
        let sigma_min = F::cast(SIGMA_MIN);
        Ok(Zip::from(&mean)
            .and(&variance)
            .and(&best_f)
            .map_collect(|&m, &v, &f| {
                let u = (m - f) / v.sqrt().max(sigma_min);
                norm_cdf(if self.maximize { u } else { -u })
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockSurrogate;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array3};

    #[test]
    fn test_probability_of_improvement() {
        let x = Array3::<f64>::zeros((1, 1, 1)).into_dyn();
        let model = MockSurrogate::new(array![0.], array![1.]);
        let pi = ProbabilityOfImprovement::new(&model, 0., true);
        assert_abs_diff_eq!(pi.value(&x.view()).unwrap()[[0]], 0.5, epsilon = 1e-15);

        let model = MockSurrogate::new(array![1.], array![4.]);
        let pi = ProbabilityOfImprovement::new(&model, 0., true);
        assert_abs_diff_eq!(pi.value(&x.view()).unwrap()[[0]], norm_cdf(0.5), epsilon = 1e-12);
        let pi = ProbabilityOfImprovement::new(&model, 0., false);
        assert_abs_diff_eq!(pi.value(&x.view()).unwrap()[[0]], norm_cdf(-0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_probability_of_improvement_in_unit_interval() {
        let x = Array3::<f64>::zeros((3, 1, 1)).into_dyn();
        for &mean in &[-100., -1., 0., 1e-3, 3., 100.] {
            for &var in &[0., 1e-20, 0.5, 10.] {
                let model = MockSurrogate::new(array![mean], array![var]);
                for &maximize in &[true, false] {
                    let mut pi = ProbabilityOfImprovement::new(&model, 0., maximize);
                    pi.set_best_f(array![-1., 0., 1.]);
                    let val = pi.value(&x.view()).unwrap();
                    val.iter().for_each(|p| assert!((0. ..=1.).contains(p)));
                }
            }
        }
    }

    #[test]
    fn test_probability_of_improvement_noiseless() {
        let x = Array3::<f64>::zeros((1, 1, 1)).into_dyn();
        let model = MockSurrogate::new(array![1.], array![0.]);
        let pi = ProbabilityOfImprovement::new(&model, 0.5, true);
        assert_eq!(pi.value(&x.view()).unwrap()[[0]], 1.);
        let pi = ProbabilityOfImprovement::new(&model, 1.5, true);
        assert_eq!(pi.value(&x.view()).unwrap()[[0]], 0.);
    }
}
