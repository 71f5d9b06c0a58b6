use crate::acquisition::{
    check_single_point, get_posterior, scalar_moments, AcquisitionFunction, BatchParam,
};
use crate::criteria::expected_improvement;
use crate::errors::{AcqError, Result};
use acqbox_gp::{NormalSampler, PosteriorSampler, Surrogate};
use linfa::Float;
use log::debug;
use ndarray::{Array1, Array2, ArrayBase, ArrayD, ArrayViewD, Axis, Data, Ix2};
use ndarray_stats::QuantileExt;

/// Number of fantasies drawn by default
pub const DEFAULT_NUM_FANTASIES: usize = 20;

/// Single-outcome Noisy Expected Improvement (via fantasies).
///
/// Observations being noisy, the best value observed so far is uncertain.
/// Noiseless outcomes at the observed points are fantasized by sampling the model
/// posterior, each fantasy conditioning a copy of the model (same hyperparameters)
/// with a negligible noise. Expected improvement is then averaged over fantasy
/// models, each fantasy using its own best value.
///
/// The model has to be a single output, non batched, fixed noise model
/// (see [Surrogate::supports_fixed_noise]).
pub struct NoisyExpectedImprovement<F: Float> {
    fantasy_model: Box<dyn Surrogate<F>>,
    fantasy_targets: Array2<F>,
    best_f: BatchParam,
    maximize: bool,
}

impl<F: Float> NoisyExpectedImprovement<F> {
    /// Constructor given the fixed noise `model`, the points already observed
    /// `x_observed` (m, d), the number of fantasies and the optimization direction.
    ///
    /// Fantasies are drawn with a [NormalSampler] seeded from entropy.
    pub fn new(
        model: &dyn Surrogate<F>,
        x_observed: &ArrayBase<impl Data<Elem = F>, Ix2>,
        num_fantasies: usize,
        maximize: bool,
    ) -> Result<Self> {
        Self::new_with_sampler(
            model,
            x_observed,
            num_fantasies,
            maximize,
            &NormalSampler::new(),
        )
    }

    /// Constructor drawing fantasies with the given `sampler`
    pub fn new_with_sampler(
        model: &dyn Surrogate<F>,
        x_observed: &ArrayBase<impl Data<Elem = F>, Ix2>,
        num_fantasies: usize,
        maximize: bool,
        sampler: &dyn PosteriorSampler<F>,
    ) -> Result<Self> {
        if !model.supports_fixed_noise() {
            return Err(AcqError::UnsupportedError(format!(
                "Only fixed noise models are supported, got {}",
                model
            )));
        }
        if model.num_outputs() != 1 || !model.batch_shape().is_empty() {
            return Err(AcqError::UnsupportedError(format!(
                "Only single output non batched models are supported, got {}",
                model
            )));
        }
        if num_fantasies == 0 {
            return Err(AcqError::InvalidConfigError(
                "Number of fantasies should be greater than 0".to_string(),
            ));
        }
        let (m, d) = x_observed.dim();
        if m == 0 {
            return Err(AcqError::InvalidConfigError(
                "There must be at least one observed point".to_string(),
            ));
        }

        let posterior = model.posterior(&x_observed.view().into_dyn())?;
        let fantasy_targets = sampler
            .sample(&posterior, num_fantasies)?
            .into_shape((num_fantasies, m))
            .map_err(|e| AcqError::ShapeError(e.to_string()))?;
        let fantasy_x = x_observed
            .broadcast((num_fantasies, m, d))
            .ok_or_else(|| {
                AcqError::ShapeError(format!(
                    "Observed points {:?} cannot be replicated {} times",
                    x_observed.shape(),
                    num_fantasies
                ))
            })?
            .to_owned();
        let fantasy_model = model.condition_noiseless(&fantasy_x, &fantasy_targets)?;

        let best_f = fantasy_targets
            .outer_iter()
            .map(|targets| {
                let best = if maximize {
                    targets.max()
                } else {
                    targets.min()
                };
                best.map(|v| v.to_f64().unwrap_or(f64::NAN))
                    .map_err(|e| AcqError::InvalidConfigError(format!("Bad fantasy targets: {e}")))
            })
            .collect::<Result<Array1<f64>>>()?;
        debug!(
            "NEI with {} fantasies of {} observed points, best values {}",
            num_fantasies, m, best_f
        );

        Ok(NoisyExpectedImprovement {
            fantasy_model,
            fantasy_targets,
            best_f: BatchParam::from(best_f),
            maximize,
        })
    }

    /// Batched model conditioned on the fantasies
    pub fn fantasy_model(&self) -> &dyn Surrogate<F> {
        self.fantasy_model.as_ref()
    }

    /// Fantasized outcomes at observed points (num_fantasies, m)
    pub fn fantasy_targets(&self) -> &Array2<F> {
        &self.fantasy_targets
    }

    /// Best value of each fantasy
    pub fn best_f(&self) -> &BatchParam {
        &self.best_f
    }

    /// Number of fantasies
    pub fn num_fantasies(&self) -> usize {
        self.fantasy_targets.nrows()
    }

    /// Whether the optimization is a maximization
    pub fn maximize(&self) -> bool {
        self.maximize
    }
}

impl<F: Float> AcquisitionFunction<F> for NoisyExpectedImprovement<F> {
    fn name(&self) -> &'static str {
        "NEI"
    }

    fn value(&self, x: &ArrayViewD<F>) -> Result<ArrayD<F>> {
        check_single_point(x, self.name())?;
        // (batch.., 1, 1, d) to be broadcast against every fantasy
        let nd = x.ndim();
        let x = x.clone().insert_axis(Axis(nd - 2));
        let posterior = get_posterior(self.fantasy_model.as_ref(), None, &x, true)?;
        let (mean, variance) = scalar_moments(&posterior);
        let best_f = self.best_f.ensure_compatible::<F>(mean.shape())?;
        let ei = expected_improvement(&mean, &variance, &best_f, self.maximize);
        let last = Axis(ei.ndim() - 1);
        ei.mean_axis(last).ok_or_else(|| {
            AcqError::ShapeError("Cannot average over an empty set of fantasies".to_string())
        })
    }
}
