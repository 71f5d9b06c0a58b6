use acqbox::gp::{FixedNoiseGpParams, FANTASY_NOISE_VARIANCE};
use acqbox::prelude::*;
use approx::assert_abs_diff_eq;
use ndarray::{array, concatenate, Array, Array1, Array2, ArrayD, ArrayViewD, Axis};
use std::collections::BTreeMap;
use std::fmt;

fn init_logger() {
    let env = env_logger::Env::new().filter_or("ACQBOX_LOG", "info");
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stdout)
        .try_init()
        .ok();
}

fn forrester(x: &Array2<f64>) -> Array1<f64> {
    x.column(0)
        .mapv(|x| (6. * x - 2.) * (6. * x - 2.) * (12. * x - 4.).sin())
}

fn training_set() -> (Array2<f64>, Array1<f64>) {
    let xt = Array::linspace(0., 1., 8).into_shape((8, 1)).unwrap();
    let yt = forrester(&xt);
    (xt, yt)
}

fn forrester_gp(noise: f64) -> FixedNoiseGp<f64, Matern52Corr> {
    let (xt, yt) = training_set();
    FixedNoiseGp::params(Matern52Corr::default())
        .theta(array![3.])
        .constant_mean(yt.mean().unwrap())
        .sigma2(30.)
        .fit(&xt, &yt, &Array::from_elem(xt.nrows(), noise))
        .expect("GP fitted")
}

fn candidates() -> ArrayD<f64> {
    Array::linspace(0., 1., 41)
        .into_shape((41, 1, 1))
        .unwrap()
        .into_dyn()
}

#[test]
fn test_analytic_criteria_on_gp() {
    init_logger();
    let gp = forrester_gp(1e-6);
    let (_, yt) = training_set();
    let best_f = *yt.iter().min_by(|a, b| a.total_cmp(b)).unwrap();
    let x = candidates();

    let ei = ExpectedImprovement::new(&gp, best_f, false);
    let pi = ProbabilityOfImprovement::new(&gp, best_f, false);
    let pm = PosteriorMean::new(&gp);
    let ucb = UpperConfidenceBound::new(&gp, 4., true).unwrap();
    let lcb = UpperConfidenceBound::new(&gp, 4., false).unwrap();

    let ei_values = ei.value(&x.view()).unwrap();
    let pi_values = pi.value(&x.view()).unwrap();
    let pm_values = pm.value(&x.view()).unwrap();
    let ucb_values = ucb.value(&x.view()).unwrap();
    let lcb_values = lcb.value(&x.view()).unwrap();
    for values in [&ei_values, &pi_values, &pm_values, &ucb_values, &lcb_values] {
        assert_eq!(values.shape(), &[41]);
    }

    assert!(ei_values.iter().all(|v| *v >= 0.));
    assert!(pi_values.iter().all(|v| (0. ..=1.).contains(v)));
    ucb_values
        .iter()
        .zip(pm_values.iter())
        .zip(lcb_values.iter())
        .for_each(|((u, m), l)| assert!(l <= m && m <= u));

    // training points are nearly noiseless: no improvement expected there
    let (xt, _) = training_set();
    let xt = xt.insert_axis(Axis(1)).into_dyn();
    ei.value(&xt.view())
        .unwrap()
        .iter()
        .for_each(|v| assert_abs_diff_eq!(*v, 0., epsilon = 1e-3));
    assert_abs_diff_eq!(
        pm.value(&xt.view()).unwrap(),
        yt.into_dyn(),
        epsilon = 1e-3
    );
}

#[test]
fn test_noisy_ei_single_fantasy_is_ei() {
    init_logger();
    let gp = forrester_gp(0.05);
    let (xt, _) = training_set();
    let nei = NoisyExpectedImprovement::new_with_sampler(
        &gp,
        &xt,
        1,
        true,
        &NormalSampler::seed_from_u64(42),
    )
    .unwrap();
    assert_eq!(nei.num_fantasies(), 1);

    // same hyperparameters conditioned on the only fantasy, without batch
    let targets = nei.fantasy_targets().row(0).to_owned();
    let best_f = *targets.iter().max_by(|a, b| a.total_cmp(b)).unwrap();
    let fantasy_gp = FixedNoiseGpParams::from(gp.hyperparameters().clone())
        .fit(
            &xt,
            &targets,
            &Array::from_elem(xt.nrows(), FANTASY_NOISE_VARIANCE),
        )
        .unwrap();
    let ei = ExpectedImprovement::new(&fantasy_gp, best_f, true);

    let x = candidates();
    assert_abs_diff_eq!(
        nei.value(&x.view()).unwrap(),
        ei.value(&x.view()).unwrap(),
        epsilon = 1e-8
    );
}

#[test]
fn test_noisy_ei_averages_fantasies() {
    let gp = forrester_gp(0.05);
    let (xt, _) = training_set();
    let nei = NoisyExpectedImprovement::new_with_sampler(
        &gp,
        &xt,
        DEFAULT_NUM_FANTASIES,
        false,
        &NormalSampler::seed_from_u64(0),
    )
    .unwrap();
    let values = nei.value(&candidates().view()).unwrap();
    assert_eq!(values.shape(), &[41]);
    assert!(values.iter().all(|v| v.is_finite() && *v >= 0.));

    let single = nei.value(&array![[0.75]].into_dyn().view()).unwrap();
    assert_eq!(single.ndim(), 0);
}

/// Two independent gaussian processes seen as a two-output model
struct TwoOutputs {
    objective: FixedNoiseGp<f64, Matern52Corr>,
    constraint: FixedNoiseGp<f64, SquaredExponentialCorr>,
}

impl fmt::Display for TwoOutputs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TwoOutputs({}, {})", self.objective, self.constraint)
    }
}

impl Surrogate<f64> for TwoOutputs {
    fn input_dim(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        2
    }

    fn posterior(&self, x: &ArrayViewD<f64>) -> acqbox::gp::Result<MultivariateNormal<f64>> {
        let obj = self.objective.posterior(x)?;
        let cstr = self.constraint.posterior(x)?;
        let last = Axis(x.ndim() - 1);
        let mean = concatenate(last, &[obj.mean().view(), cstr.mean().view()])?;
        let variance = concatenate(last, &[obj.variance().view(), cstr.variance().view()])?;
        MultivariateNormal::from_independent(mean, variance)
    }
}

#[test]
fn test_constrained_ei_on_gps() {
    let (xt, yt) = training_set();
    // feasible when x <= 0.5
    let ct = xt.column(0).mapv(|x| x - 0.5);
    let model = TwoOutputs {
        objective: forrester_gp(1e-6),
        constraint: FixedNoiseGp::params(SquaredExponentialCorr::default())
            .fit(&xt, &ct, &Array::from_elem(xt.nrows(), 1e-6))
            .unwrap(),
    };
    let best_f = *yt
        .iter()
        .zip(ct.iter())
        .filter(|(_, c)| **c <= 0.)
        .map(|(y, _)| y)
        .min_by(|a, b| a.total_cmp(b))
        .unwrap();

    let x = candidates();
    let constraints = BTreeMap::from([(1, (None, Some(0.)))]);
    let cei = ConstrainedExpectedImprovement::new(&model, best_f, 0, &constraints, false).unwrap();
    let cei_values = cei.value(&x.view()).unwrap();
    assert_eq!(cei_values.shape(), &[41]);

    let obj = ScalarizedObjective::new(array![1., 0.], 0.).unwrap();
    let ei = ExpectedImprovement::new(&model, best_f, false).objective(obj);
    let ei_values = ei.value(&x.view()).unwrap();

    // feasibility only lowers the expected improvement
    cei_values
        .iter()
        .zip(ei_values.iter())
        .for_each(|(c, e)| assert!(*c >= 0. && *c <= *e + 1e-9));
    // clearly infeasible region
    cei_values
        .iter()
        .skip(36)
        .for_each(|v| assert_abs_diff_eq!(*v, 0., epsilon = 1e-6));

    // single output evaluation of a two outputs model needs a scalarization
    let ei = ExpectedImprovement::new(&model, best_f, false);
    assert!(matches!(ei.value(&x.view()), Err(AcqError::ShapeError(_))));
}

#[test]
fn test_criteria_single_precision() {
    let (xt, yt) = training_set();
    let gp64 = forrester_gp(0.1);
    let gp32 = FixedNoiseGp::params(Matern52Corr::default())
        .theta(array![3f32])
        .constant_mean(yt.mean().unwrap() as f32)
        .sigma2(30f32)
        .fit(
            &xt.mapv(|v| v as f32),
            &yt.mapv(|v| v as f32),
            &Array::from_elem(xt.nrows(), 0.1f32),
        )
        .expect("GP fitted");
    let x64 = candidates();
    let x32 = x64.mapv(|v| v as f32);
    let best_f = *yt.iter().min_by(|a, b| a.total_cmp(b)).unwrap();

    let ei64 = ExpectedImprovement::new(&gp64, best_f, false);
    let ei32 = ExpectedImprovement::new(&gp32, best_f, false);
    let values = ei32.value(&x32.view()).unwrap();
    assert_eq!(values.shape(), &[41]);
    assert_abs_diff_eq!(
        values.mapv(|v| v as f64),
        ei64.value(&x64.view()).unwrap(),
        epsilon = 5e-2
    );

    let ucb64 = UpperConfidenceBound::new(&gp64, array![1., 4.], true).unwrap();
    let ucb32 = UpperConfidenceBound::new(&gp32, array![1., 4.], true).unwrap();
    // one beta per trailing batch element
    let x64 = Array::from_shape_fn((41, 2, 1, 1), |(i, _, _, _)| i as f64 / 40.).into_dyn();
    let values = ucb32.value(&x64.mapv(|v| v as f32).view()).unwrap();
    assert_eq!(values.shape(), &[41, 2]);
    assert_abs_diff_eq!(
        values.mapv(|v| v as f64),
        ucb64.value(&x64.view()).unwrap(),
        epsilon = 5e-2
    );

    // improvement out of reach: far negative tail in single precision
    let ei32 = ExpectedImprovement::new(&gp32, best_f - 100., false);
    assert!(ei32.value(&x32.view()).unwrap().iter().all(|v| *v >= 0.));
}
