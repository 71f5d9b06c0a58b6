//! Probability of feasibility of outputs constrained within bounds.
//!
//! Constraints are partitioned into three groups: lower bounded only,
//! upper bounded only and two-sided bounded. Each group is evaluated
//! with its own formula, one-sided constraints never go through
//! infinite bounds.

use crate::errors::{AcqError, Result};
use crate::utils::norm_cdf;
use linfa::Float;
use ndarray::{Array1, Array2, ArrayD, ArrayViewD, Axis, Zip};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output bounds `(lower, upper)`, a missing bound meaning unbounded on that side
pub type Bounds = (Option<f64>, Option<f64>);

/// Constraint bounds partitioned by kind
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub struct ConstraintBounds {
    lower_inds: Vec<usize>,
    lower: Array1<f64>,
    upper_inds: Vec<usize>,
    upper: Array1<f64>,
    both_inds: Vec<usize>,
    /// (k, 2) array of (lower, upper) bounds
    both: Array2<f64>,
}

impl ConstraintBounds {
    /// Constructor given `output index -> (lower, upper)` constraints.
    ///
    /// Fails when there is no constraint, when the objective output is constrained,
    /// when a constraint has no bound or a non finite bound, or when two-sided bounds
    /// do not satisfy `lower < upper`.
    pub fn new(objective_index: usize, constraints: &BTreeMap<usize, Bounds>) -> Result<Self> {
        if constraints.is_empty() {
            return Err(AcqError::InvalidConfigError(
                "There must be at least one constraint".to_string(),
            ));
        }
        if constraints.contains_key(&objective_index) {
            return Err(AcqError::InvalidConfigError(format!(
                "Objective output {} should not be a constraint",
                objective_index
            )));
        }

        let (mut lower_inds, mut lower) = (vec![], vec![]);
        let (mut upper_inds, mut upper) = (vec![], vec![]);
        let (mut both_inds, mut both) = (vec![], vec![]);
        for (&i, &bounds) in constraints {
            if bounds.0.into_iter().chain(bounds.1).any(|b| !b.is_finite()) {
                return Err(AcqError::InvalidConfigError(format!(
                    "Bounds of constraint {} should be finite, got {:?}",
                    i, bounds
                )));
            }
            match bounds {
                (Some(lb), Some(ub)) => {
                    if ub <= lb {
                        return Err(AcqError::InvalidConfigError(format!(
                            "Upper bound {} is less than the lower bound {} for constraint {}",
                            ub, lb, i
                        )));
                    }
                    both_inds.push(i);
                    both.extend([lb, ub]);
                }
                (Some(lb), None) => {
                    lower_inds.push(i);
                    lower.push(lb);
                }
                (None, Some(ub)) => {
                    upper_inds.push(i);
                    upper.push(ub);
                }
                (None, None) => {
                    return Err(AcqError::InvalidConfigError(format!(
                        "Constraint {} should have at least one bound",
                        i
                    )))
                }
            }
        }

        let nboth = both_inds.len();
        Ok(ConstraintBounds {
            lower_inds,
            lower: Array1::from(lower),
            upper_inds,
            upper: Array1::from(upper),
            both_inds,
            both: Array2::from_shape_vec((nboth, 2), both)
                .map_err(|e| AcqError::InvalidConfigError(e.to_string()))?,
        })
    }

    /// Indices of outputs only bounded from below
    pub fn lower_indices(&self) -> &[usize] {
        &self.lower_inds
    }

    /// Indices of outputs only bounded from above
    pub fn upper_indices(&self) -> &[usize] {
        &self.upper_inds
    }

    /// Indices of outputs bounded on both sides
    pub fn both_indices(&self) -> &[usize] {
        &self.both_inds
    }

    /// Largest constrained output index
    pub fn max_index(&self) -> usize {
        self.lower_inds
            .iter()
            .chain(&self.upper_inds)
            .chain(&self.both_inds)
            .copied()
            .max()
            .unwrap_or(0)
    }

    /// Probability that every constrained output lies within its bounds, outputs being
    /// independent gaussians with `means` and standard deviations `sigmas` shaped `(batch.., t)`.
    ///
    /// Returns probabilities shaped `(batch..)`.
    pub fn prob_feasibility<F: Float>(
        &self,
        means: &ArrayViewD<F>,
        sigmas: &ArrayViewD<F>,
    ) -> Result<ArrayD<F>> {
        if means.ndim() == 0 || means.shape() != sigmas.shape() {
            return Err(AcqError::ShapeError(format!(
                "Means {:?} and standard deviations {:?} should be shaped (batch.., t)",
                means.shape(),
                sigmas.shape()
            )));
        }
        let last = Axis(means.ndim() - 1);
        let t = means.len_of(last);
        if self.max_index() >= t {
            return Err(AcqError::ShapeError(format!(
                "Constraint index {} out of bounds for a {}-output posterior",
                self.max_index(),
                t
            )));
        }

        let mut prob = ArrayD::<F>::ones(&means.shape()[..means.ndim() - 1]);
        if !self.lower_inds.is_empty() {
            let m = means.select(last, &self.lower_inds);
            let s = sigmas.select(last, &self.lower_inds);
            let lower = self.lower.mapv(F::cast);
            let p = Zip::from(&m)
                .and(&s)
                .and_broadcast(&lower)
                .map_collect(|&m, &s, &lb| F::one() - norm_cdf((lb - m) / s));
            prob = prob * p.map_axis(last, |p| p.product());
        }
        if !self.upper_inds.is_empty() {
            let m = means.select(last, &self.upper_inds);
            let s = sigmas.select(last, &self.upper_inds);
            let upper = self.upper.mapv(F::cast);
            let p = Zip::from(&m)
                .and(&s)
                .and_broadcast(&upper)
                .map_collect(|&m, &s, &ub| norm_cdf((ub - m) / s));
            prob = prob * p.map_axis(last, |p| p.product());
        }
        if !self.both_inds.is_empty() {
            let m = means.select(last, &self.both_inds);
            let s = sigmas.select(last, &self.both_inds);
            let lower = self.both.column(0).mapv(F::cast);
            let upper = self.both.column(1).mapv(F::cast);
            let p = Zip::from(&m)
                .and(&s)
                .and_broadcast(&lower)
                .and_broadcast(&upper)
                .map_collect(|&m, &s, &lb, &ub| {
                    norm_cdf((ub - m) / s) - norm_cdf((lb - m) / s)
                });
            prob = prob * p.map_axis(last, |p| p.product());
        }
        Ok(prob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn constraints(entries: &[(usize, Bounds)]) -> BTreeMap<usize, Bounds> {
        entries.iter().cloned().collect()
    }

    #[test]
    fn test_partition() {
        let cb = ConstraintBounds::new(
            0,
            &constraints(&[
                (1, (Some(0.), None)),
                (2, (None, Some(1.))),
                (3, (Some(-1.), Some(1.))),
                (4, (Some(2.), None)),
            ]),
        )
        .unwrap();
        assert_eq!(cb.lower_indices(), &[1, 4]);
        assert_eq!(cb.upper_indices(), &[2]);
        assert_eq!(cb.both_indices(), &[3]);
        assert_eq!(cb.max_index(), 4);
    }

    #[test]
    fn test_invalid_constraints() {
        let err = |c: &[(usize, Bounds)]| {
            matches!(
                ConstraintBounds::new(0, &constraints(c)),
                Err(AcqError::InvalidConfigError(_))
            )
        };
        assert!(err(&[]));
        assert!(err(&[(0, (Some(0.), None))]));
        assert!(err(&[(1, (Some(1.), Some(1.)))]));
        assert!(err(&[(1, (Some(2.), Some(1.)))]));
        assert!(err(&[(1, (None, None))]));
        assert!(err(&[(1, (Some(f64::NEG_INFINITY), None))]));
        assert!(err(&[(1, (None, Some(f64::NAN)))]));
    }

    #[test]
    fn test_prob_feasibility() {
        // outputs: 0 objective, 1 lower, 2 upper, 3 both
        let cb = ConstraintBounds::new(
            0,
            &constraints(&[
                (1, (Some(0.), None)),
                (2, (None, Some(1.))),
                (3, (Some(-1.), Some(2.))),
            ]),
        )
        .unwrap();
        let means = array![[5., 0.5, 0.2, 0.], [5., -1., 3., 1.]].into_dyn();
        let sigmas = array![[1., 1., 2., 0.5], [1., 0.5, 1., 1.]].into_dyn();
        let prob = cb.prob_feasibility(&means.view(), &sigmas.view()).unwrap();
        assert_eq!(prob.shape(), &[2]);

        let expected0 = (1. - norm_cdf((0. - 0.5) / 1.))
            * norm_cdf((1. - 0.2) / 2.)
            * (norm_cdf((2. - 0.) / 0.5) - norm_cdf((-1. - 0.) / 0.5));
        let expected1 = (1. - norm_cdf((0. + 1.) / 0.5))
            * norm_cdf((1. - 3.) / 1.)
            * (norm_cdf((2. - 1.) / 1.) - norm_cdf((-1. - 1.) / 1.));
        assert_abs_diff_eq!(prob, array![expected0, expected1].into_dyn(), epsilon = 1e-12);
        prob.iter().for_each(|p| assert!(*p >= 0. && *p <= 1.));
    }

    #[test]
    fn test_prob_feasibility_index_out_of_bounds() {
        let cb = ConstraintBounds::new(0, &constraints(&[(2, (Some(0.), None))])).unwrap();
        let means = array![[0., 0.]].into_dyn();
        assert!(matches!(
            cb.prob_feasibility(&means.view(), &means.view()),
            Err(AcqError::ShapeError(_))
        ));
    }
}
