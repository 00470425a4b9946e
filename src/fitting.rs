//! Fitting a truncated power law, `f(x) = a * x^(-b) * exp(-x / c)`, to degree distributions.
//!
//! The fit minimises the squared residuals of the counts themselves (not of their logarithms).
//! A log-linear least squares solve provides the starting point, which the Levenberg-Marquardt
//! iterations then refine.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};
use serde::Deserialize;

use crate::error::{Error, Result};

/// The three parameters of the model are estimated, so at least three points are needed.
const MIN_POINTS: usize = 3;

const INITIAL_DAMPING: f64 = 1e-3;
const MAX_DAMPING: f64 = 1e16;

/// Configuration for the least squares fit.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Budget of model evaluations before the fit is reported as not converging.
    ///
    /// Default: 10,000
    pub max_evaluations: usize,

    /// Relative tolerance on the parameter step and on the decrease of the squared residuals.
    ///
    /// Default: 1e-10
    pub tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 10_000,
            tolerance: 1e-10,
        }
    }
}

impl FitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }

    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// A power law with an exponential cutoff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TruncatedPowerLaw {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl TruncatedPowerLaw {
    /// # Examples
    ///
    /// ```
    /// use faonet::fitting::TruncatedPowerLaw;
    ///
    /// let law = TruncatedPowerLaw { a: 2.0, b: 1.0, c: f64::INFINITY };
    /// assert_eq!(law.evaluate(4.0), 0.5);
    /// ```
    pub fn evaluate(&self, x: f64) -> f64 {
        self.a * x.powf(-self.b) * (-x / self.c).exp()
    }

    fn from_vector(params: &Vector3<f64>) -> Self {
        Self {
            a: params[0],
            b: params[1],
            c: params[2],
        }
    }

    fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.a, self.b, self.c)
    }

    /// Partial derivatives with respect to `a`, `b` and `c`.
    fn gradient(&self, x: f64) -> Vector3<f64> {
        let kernel = x.powf(-self.b) * (-x / self.c).exp();
        let value = self.a * kernel;

        Vector3::new(kernel, -x.ln() * value, value * x / (self.c * self.c))
    }
}

/// The outcome of a successful fit.
#[derive(Clone, Debug, PartialEq)]
pub struct PowerLawFit {
    pub law: TruncatedPowerLaw,
    /// Coefficient of determination of the fitted values.
    pub r_squared: f64,
    /// The distinct observed values.
    pub x: Vec<f64>,
    /// How often each value was observed.
    pub y: Vec<f64>,
    /// The model evaluated at `x`.
    pub fitted: Vec<f64>,
}

/// Counts how often each value occurs, in ascending order of value.
///
/// # Examples
///
/// ```
/// use faonet::fitting::frequency_distribution;
///
/// assert_eq!(
///     frequency_distribution(&[1, 3, 1, 2, 1]),
///     vec![(1.0, 3.0), (2.0, 1.0), (3.0, 1.0)]
/// );
/// ```
pub fn frequency_distribution(observations: &[usize]) -> Vec<(f64, f64)> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for observation in observations {
        *counts.entry(*observation).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(value, count)| (value as f64, count as f64))
        .collect()
}

/// Fits the model to the frequency distribution of a sequence of degrees.
pub fn fit_degrees(degrees: &[usize], config: &FitConfig) -> Result<PowerLawFit> {
    fit_points(&frequency_distribution(degrees), config)
}

/// Fits the model to `(x, y)` points by nonlinear least squares.
///
/// Every `x` must be strictly positive. Fails with [`Error::FitDidNotConverge`] when the
/// evaluation budget runs out before the parameters settle.
pub fn fit_points(points: &[(f64, f64)], config: &FitConfig) -> Result<PowerLawFit> {
    if points.len() < MIN_POINTS {
        return Err(Error::InsufficientData {
            required: MIN_POINTS,
            found: points.len(),
        });
    }
    if let Some(&(x, _)) = points.iter().find(|(x, _)| !(*x > 0.0)) {
        return Err(Error::NonPositiveObservation(x));
    }

    let result = levenberg_marquardt(points, initial_guess(points), config);
    if let Err(error) = &result {
        tracing::warn!(%error, points = points.len(), "truncated power-law fit failed");
    }
    let law = result?;

    let x: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
    let y: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
    let fitted: Vec<f64> = x.iter().map(|x| law.evaluate(*x)).collect();

    tracing::debug!(a = law.a, b = law.b, c = law.c, "fitted truncated power law");

    Ok(PowerLawFit {
        law,
        r_squared: r_squared(&y, &fitted),
        x,
        y,
        fitted,
    })
}

/// Computes the coefficient of determination, `1 - SS_res / SS_tot`.
///
/// Not finite when all observations are equal.
///
/// # Examples
///
/// ```
/// use faonet::fitting::r_squared;
///
/// assert_eq!(r_squared(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0);
/// assert_eq!(r_squared(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]), 0.0);
/// ```
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> f64 {
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;

    let ss_res: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(y, f)| (y - f).powi(2))
        .sum();
    let ss_tot: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();

    1.0 - ss_res / ss_tot
}

//
// Helpers
//

/// Solves `ln y = ln a - b ln x - x / c` by linear least squares over the points with a positive
/// `y`, falling back to a plain power law when that isn't possible.
fn initial_guess(points: &[(f64, f64)]) -> TruncatedPowerLaw {
    let max_x = points.iter().map(|(x, _)| *x).fold(f64::MIN_POSITIVE, f64::max);
    let max_y = points.iter().map(|(_, y)| *y).fold(f64::MIN_POSITIVE, f64::max);
    let fallback = TruncatedPowerLaw {
        a: max_y,
        b: 1.0,
        c: 10.0 * max_x,
    };

    let positive: Vec<(f64, f64)> = points.iter().copied().filter(|(_, y)| *y > 0.0).collect();
    if positive.len() < MIN_POINTS {
        return fallback;
    }

    let design = DMatrix::from_fn(positive.len(), 3, |i, j| match j {
        0 => 1.0,
        1 => -positive[i].0.ln(),
        _ => -positive[i].0,
    });
    let target = DVector::from_iterator(positive.len(), positive.iter().map(|(_, y)| y.ln()));

    let Ok(solution) = design.svd(true, true).solve(&target, 1e-12) else {
        return fallback;
    };

    let inverse_cutoff = solution[2];
    let guess = TruncatedPowerLaw {
        a: solution[0].exp(),
        b: solution[1],
        c: if inverse_cutoff > f64::EPSILON {
            1.0 / inverse_cutoff
        } else {
            fallback.c
        },
    };

    if guess.to_vector().iter().all(|p| p.is_finite()) {
        guess
    } else {
        fallback
    }
}

fn sum_of_squares(points: &[(f64, f64)], law: &TruncatedPowerLaw) -> f64 {
    points
        .iter()
        .map(|(x, y)| (y - law.evaluate(*x)).powi(2))
        .sum()
}

/// Damped Gauss-Newton iterations with Marquardt's diagonal scaling.
fn levenberg_marquardt(
    points: &[(f64, f64)],
    start: TruncatedPowerLaw,
    config: &FitConfig,
) -> Result<TruncatedPowerLaw> {
    let tolerance = config.tolerance;

    let mut params = start.to_vector();
    let mut sse = sum_of_squares(points, &start);
    let mut evaluations = 1;
    let mut damping = INITIAL_DAMPING;

    if !sse.is_finite() {
        return Err(Error::FitDiverged);
    }

    loop {
        if evaluations >= config.max_evaluations {
            return Err(Error::FitDidNotConverge { evaluations });
        }

        let law = TruncatedPowerLaw::from_vector(&params);
        let mut jtj = Matrix3::<f64>::zeros();
        let mut jtr = Vector3::<f64>::zeros();
        for (x, y) in points {
            let gradient = law.gradient(*x);
            jtj += gradient * gradient.transpose();
            jtr += gradient * (y - law.evaluate(*x));
        }

        let mut damped = jtj;
        for i in 0..3 {
            damped[(i, i)] += damping * jtj[(i, i)].max(f64::EPSILON);
        }

        let Some(step) = damped.lu().solve(&jtr) else {
            damping *= 10.0;
            evaluations += 1;
            if damping > MAX_DAMPING {
                return Err(Error::FitDiverged);
            }
            continue;
        };

        // The parameters no longer move.
        if step.norm() <= tolerance * (params.norm() + tolerance) {
            break;
        }

        let candidate = params + step;
        let candidate_sse = sum_of_squares(points, &TruncatedPowerLaw::from_vector(&candidate));
        evaluations += 1;

        if candidate_sse.is_finite() && candidate_sse <= sse {
            let decrease = sse - candidate_sse;
            params = candidate;
            sse = candidate_sse;
            damping = (damping / 10.0).max(f64::EPSILON);

            if decrease <= tolerance * sse {
                break;
            }
        } else {
            damping *= 10.0;
            // No step along the steepest descent direction reduces the residuals any further.
            if damping > MAX_DAMPING {
                break;
            }
        }
    }

    if params.iter().all(|p| p.is_finite()) {
        Ok(TruncatedPowerLaw::from_vector(&params))
    } else {
        Err(Error::FitDiverged)
    }
}
