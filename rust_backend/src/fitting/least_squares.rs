//! Bounded nonlinear least squares.
//!
//! Levenberg-Marquardt over box-constrained parameters. Constraints are
//! enforced by the Minuit-style sine transform: the solver works in an
//! unconstrained internal space and every residual evaluation maps
//! parameters into `[lower, upper]` through `lo + (hi-lo)*(sin(x)+1)/2`.
//! Jacobians are central finite differences in the internal space; the
//! forward models fitted here are step-wise integrations for which analytic
//! sensitivities are not available.

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{DMatrix, DVector, Dyn, Owned};

use crate::fitting::FitError;

/// Box constraint for one parameter.
#[derive(Debug, Clone, Copy)]
pub struct Bound {
    pub lower: f64,
    pub upper: f64,
}

impl Bound {
    pub fn new(lower: f64, upper: f64) -> Result<Self, FitError> {
        if !(lower < upper) || !lower.is_finite() || !upper.is_finite() {
            return Err(FitError::InvalidBounds { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Map an unconstrained internal parameter into `[lower, upper]`.
    fn external(&self, internal: f64) -> f64 {
        self.lower + (self.upper - self.lower) * (internal.sin() + 1.0) / 2.0
    }

    /// Inverse of `external` for an in-bounds starting value.
    ///
    /// The result is kept a small margin inside `(-pi/2, pi/2)`: exactly on
    /// the boundary the transform's gradient vanishes and the solver could
    /// never move the parameter off its bound.
    fn internal(&self, external: f64) -> f64 {
        const MARGIN: f64 = 0.02;
        let clamped = external.clamp(self.lower, self.upper);
        let u = 2.0 * (clamped - self.lower) / (self.upper - self.lower) - 1.0;
        let limit = std::f64::consts::FRAC_PI_2 - MARGIN;
        u.clamp(-1.0, 1.0).asin().clamp(-limit, limit)
    }
}

struct BoundedProblem<F> {
    residuals_fn: F,
    bounds: Vec<Bound>,
    internal: DVector<f64>,
}

impl<F> BoundedProblem<F>
where
    F: Fn(&[f64]) -> Option<DVector<f64>>,
{
    fn external_params(&self, internal: &DVector<f64>) -> Vec<f64> {
        self.bounds
            .iter()
            .zip(internal.iter())
            .map(|(b, &x)| b.external(x))
            .collect()
    }

    fn residuals_at(&self, internal: &DVector<f64>) -> Option<DVector<f64>> {
        let external = self.external_params(internal);
        let r = (self.residuals_fn)(&external)?;
        r.iter().all(|v| v.is_finite()).then_some(r)
    }
}

impl<F> LeastSquaresProblem<f64, Dyn, Dyn> for BoundedProblem<F>
where
    F: Fn(&[f64]) -> Option<DVector<f64>>,
{
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, params: &DVector<f64>) {
        self.internal.copy_from(params);
    }

    fn params(&self) -> DVector<f64> {
        self.internal.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        self.residuals_at(&self.internal)
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        let n = self.internal.len();
        let m = self.residuals()?.len();
        let mut jacobian = DMatrix::zeros(m, n);
        for j in 0..n {
            let step = 1e-6 * (1.0 + self.internal[j].abs());
            let mut hi = self.internal.clone();
            hi[j] += step;
            let mut lo = self.internal.clone();
            lo[j] -= step;
            let r_hi = self.residuals_at(&hi)?;
            let r_lo = self.residuals_at(&lo)?;
            for i in 0..m {
                jacobian[(i, j)] = (r_hi[i] - r_lo[i]) / (2.0 * step);
            }
        }
        Some(jacobian)
    }
}

/// Minimize a residual function subject to box constraints.
///
/// `residuals_fn` receives external (constrained) parameters and returns the
/// residual vector, or `None` where the model is undefined. Returns the
/// fitted external parameters.
pub fn fit_bounded<F>(
    residuals_fn: F,
    initial: &[f64],
    bounds: &[Bound],
) -> Result<Vec<f64>, FitError>
where
    F: Fn(&[f64]) -> Option<DVector<f64>>,
{
    debug_assert_eq!(initial.len(), bounds.len());
    let internal: Vec<f64> = bounds
        .iter()
        .zip(initial.iter())
        .map(|(b, &x)| b.internal(x))
        .collect();

    let problem = BoundedProblem {
        residuals_fn,
        bounds: bounds.to_vec(),
        internal: DVector::from_vec(internal),
    };
    if problem.residuals().is_none() {
        return Err(FitError::NonFiniteModel);
    }

    let (solved, report) = LevenbergMarquardt::new().minimize(problem);
    if !report.termination.was_successful() {
        return Err(FitError::DidNotConverge(format!(
            "{:?}",
            report.termination
        )));
    }
    Ok(solved.external_params(&solved.internal))
}

/// Covariance of fitted parameters from the residual Jacobian in external
/// space: `(J^T J)^-1 * rss / (m - n)`.
///
/// Returns `None` when the problem is degenerate (singular normal matrix or
/// no residual degrees of freedom).
pub fn covariance<F>(residuals_fn: F, params: &[f64]) -> Option<DMatrix<f64>>
where
    F: Fn(&[f64]) -> Option<DVector<f64>>,
{
    let n = params.len();
    let r0 = residuals_fn(params)?;
    let m = r0.len();
    if m <= n {
        return None;
    }

    let mut jacobian = DMatrix::zeros(m, n);
    for j in 0..n {
        let step = 1e-6 * (1.0 + params[j].abs());
        let mut hi = params.to_vec();
        hi[j] += step;
        let mut lo = params.to_vec();
        lo[j] -= step;
        let r_hi = residuals_fn(&hi)?;
        let r_lo = residuals_fn(&lo)?;
        for i in 0..m {
            jacobian[(i, j)] = (r_hi[i] - r_lo[i]) / (2.0 * step);
        }
    }

    let normal = jacobian.transpose() * &jacobian;
    let inverse = normal.try_inverse()?;
    let rss: f64 = r0.iter().map(|r| r * r).sum();
    let sigma2 = rss / (m - n) as f64;
    Some(inverse * sigma2)
}
