//! Parametric growth and dose-response models.
//!
//! Pure functions of time and parameters, plus the Gompertz model fit used
//! by the ratiometric analyses. All growth models divide by `y0` and take
//! logs of `ymax/y0`; callers must filter non-positive biomass first.

use nalgebra::DVector;
use std::f64::consts::E;

use crate::core::config::GompertzBounds;
use crate::fitting::least_squares::{fit_bounded, Bound};
use crate::fitting::FitError;

/// Exponential growth `y0 * exp(k t)`.
pub fn exponential_growth(t: f64, y0: f64, k: f64) -> f64 {
    y0 * (k * t).exp()
}

/// Growth rate of the exponential model, constant `k`.
pub fn exponential_growth_rate(_t: f64, _y0: f64, k: f64) -> f64 {
    k
}

/// Gompertz growth curve.
///
/// `A = ln(ymax/y0)`; density at time `t` for initial density `y0`,
/// asymptotic density `ymax`, maximum growth rate `um` and lag time `l`.
pub fn gompertz(t: f64, y0: f64, ymax: f64, um: f64, l: f64) -> f64 {
    let a = (ymax / y0).ln();
    let log_rel_od = a * (-(((um * E) / a) * (l - t) + 1.0).exp()).exp();
    y0 * log_rel_od.exp()
}

/// Analytic time-derivative of the Gompertz growth curve.
///
/// The chain-rule factor `um * exp(B - exp(B+1) + 2)` with
/// `B = e*um*(l-t)/A` is the specific (per-capita) growth rate; multiplying
/// by the density gives d(od)/dt in closed form.
pub fn gompertz_growth_rate(t: f64, y0: f64, ymax: f64, um: f64, l: f64) -> f64 {
    gompertz(t, y0, ymax, um, l) * gompertz_specific_growth_rate(t, y0, ymax, um, l)
}

/// Specific growth rate `d(ln od)/dt` of the Gompertz model.
///
/// Peaks at exactly `um` at the peak-growth time `A/(e*um) + l`.
pub fn gompertz_specific_growth_rate(t: f64, y0: f64, ymax: f64, um: f64, l: f64) -> f64 {
    let a = (ymax / y0).ln();
    let b = (E * um * (l - t)) / a;
    um * (b - (b + 1.0).exp() + 2.0).exp()
}

/// Hill dose-response curve `(a*(x/k)^n + b) / (1 + (x/k)^n)`.
pub fn hill(x: f64, a: f64, b: f64, k: f64, n: f64) -> f64 {
    let xn = (x / k).powf(n);
    (a * xn + b) / (1.0 + xn)
}

/// A fitted Gompertz model.
#[derive(Debug, Clone, Copy)]
pub struct GompertzFit {
    pub y0: f64,
    pub ymax: f64,
    pub um: f64,
    pub lag: f64,
}

impl GompertzFit {
    /// `A = ln(ymax/y0)`.
    pub fn log_ratio(&self) -> f64 {
        (self.ymax / self.y0).ln()
    }

    /// Time of peak growth `tm = A/(e*um) + l`.
    pub fn peak_growth_time(&self) -> f64 {
        self.log_ratio() / (E * self.um) + self.lag
    }

    /// Doubling time at peak growth `ln(2)/um`.
    pub fn doubling_time(&self) -> f64 {
        2.0_f64.ln() / self.um
    }

    /// Density at time `t` under the fitted model.
    pub fn density(&self, t: f64) -> f64 {
        gompertz(t, self.y0, self.ymax, self.um, self.lag)
    }
}

/// Fit the Gompertz model to a (time, density) series within box bounds.
///
/// Densities must be strictly positive; the series needs at least as many
/// points as parameters. Non-convergence is returned, not swallowed - the
/// caller owns the skip policy.
pub fn fit_gompertz(
    times: &[f64],
    densities: &[f64],
    bounds: &GompertzBounds,
) -> Result<GompertzFit, FitError> {
    if times.len() < 4 {
        return Err(FitError::TooFewPoints {
            got: times.len(),
            need: 4,
        });
    }

    let box_bounds = [
        Bound::new(bounds.lower[0], bounds.upper[0])?,
        Bound::new(bounds.lower[1], bounds.upper[1])?,
        Bound::new(bounds.lower[2], bounds.upper[2])?,
        Bound::new(bounds.lower[3], bounds.upper[3])?,
    ];

    // Data-driven starting point, clamped strictly inside the bounds.
    let min_density = densities.iter().copied().fold(f64::INFINITY, f64::min);
    let max_density = densities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let initial = [
        clamp_interior(min_density, &box_bounds[0]),
        clamp_interior(max_density, &box_bounds[1]),
        clamp_interior(1.0, &box_bounds[2]),
        clamp_interior(times[0], &box_bounds[3]),
    ];

    let residuals = |p: &[f64]| {
        let mut out = DVector::zeros(times.len());
        for (i, (&t, &d)) in times.iter().zip(densities.iter()).enumerate() {
            let model = gompertz(t, p[0], p[1], p[2], p[3]);
            if !model.is_finite() {
                return None;
            }
            out[i] = d - model;
        }
        Some(out)
    };

    let fitted = fit_bounded(residuals, &initial, &box_bounds)?;
    Ok(GompertzFit {
        y0: fitted[0],
        ymax: fitted[1],
        um: fitted[2],
        lag: fitted[3],
    })
}

fn clamp_interior(value: f64, bound: &Bound) -> f64 {
    let margin = 1e-3 * (bound.upper - bound.lower);
    value.clamp(bound.lower + margin, bound.upper - margin)
}
