//! Hill dose-response fitting for induction curves.
//!
//! Concentrations and expression values are normalized to their maxima
//! before fitting so one set of bounds works across assays, then the fitted
//! parameters and their standard errors are rescaled back.

use nalgebra::DVector;

use crate::fitting::least_squares::{covariance, fit_bounded, Bound};
use crate::fitting::models::hill;
use crate::fitting::FitError;
use crate::signal::grid::linspace;

/// A fitted Hill dose-response curve with parameter uncertainties and a
/// dense fitted curve over the observed log-concentration range.
#[derive(Debug, Clone)]
pub struct HillFit {
    pub a: f64,
    pub b: f64,
    pub k: f64,
    pub n: f64,
    pub a_std: f64,
    pub b_std: f64,
    pub k_std: f64,
    pub n_std: f64,
    pub concentrations: Vec<f64>,
    pub values: Vec<f64>,
}

/// Fit the Hill function to an induction curve.
///
/// # Arguments
/// * `concentrations` - inducer concentrations, at least one strictly positive
/// * `values` - expression values, same length
pub fn fit_hill(concentrations: &[f64], values: &[f64]) -> Result<HillFit, FitError> {
    if concentrations.len() < 5 {
        return Err(FitError::TooFewPoints {
            got: concentrations.len(),
            need: 5,
        });
    }

    let scale_y = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let scale_c = concentrations
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    if !(scale_y > 0.0) || !(scale_c > 0.0) {
        return Err(FitError::NonFiniteModel);
    }
    let norm_y: Vec<f64> = values.iter().map(|v| v / scale_y).collect();
    let norm_c: Vec<f64> = concentrations.iter().map(|c| c / scale_c).collect();

    // Sensible bounds for normalized values.
    let bounds = [
        Bound::new(0.0, 1.0)?,
        Bound::new(0.0, 1.0)?,
        Bound::new(0.0, 1.0)?,
        Bound::new(1.0, 5.0)?,
    ];

    let residuals = move |p: &[f64]| {
        let mut out = DVector::zeros(norm_c.len());
        for (i, (&c, &y)) in norm_c.iter().zip(norm_y.iter()).enumerate() {
            let model = hill(c, p[0], p[1], p[2], p[3]);
            if !model.is_finite() {
                return None;
            }
            out[i] = y - model;
        }
        Some(out)
    };

    let initial = [0.9, 0.1, 0.5, 2.0];
    let fitted = fit_bounded(&residuals, &initial, &bounds)?;

    let stds = covariance(&residuals, &fitted)
        .map(|cov| [cov[(0, 0)], cov[(1, 1)], cov[(2, 2)], cov[(3, 3)]].map(|v| v.max(0.0).sqrt()))
        .unwrap_or([f64::NAN; 4]);

    // Rescale parameters back to data units.
    let (a, b, k, n) = (
        fitted[0] * scale_y,
        fitted[1] * scale_y,
        fitted[2] * scale_c,
        fitted[3],
    );

    // Dense fitted curve over the positive concentration range, log-spaced.
    let min_positive = concentrations
        .iter()
        .copied()
        .filter(|&c| c > 0.0)
        .fold(f64::INFINITY, f64::min);
    let log_grid = linspace(min_positive.log10(), scale_c.log10(), 200);
    let dense_concs: Vec<f64> = log_grid.iter().map(|&x| 10.0_f64.powf(x)).collect();
    let dense_values: Vec<f64> = dense_concs.iter().map(|&c| hill(c, a, b, k, n)).collect();

    Ok(HillFit {
        a,
        b,
        k,
        n,
        a_std: stds[0] * scale_y,
        b_std: stds[1] * scale_y,
        k_std: stds[2] * scale_c,
        n_std: stds[3],
        concentrations: dense_concs,
        values: dense_values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_hill_parameters() {
        let (a, b, k, n) = (1000.0, 50.0, 10.0, 2.0);
        let concs: Vec<f64> = [0.1, 0.3, 1.0, 3.0, 10.0, 30.0, 100.0, 300.0].to_vec();
        let values: Vec<f64> = concs.iter().map(|&c| hill(c, a, b, k, n)).collect();

        let fit = fit_hill(&concs, &values).unwrap();
        assert!((fit.a - a).abs() / a < 0.05, "a = {}", fit.a);
        assert!((fit.b - b).abs() / b < 0.2, "b = {}", fit.b);
        assert!((fit.k - k).abs() / k < 0.1, "k = {}", fit.k);
        assert!((fit.n - n).abs() / n < 0.1, "n = {}", fit.n);
        assert_eq!(fit.concentrations.len(), 200);
    }

    #[test]
    fn test_too_few_points() {
        assert!(matches!(
            fit_hill(&[1.0, 2.0], &[1.0, 2.0]),
            Err(FitError::TooFewPoints { .. })
        ));
    }
}
