//! Savitzky-Golay smoothing and differentiation.
//!
//! A local least-squares polynomial fit over a sliding window of odd length.
//! Boundary windows use a polynomial fit valid to the edge rather than
//! truncating or NaN-padding (the conventional "interp" edge mode), so the
//! output has the same length as the input. Derivatives are taken with
//! respect to the uniform step implied by the input grid, scaled by `delta`.

use nalgebra::{DMatrix, DVector};

use crate::signal::SignalError;

/// Smooth `values` (or take the `deriv`-th derivative) with a Savitzky-Golay
/// filter of odd `window` length and polynomial `polyorder`.
///
/// # Arguments
/// * `values` - the uniformly sampled series
/// * `window` - odd window length, `3 <= window <= values.len()`
/// * `polyorder` - local polynomial degree, less than `window`
/// * `deriv` - derivative order, 0 for plain smoothing
/// * `delta` - grid step the derivative is taken with respect to
pub fn savgol_filter(
    values: &[f64],
    window: usize,
    polyorder: usize,
    deriv: usize,
    delta: f64,
) -> Result<Vec<f64>, SignalError> {
    let n = values.len();
    if window < 3 || window % 2 == 0 {
        return Err(SignalError::InvalidWindow(window));
    }
    if polyorder >= window {
        return Err(SignalError::OrderTooHigh {
            order: polyorder,
            window,
        });
    }
    if window > n {
        return Err(SignalError::WindowTooLong { window, len: n });
    }

    let half = window / 2;
    let scale = delta.powi(deriv as i32);

    // Least-squares projection for centered windows: evaluating the fitted
    // polynomial's deriv-th derivative at the window center reduces to a
    // single convolution coefficient row.
    let centered: Vec<f64> = (0..window).map(|i| i as f64 - half as f64).collect();
    let center_proj = projection(&centered, polyorder)?;
    let mut center_coeffs = vec![0.0; window];
    if deriv <= polyorder {
        let factor = falling_factorial(deriv, deriv);
        for k in 0..window {
            center_coeffs[k] = factor * center_proj[(deriv, k)];
        }
    }

    let mut out = vec![0.0; n];
    for i in half..n - half {
        let mut acc = 0.0;
        for k in 0..window {
            acc += center_coeffs[k] * values[i - half + k];
        }
        out[i] = acc / scale;
    }

    // Edge windows: fit one polynomial over the first/last full window and
    // evaluate it at the boundary positions.
    let edge_xs: Vec<f64> = (0..window).map(|i| i as f64).collect();
    let edge_proj = projection(&edge_xs, polyorder)?;

    let left = DVector::from_column_slice(&values[..window]);
    let beta_left = &edge_proj * left;
    for i in 0..half {
        out[i] = eval_poly_deriv(beta_left.as_slice(), i as f64, deriv) / scale;
    }

    let right = DVector::from_column_slice(&values[n - window..]);
    let beta_right = &edge_proj * right;
    for i in n - half..n {
        let x0 = (i - (n - window)) as f64;
        out[i] = eval_poly_deriv(beta_right.as_slice(), x0, deriv) / scale;
    }

    Ok(out)
}

/// `(A^T A)^-1 A^T` for a polynomial design over the given positions.
fn projection(xs: &[f64], order: usize) -> Result<DMatrix<f64>, SignalError> {
    let design = DMatrix::from_fn(xs.len(), order + 1, |i, j| xs[i].powi(j as i32));
    let normal = design.transpose() * &design;
    let inverse = normal.try_inverse().ok_or(SignalError::SingularDesign)?;
    Ok(inverse * design.transpose())
}

/// Evaluate the `deriv`-th derivative of a polynomial (coefficients in
/// ascending order) at `x0`.
fn eval_poly_deriv(beta: &[f64], x0: f64, deriv: usize) -> f64 {
    let mut acc = 0.0;
    for (j, &b) in beta.iter().enumerate().skip(deriv) {
        acc += b * falling_factorial(j, deriv) * x0.powi((j - deriv) as i32);
    }
    acc
}

/// `j * (j-1) * ... * (j-d+1)`, the derivative factor of `x^j`.
fn falling_factorial(j: usize, d: usize) -> f64 {
    (j - d + 1..=j).product::<usize>().max(1) as f64
}
