//! Lowess local regression smoothing.
//!
//! Locally weighted linear regression with tricube weights over a
//! fraction-of-the-data bandwidth. A single weighted pass; assay curves are
//! well-behaved enough that robustness iterations have no counterpart here.

use crate::signal::SignalError;

/// Smooth `ys` over sorted `xs` with bandwidth `frac` (fraction of points
/// in each local window, clamped to at least 2).
pub fn lowess(xs: &[f64], ys: &[f64], frac: f64) -> Result<Vec<f64>, SignalError> {
    let n = xs.len();
    if n < 2 {
        return Err(SignalError::TooFewPoints { got: n, need: 2 });
    }
    debug_assert_eq!(n, ys.len());

    let r = ((frac * n as f64).ceil() as usize).clamp(2, n);
    let mut out = Vec::with_capacity(n);

    for i in 0..n {
        // Leftmost candidate window of r consecutive points, slid right
        // while the next window is strictly closer to xs[i].
        let mut lo = i.saturating_sub(r - 1).min(n - r);
        while lo + r < n && xs[lo + r] - xs[i] < xs[i] - xs[lo] {
            lo += 1;
        }
        out.push(fit_point(xs, ys, lo, lo + r, xs[i]));
    }
    Ok(out)
}

/// Tricube-weighted linear fit over `[lo, hi)`, evaluated at `x0`.
fn fit_point(xs: &[f64], ys: &[f64], lo: usize, hi: usize, x0: f64) -> f64 {
    let dmax = xs[lo..hi]
        .iter()
        .map(|&x| (x - x0).abs())
        .fold(0.0_f64, f64::max);

    if dmax == 0.0 {
        // All points coincide with x0; plain average.
        let m = (hi - lo) as f64;
        return ys[lo..hi].iter().sum::<f64>() / m;
    }

    let mut sw = 0.0;
    let mut swx = 0.0;
    let mut swy = 0.0;
    let mut swxx = 0.0;
    let mut swxy = 0.0;
    for k in lo..hi {
        let u = ((xs[k] - x0) / dmax).abs();
        let w = if u < 1.0 {
            let t = 1.0 - u * u * u;
            t * t * t
        } else {
            0.0
        };
        sw += w;
        swx += w * xs[k];
        swy += w * ys[k];
        swxx += w * xs[k] * xs[k];
        swxy += w * xs[k] * ys[k];
    }

    let denom = sw * swxx - swx * swx;
    if denom.abs() < 1e-12 * sw.max(1.0) {
        // Degenerate local design; fall back to the weighted mean.
        return if sw > 0.0 { swy / sw } else { ys[lo] };
    }
    let slope = (sw * swxy - swx * swy) / denom;
    let intercept = (swy - slope * swx) / sw;
    intercept + slope * x0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_data_is_unchanged() {
        let xs: Vec<f64> = (0..50).map(|i| i as f64 * 0.2).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
        let smoothed = lowess(&xs, &ys, 0.3).unwrap();
        for (s, y) in smoothed.iter().zip(ys.iter()) {
            assert!((s - y).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reduces_noise() {
        let xs: Vec<f64> = (0..60).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs
            .iter()
            .enumerate()
            .map(|(i, _)| 10.0 + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let smoothed = lowess(&xs, &ys, 0.25).unwrap();
        for s in &smoothed[5..55] {
            assert!((s - 10.0).abs() < 0.5);
        }
    }

    #[test]
    fn test_too_few_points() {
        assert!(matches!(
            lowess(&[1.0], &[1.0], 0.5),
            Err(SignalError::TooFewPoints { .. })
        ));
    }
}
