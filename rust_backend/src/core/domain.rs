//! The `Curve` series type.
//!
//! A `Curve` is the ordered (time, value) series for one sample/signal pair.
//! Times are the independent variable for all interpolation; duplicate time
//! points are not rejected but leave interpolation results undefined, so
//! callers must dedupe upstream if their acquisition produces them.

use std::cmp::Ordering;

use crate::signal::interpolate::LinearInterpolator;
use crate::signal::SignalError;

/// An ordered (time, value) series for one sample/signal pair.
///
/// Construction sorts by time and drops non-finite rows, so a `Curve` is
/// always safe to hand to the interpolation and smoothing layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl Curve {
    /// Build a curve from parallel time/value slices.
    ///
    /// Rows with a non-finite time or value are dropped; the remainder is
    /// sorted by time (stable, so co-timed rows keep their input order).
    pub fn new(times: &[f64], values: &[f64]) -> Self {
        let mut pairs: Vec<(f64, f64)> = times
            .iter()
            .zip(values.iter())
            .filter(|(t, v)| t.is_finite() && v.is_finite())
            .map(|(&t, &v)| (t, v))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        Self {
            times: pairs.iter().map(|p| p.0).collect(),
            values: pairs.iter().map(|p| p.1).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Time range `(min, max)` of the curve, `None` when empty.
    pub fn domain(&self) -> Option<(f64, f64)> {
        match (self.times.first(), self.times.last()) {
            (Some(&a), Some(&b)) => Some((a, b)),
            _ => None,
        }
    }

    /// Overlapping time range with another curve, `None` when disjoint.
    pub fn overlap(&self, other: &Curve) -> Option<(f64, f64)> {
        let (a0, a1) = self.domain()?;
        let (b0, b1) = other.domain()?;
        let lo = a0.max(b0);
        let hi = a1.min(b1);
        (lo < hi).then_some((lo, hi))
    }

    /// Subset of points with time in `[t0, t1]`.
    pub fn window(&self, t0: f64, t1: f64) -> Curve {
        let (times, values): (Vec<f64>, Vec<f64>) = self
            .times
            .iter()
            .zip(self.values.iter())
            .filter(|(&t, _)| t >= t0 && t <= t1)
            .map(|(&t, &v)| (t, v))
            .unzip();
        Curve { times, values }
    }

    /// Linear interpolator over this curve.
    pub fn interpolator(&self) -> Result<LinearInterpolator, SignalError> {
        LinearInterpolator::new(self.times.clone(), self.values.clone())
    }

    /// Retain only points with a strictly positive value.
    ///
    /// Growth-model fits take logarithms of the value column; this is the
    /// positivity guard callers apply beforehand.
    pub fn positive(&self) -> Curve {
        let (times, values): (Vec<f64>, Vec<f64>) = self
            .times
            .iter()
            .zip(self.values.iter())
            .filter(|(_, &v)| v > 0.0)
            .map(|(&t, &v)| (t, v))
            .unzip();
        Curve { times, values }
    }
}
