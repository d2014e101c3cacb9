//! Smoothing strategy dispatch.
//!
//! The filter family is chosen once at configuration time; analyses call
//! `smooth`/`differentiate` without re-inspecting which family is active.

use crate::signal::{lowess, savgol, SignalError};

/// A configured smoothing filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmoothingMethod {
    SavitzkyGolay { window: usize, polyorder: usize },
    Lowess { frac: f64 },
}

impl SmoothingMethod {
    /// Smooth a series sampled at `xs`.
    pub fn smooth(&self, xs: &[f64], values: &[f64]) -> Result<Vec<f64>, SignalError> {
        match *self {
            SmoothingMethod::SavitzkyGolay { window, polyorder } => {
                savgol::savgol_filter(values, window, polyorder, 0, 1.0)
            }
            SmoothingMethod::Lowess { frac } => lowess::lowess(xs, values, frac),
        }
    }

    /// Smooth and differentiate in one pass.
    ///
    /// The derivative is taken with respect to the uniform step implied by
    /// the input grid. Savitzky-Golay differentiates through the filter
    /// itself; lowess smooths first and applies central differences.
    pub fn differentiate(&self, xs: &[f64], values: &[f64]) -> Result<Vec<f64>, SignalError> {
        match *self {
            SmoothingMethod::SavitzkyGolay { window, polyorder } => {
                savgol::savgol_filter(values, window, polyorder, 1, 1.0)
            }
            SmoothingMethod::Lowess { frac } => {
                let smoothed = lowess::lowess(xs, values, frac)?;
                Ok(crate::signal::gradient(&smoothed))
            }
        }
    }
}
