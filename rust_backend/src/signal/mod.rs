//! Signal registration and smoothing.
//!
//! Registers irregular (time, value) series onto shared grids via linear
//! interpolation, and smooths/differentiates them with either a
//! Savitzky-Golay filter or lowess local regression. Nearly every
//! higher-level analysis goes through this module.

pub mod grid;
pub mod interpolate;
pub mod lowess;
pub mod normalize;
pub mod savgol;
pub mod smoothing;

pub use interpolate::LinearInterpolator;
pub use smoothing::SmoothingMethod;

/// Error type for signal-layer operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignalError {
    #[error("series has {got} points, need at least {need}")]
    TooFewPoints { got: usize, need: usize },

    #[error("window length {window} exceeds series length {len}")]
    WindowTooLong { window: usize, len: usize },

    #[error("window length {0} must be odd and >= 3")]
    InvalidWindow(usize),

    #[error("polynomial order {order} must be less than window length {window}")]
    OrderTooHigh { order: usize, window: usize },

    #[error("point {x} outside interpolation domain [{min}, {max}]")]
    OutOfDomain { x: f64, min: f64, max: f64 },

    #[error("curves do not overlap in time")]
    EmptyDomain,

    #[error("smoothing filter design failed: singular normal equations")]
    SingularDesign,
}

/// Derivative of a uniformly-spaced series with respect to its index step.
///
/// Central differences in the interior, one-sided at the ends. Used as the
/// differentiation step for lowess smoothing, where the filter itself has no
/// derivative output.
pub fn gradient(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    match n {
        0 => vec![],
        1 => vec![0.0],
        _ => {
            let mut out = Vec::with_capacity(n);
            out.push(values[1] - values[0]);
            for i in 1..n - 1 {
                out.push((values[i + 1] - values[i - 1]) / 2.0);
            }
            out.push(values[n - 1] - values[n - 2]);
            out
        }
    }
}
