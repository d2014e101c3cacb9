//! Parametric curve models and nonlinear fitting.

pub mod hill;
pub mod least_squares;
pub mod models;
pub mod regression;

pub use hill::{fit_hill, HillFit};
pub use least_squares::{fit_bounded, Bound};
pub use models::{fit_gompertz, GompertzFit};

/// Error type for model fitting
#[derive(Debug, Clone, thiserror::Error)]
pub enum FitError {
    #[error("least-squares solver failed to converge: {0}")]
    DidNotConverge(String),

    #[error("fit requires at least {need} data points, got {got}")]
    TooFewPoints { got: usize, need: usize },

    #[error("invalid parameter bounds: lower {lower} must be below upper {upper}")]
    InvalidBounds { lower: f64, upper: f64 },

    #[error("model produced non-finite values over the data range")]
    NonFiniteModel,
}
