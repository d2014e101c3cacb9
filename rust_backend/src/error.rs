//! Error types for the analysis core.

use polars::prelude::PolarsError;

use crate::fitting::FitError;
use crate::signal::SignalError;

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Error type for analysis operations.
///
/// Configuration errors surface before any computation begins; signal and
/// fit errors are recovered per sample group by the skip policy in the
/// engine and only reach the caller from direct, single-curve use.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("unknown analysis type: {0:?}")]
    UnknownAnalysis(String),

    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("measurements table is missing column {0:?}")]
    MissingColumn(String),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Fit(#[from] FitError),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl AnalysisError {
    /// Whether the per-group skip policy recovers from this error.
    ///
    /// Curves that are too short, domains that do not overlap and fits that
    /// fail to converge exclude their group from the output; everything else
    /// propagates.
    pub fn is_skippable(&self) -> bool {
        match self {
            AnalysisError::Signal(err) => matches!(
                err,
                SignalError::TooFewPoints { .. }
                    | SignalError::WindowTooLong { .. }
                    | SignalError::EmptyDomain
            ),
            AnalysisError::Fit(err) => matches!(
                err,
                FitError::DidNotConverge(_) | FitError::TooFewPoints { .. }
            ),
            _ => false,
        }
    }
}
