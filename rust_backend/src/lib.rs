//! Flapjack analysis core - quantitative analysis engine for plate-reader
//! time-series assay data.
//!
//! The crate consumes a tidy measurement table (one row per sample, signal,
//! time, value, plus grouping metadata) and produces transformed tables or
//! per-group summary values: velocities, expression rates, background-corrected
//! curves, ratiometric measures and inverse-inferred rate profiles. Data
//! retrieval, persistence and result delivery belong to the calling
//! application.

pub mod analysis;
pub mod background;
pub mod core;
pub mod error;
pub mod fitting;
pub mod inverse;
pub mod io;
pub mod services;
pub mod signal;

pub use crate::analysis::AnalysisEngine;
pub use crate::core::config::{AnalysisConfig, AnalysisKind, SmoothingType};
pub use crate::core::domain::Curve;
pub use crate::error::{AnalysisError, AnalysisResult};
pub use crate::services::{GroupingOrchestrator, NullSink, ProgressLog, ProgressSink};
