//! Core domain types for the analysis engine.
//!
//! This module defines the measurement-table column contract, the `Curve`
//! series type that every analysis operates on, and the immutable
//! `AnalysisConfig` built once per analysis request.

pub mod columns;
pub mod config;
pub mod domain;
pub mod frame;

pub use config::{AnalysisConfig, AnalysisKind, SmoothingType};
pub use domain::Curve;
