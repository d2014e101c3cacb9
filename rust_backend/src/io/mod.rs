//! Measurement-table loading.
//!
//! The tidy-table collaborator surface: loads a measurement table from CSV
//! or row-oriented JSON and validates the column contract. Plate-reader
//! spreadsheet ingestion belongs to the calling application.

pub mod loaders;

pub use loaders::{validate_columns, MeasurementLoadResult, MeasurementLoader, MeasurementSourceType};
