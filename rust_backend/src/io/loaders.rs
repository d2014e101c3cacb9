//! Loaders for tidy measurement tables.

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Deserialize;
use std::path::Path;

use crate::core::columns;
use crate::error::{AnalysisError, AnalysisResult};

/// Represents the source type of measurement data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementSourceType {
    Json,
    Csv,
}

/// Result of loading measurement data
#[derive(Debug)]
pub struct MeasurementLoadResult {
    pub dataframe: DataFrame,
    pub source_type: MeasurementSourceType,
    pub num_rows: usize,
    pub num_samples: usize,
}

impl MeasurementLoadResult {
    pub fn new(dataframe: DataFrame, source_type: MeasurementSourceType) -> Result<Self> {
        let num_rows = dataframe.height();
        let num_samples = dataframe
            .column(columns::SAMPLE)
            .context("measurement table has no Sample column")?
            .as_materialized_series()
            .n_unique()
            .context("failed to count samples")?;
        Ok(Self {
            dataframe,
            source_type,
            num_rows,
            num_samples,
        })
    }
}

/// One row of a row-oriented JSON measurement table.
#[derive(Debug, Deserialize)]
struct MeasurementRecord {
    #[serde(rename = "Sample")]
    sample: String,
    #[serde(rename = "Signal")]
    signal: String,
    #[serde(rename = "Signal_id", default)]
    signal_id: Option<String>,
    #[serde(rename = "Measurement")]
    measurement: f64,
    #[serde(rename = "Time")]
    time: f64,
    #[serde(rename = "Assay", default)]
    assay: Option<String>,
    #[serde(rename = "Study", default)]
    study: Option<String>,
    #[serde(rename = "Media", default)]
    media: Option<String>,
    #[serde(rename = "Strain", default)]
    strain: Option<String>,
    #[serde(rename = "Vector", default)]
    vector: Option<String>,
    #[serde(rename = "Supplement", default)]
    supplement: Option<String>,
    #[serde(rename = "Chemical", default)]
    chemical: Option<String>,
    #[serde(rename = "Chemical_id", default)]
    chemical_id: Option<String>,
    #[serde(rename = "Concentration", default)]
    concentration: Option<f64>,
    #[serde(rename = "Row", default)]
    row: Option<i64>,
    #[serde(rename = "Column", default)]
    col: Option<i64>,
}

/// Unified interface for loading measurement tables from JSON or CSV
pub struct MeasurementLoader;

impl MeasurementLoader {
    /// Load measurement data from a file (auto-detects JSON or CSV)
    pub fn load_from_file(path: &Path) -> Result<MeasurementLoadResult> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .context("File has no extension")?;

        match extension.to_lowercase().as_str() {
            "json" => Self::load_from_json(path),
            "csv" => Self::load_from_csv(path),
            _ => anyhow::bail!("Unsupported file format: {}", extension),
        }
    }

    /// Load measurement data from a CSV file with a header row
    pub fn load_from_csv(path: &Path) -> Result<MeasurementLoadResult> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .context("Failed to open CSV file")?
            .finish()
            .context("Failed to parse CSV file")?;

        validate_columns(&df).context("CSV is missing required columns")?;
        MeasurementLoadResult::new(df, MeasurementSourceType::Csv)
    }

    /// Load measurement data from a row-oriented JSON file
    pub fn load_from_json(path: &Path) -> Result<MeasurementLoadResult> {
        let contents = std::fs::read_to_string(path).context("Failed to read JSON file")?;
        Self::load_from_json_str(&contents)
    }

    /// Load measurement data from a row-oriented JSON string
    pub fn load_from_json_str(json_str: &str) -> Result<MeasurementLoadResult> {
        let deserializer = &mut serde_json::Deserializer::from_str(json_str);
        let records: Vec<MeasurementRecord> = serde_path_to_error::deserialize(deserializer)
            .context("Failed to parse measurement JSON")?;
        let df = records_to_dataframe(&records).context("Failed to build DataFrame")?;
        MeasurementLoadResult::new(df, MeasurementSourceType::Json)
    }
}

fn records_to_dataframe(records: &[MeasurementRecord]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Column::new(
            columns::SAMPLE.into(),
            records.iter().map(|r| r.sample.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::SIGNAL.into(),
            records.iter().map(|r| r.signal.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::SIGNAL_ID.into(),
            records
                .iter()
                .map(|r| r.signal_id.clone())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            columns::MEASUREMENT.into(),
            records.iter().map(|r| r.measurement).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::TIME.into(),
            records.iter().map(|r| r.time).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::ASSAY.into(),
            records.iter().map(|r| r.assay.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::STUDY.into(),
            records.iter().map(|r| r.study.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::MEDIA.into(),
            records.iter().map(|r| r.media.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::STRAIN.into(),
            records.iter().map(|r| r.strain.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::VECTOR.into(),
            records.iter().map(|r| r.vector.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::SUPPLEMENT.into(),
            records
                .iter()
                .map(|r| r.supplement.clone())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            columns::CHEMICAL.into(),
            records
                .iter()
                .map(|r| r.chemical.clone())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            columns::CHEMICAL_ID.into(),
            records
                .iter()
                .map(|r| r.chemical_id.clone())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            columns::CONCENTRATION.into(),
            records.iter().map(|r| r.concentration).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::ROW.into(),
            records.iter().map(|r| r.row).collect::<Vec<_>>(),
        ),
        Column::new(
            columns::COLUMN.into(),
            records.iter().map(|r| r.col).collect::<Vec<_>>(),
        ),
    ])
}

/// Check that the table carries every column an analysis requires.
pub fn validate_columns(df: &DataFrame) -> AnalysisResult<()> {
    for name in columns::REQUIRED {
        if df.column(name).is_err() {
            return Err(AnalysisError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}
