//! DataFrame helpers shared by the analysis entries.
//!
//! Thin wrappers around the polars eager API: typed column extraction with
//! casting, equality filters on metadata columns, and the collect-then-concat
//! result assembly used by every analysis loop.

use polars::prelude::*;

use crate::core::columns;
use crate::core::domain::Curve;
use crate::error::{AnalysisError, AnalysisResult};

/// Extract a column as `f64` values, casting numeric dtypes as needed.
/// Nulls become NaN so downstream code can treat them uniformly.
pub fn float_values(df: &DataFrame, name: &str) -> AnalysisResult<Vec<f64>> {
    let col = df
        .column(name)
        .map_err(|_| AnalysisError::MissingColumn(name.to_string()))?;
    let casted = col.cast(&DataType::Float64)?;
    let ca = casted.f64()?;
    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// String value of a column at one row, casting non-string dtypes.
pub fn str_value_at(df: &DataFrame, name: &str, row: usize) -> AnalysisResult<Option<String>> {
    let col = df
        .column(name)
        .map_err(|_| AnalysisError::MissingColumn(name.to_string()))?;
    let casted = col.cast(&DataType::String)?;
    let ca = casted.str()?;
    Ok(ca.get(row).map(|s| s.to_string()))
}

/// Filter rows where a (string-castable) column equals `value`.
pub fn filter_eq(df: &DataFrame, name: &str, value: &str) -> AnalysisResult<DataFrame> {
    let col = df
        .column(name)
        .map_err(|_| AnalysisError::MissingColumn(name.to_string()))?;
    let casted = col.cast(&DataType::String)?;
    let ca = casted.str()?;
    let mask: Vec<bool> = ca.into_iter().map(|v| v == Some(value)).collect();
    let mask = BooleanChunked::from_slice("mask".into(), &mask);
    Ok(df.filter(&mask)?)
}

/// Filter rows where a column equals `value`, case-insensitively.
pub fn filter_eq_ignore_case(df: &DataFrame, name: &str, value: &str) -> AnalysisResult<DataFrame> {
    let col = df
        .column(name)
        .map_err(|_| AnalysisError::MissingColumn(name.to_string()))?;
    let casted = col.cast(&DataType::String)?;
    let ca = casted.str()?;
    let mask: Vec<bool> = ca
        .into_iter()
        .map(|v| v.is_some_and(|s| s.eq_ignore_ascii_case(value)))
        .collect();
    let mask = BooleanChunked::from_slice("mask".into(), &mask);
    Ok(df.filter(&mask)?)
}

/// Drop rows where a column equals `value`, case-insensitively.
pub fn filter_ne_ignore_case(df: &DataFrame, name: &str, value: &str) -> AnalysisResult<DataFrame> {
    let col = df
        .column(name)
        .map_err(|_| AnalysisError::MissingColumn(name.to_string()))?;
    let casted = col.cast(&DataType::String)?;
    let ca = casted.str()?;
    let mask: Vec<bool> = ca
        .into_iter()
        .map(|v| !v.is_some_and(|s| s.eq_ignore_ascii_case(value)))
        .collect();
    let mask = BooleanChunked::from_slice("mask".into(), &mask);
    Ok(df.filter(&mask)?)
}

/// Sort a single-signal frame by time and extract its finite (time, value)
/// rows, keeping frame and vectors aligned.
///
/// Returns the filtered frame alongside the time and value vectors so that
/// analyses can write a transformed value column back onto the same rows.
pub fn sorted_signal_frame(df: &DataFrame) -> AnalysisResult<(DataFrame, Vec<f64>, Vec<f64>)> {
    let sorted = df.sort([columns::TIME], SortMultipleOptions::default())?;
    let times = float_values(&sorted, columns::TIME)?;
    let values = float_values(&sorted, columns::MEASUREMENT)?;
    let keep: Vec<bool> = times
        .iter()
        .zip(values.iter())
        .map(|(t, v)| t.is_finite() && v.is_finite())
        .collect();
    if keep.iter().all(|&k| k) {
        return Ok((sorted, times, values));
    }
    let mask = BooleanChunked::from_slice("mask".into(), &keep);
    let filtered = sorted.filter(&mask)?;
    let (times, values) = times
        .into_iter()
        .zip(values)
        .filter(|(t, v)| t.is_finite() && v.is_finite())
        .unzip();
    Ok((filtered, times, values))
}

/// Extract the sorted curve of one single-signal frame.
pub fn curve_of(df: &DataFrame) -> AnalysisResult<Curve> {
    let times = float_values(df, columns::TIME)?;
    let values = float_values(df, columns::MEASUREMENT)?;
    Ok(Curve::new(&times, &values))
}

/// Vertically concatenate per-group results into one table.
///
/// Collecting group outputs into a list and concatenating once avoids the
/// quadratic cost of growing a shared accumulator inside the group loop.
pub fn concat_frames(frames: Vec<DataFrame>) -> AnalysisResult<DataFrame> {
    let mut iter = frames.into_iter();
    let Some(mut acc) = iter.next() else {
        return Ok(DataFrame::empty());
    };
    for df in iter {
        acc.vstack_mut(&df)?;
    }
    Ok(acc)
}
