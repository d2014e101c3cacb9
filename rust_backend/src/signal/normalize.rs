//! Per-curve value normalization.
//!
//! Applied per (sample, signal) group before plotting or comparison across
//! conditions. Temporal-mean normalization divides by the trapezoidal time
//! average so curves with different sampling densities normalize alike.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::{columns, frame};
use crate::error::AnalysisResult;

/// Normalization mode for the value column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalization {
    #[serde(rename = "min_max")]
    MinMax,
    #[serde(rename = "mean_std")]
    MeanStd,
    #[serde(rename = "temporal_mean")]
    TemporalMean,
}

/// Normalize values of one curve, times supplied for the temporal mode.
pub fn normalize_values(mode: Normalization, times: &[f64], values: &[f64]) -> Vec<f64> {
    match mode {
        Normalization::MinMax => {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let span = max - min;
            values.iter().map(|v| (v - min) / span).collect()
        }
        Normalization::MeanStd => {
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
            let std = var.sqrt();
            values.iter().map(|v| (v - mean) / std).collect()
        }
        Normalization::TemporalMean => {
            let mean = temporal_mean(times, values);
            values.iter().map(|v| v / mean).collect()
        }
    }
}

/// Trapezoidal time average of a curve; arithmetic mean when the time span
/// is degenerate.
fn temporal_mean(times: &[f64], values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 || times[n - 1] == times[0] {
        return values.iter().sum::<f64>() / n.max(1) as f64;
    }
    let mut integral = 0.0;
    for i in 1..n {
        integral += 0.5 * (values[i] + values[i - 1]) * (times[i] - times[i - 1]);
    }
    integral / (times[n - 1] - times[0])
}

/// Normalize the value column of a measurement table per (sample, signal).
pub fn normalize_frame(df: &DataFrame, mode: Normalization) -> AnalysisResult<DataFrame> {
    if df.height() == 0 {
        return Ok(DataFrame::empty());
    }
    let mut parts = Vec::new();
    for group in df.partition_by_stable([columns::SAMPLE, columns::SIGNAL], true)? {
        let (mut sorted, times, values) = frame::sorted_signal_frame(&group)?;
        if values.is_empty() {
            continue;
        }
        let normalized = normalize_values(mode, &times, &values);
        sorted.with_column(Column::new(columns::MEASUREMENT.into(), normalized))?;
        parts.push(sorted);
    }
    frame::concat_frames(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_max() {
        let out = normalize_values(Normalization::MinMax, &[0.0, 1.0, 2.0], &[2.0, 4.0, 6.0]);
        assert_eq!(out, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_mean_std() {
        let out = normalize_values(Normalization::MeanStd, &[0.0, 1.0], &[1.0, 3.0]);
        assert!((out[0] + 1.0).abs() < 1e-12);
        assert!((out[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_temporal_mean_constant_curve() {
        let out = normalize_values(
            Normalization::TemporalMean,
            &[0.0, 1.0, 4.0],
            &[5.0, 5.0, 5.0],
        );
        assert!(out.iter().all(|v| (v - 1.0).abs() < 1e-12));
    }
}
