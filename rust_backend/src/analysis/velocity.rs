//! Velocity: smoothed rate of change of each curve.

use log::debug;
use polars::prelude::*;

use crate::analysis::skip_or_err;
use crate::core::config::AnalysisConfig;
use crate::core::frame::{concat_frames, sorted_signal_frame};
use crate::core::columns;
use crate::error::AnalysisResult;
use crate::signal::SignalError;

/// Replace the value column of every (sample, signal) curve with its
/// estimated rate of change.
pub(crate) fn run(config: &AnalysisConfig, df: &DataFrame) -> AnalysisResult<DataFrame> {
    let samples = df.partition_by_stable([columns::SAMPLE], true)?;
    let n_samples = samples.len();
    let mut out = Vec::new();

    for (i, sample) in samples.iter().enumerate() {
        debug!("computing velocity of sample {} of {}", i + 1, n_samples);
        for signal_group in sample.partition_by_stable([columns::SIGNAL], true)? {
            if let Some(frame) = skip_or_err(velocity_curve(config, &signal_group))? {
                out.push(frame);
            }
        }
    }

    if out.is_empty() {
        debug!("no curves long enough for velocity");
    }
    concat_frames(out)
}

fn velocity_curve(config: &AnalysisConfig, group: &DataFrame) -> AnalysisResult<DataFrame> {
    let (mut frame, times, values) = sorted_signal_frame(group)?;

    let min_points = config.min_curve_points();
    if values.len() <= min_points {
        return Err(SignalError::TooFewPoints {
            got: values.len(),
            need: min_points + 1,
        }
        .into());
    }

    // The filter smooths (pre-window) and differentiates in one pass; the
    // derivative is per grid step, as the curve registration implies.
    let mut velocity = match config.pre_smoother() {
        Some(smoother) => smoother.differentiate(&times, &values)?,
        None => crate::signal::gradient(&values),
    };
    if let Some(smoother) = config.post_smoother() {
        velocity = smoother.smooth(&times, &velocity)?;
    }

    frame.with_column(Column::new(columns::MEASUREMENT.into(), velocity))?;
    Ok(frame)
}
