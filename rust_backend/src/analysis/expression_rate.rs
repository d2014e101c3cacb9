//! Expression-rate analyses.
//!
//! The indirect entry estimates per-capita synthesis as d(reporter)/dt
//! divided by biomass; the direct entry infers rates through the inverse
//! solver's forward model. Both optionally background-correct first.

use log::debug;
use polars::prelude::*;

use crate::analysis::skip_or_err;
use crate::background::BackgroundCorrector;
use crate::core::columns;
use crate::core::config::AnalysisConfig;
use crate::core::frame::{concat_frames, filter_eq, float_values, sorted_signal_frame, str_value_at};
use crate::error::AnalysisResult;
use crate::inverse::{infer_growth_rate, infer_synthesis_rate};
use crate::signal::grid::arange;
use crate::signal::{LinearInterpolator, SignalError};

/// Time step of the inverse-solver fit grid.
const DIRECT_GRID_STEP: f64 = 0.1;

/// Indirect expression rate: `d(reporter)/dt / biomass(t)` on the
/// overlapping time domain of each signal and the density signal.
pub(crate) fn indirect(
    config: &AnalysisConfig,
    background: &mut BackgroundCorrector,
    df: &DataFrame,
) -> AnalysisResult<DataFrame> {
    let working = prepare(config, background, df)?;
    if working.height() == 0 {
        return Ok(DataFrame::empty());
    }
    let biomass = config.biomass_signal.as_deref().unwrap_or_default();

    let samples = working.partition_by_stable([columns::SAMPLE], true)?;
    let n_samples = samples.len();
    let mut out = Vec::new();

    for (i, sample) in samples.iter().enumerate() {
        debug!("computing expression rate of sample {} of {}", i + 1, n_samples);
        let density_rows = filter_eq(sample, columns::SIGNAL, biomass)?;
        let (_, density_times, density_values) = sorted_signal_frame(&density_rows)?;

        for signal_group in sample.partition_by_stable([columns::SIGNAL], true)? {
            let result = indirect_curve(config, &signal_group, &density_times, &density_values);
            if let Some(frame) = skip_or_err(result)? {
                out.push(frame);
            }
        }
    }
    concat_frames(out)
}

fn indirect_curve(
    config: &AnalysisConfig,
    group: &DataFrame,
    density_times: &[f64],
    density_values: &[f64],
) -> AnalysisResult<DataFrame> {
    let (frame, times, values) = sorted_signal_frame(group)?;

    let min_points = config.min_curve_points();
    if values.len() <= min_points || density_values.len() <= min_points {
        return Err(SignalError::TooFewPoints {
            got: values.len().min(density_values.len()),
            need: min_points + 1,
        }
        .into());
    }

    // Overlapping time domain; the signal's rows are trimmed to it.
    let tmin = times[0].max(density_times[0]);
    let tmax = times[times.len() - 1].min(density_times[density_times.len() - 1]);
    if !(tmin < tmax) {
        return Err(SignalError::EmptyDomain.into());
    }
    let keep: Vec<bool> = times.iter().map(|&t| t >= tmin && t < tmax).collect();
    let mask = BooleanChunked::from_slice("mask".into(), &keep);
    let mut trimmed = frame.filter(&mask)?;
    let (trimmed_times, trimmed_values): (Vec<f64>, Vec<f64>) = times
        .iter()
        .zip(values.iter())
        .filter(|(&t, _)| t >= tmin && t < tmax)
        .map(|(&t, &v)| (t, v))
        .unzip();

    // Reporter derivative on the trimmed grid.
    let reporter_rate = match config.pre_smoother() {
        Some(smoother) => smoother.differentiate(&trimmed_times, &trimmed_values)?,
        None => crate::signal::gradient(&trimmed_values),
    };

    // Density smoothed on its own grid, then evaluated at the trimmed times.
    let smoothed_density = match config.pre_smoother() {
        Some(smoother) => smoother.smooth(density_times, density_values)?,
        None => density_values.to_vec(),
    };
    let density = LinearInterpolator::new(density_times.to_vec(), smoothed_density)?;

    let mut ksynth: Vec<f64> = trimmed_times
        .iter()
        .zip(reporter_rate.iter())
        .map(|(&t, &rate)| rate / density.eval_clamped(t))
        .collect();
    if let Some(smoother) = config.post_smoother() {
        ksynth = smoother.smooth(&trimmed_times, &ksynth)?;
    }

    trimmed.with_column(Column::new(columns::MEASUREMENT.into(), ksynth))?;
    Ok(trimmed)
}

/// Direct expression rate: model-based inverse inference of the growth rate
/// (density signal) or one-step synthesis rate (other signals) on the
/// density signal's domain.
pub(crate) fn direct(
    config: &AnalysisConfig,
    background: &mut BackgroundCorrector,
    df: &DataFrame,
) -> AnalysisResult<DataFrame> {
    let working = prepare(config, background, df)?;
    if working.height() == 0 {
        return Ok(DataFrame::empty());
    }
    let biomass = config.biomass_signal.as_deref().unwrap_or_default();

    let samples = working.partition_by_stable([columns::SAMPLE], true)?;
    let n_samples = samples.len();
    let mut out = Vec::new();

    for (i, sample) in samples.iter().enumerate() {
        debug!("computing expression rate of sample {} of {}", i + 1, n_samples);
        let density_rows = filter_eq(sample, columns::SIGNAL, biomass)?;
        let (_, density_times, density_values) = sorted_signal_frame(&density_rows)?;
        if density_values.len() < 2 {
            debug!("sample {} has no usable density curve", i + 1);
            continue;
        }
        let density = LinearInterpolator::new(density_times.clone(), density_values.clone())?;

        // Inverse fits run on a uniform grid over the density domain.
        let (dmin, dmax) = density.domain();
        let grid = arange(dmin, dmax, DIRECT_GRID_STEP);
        if grid.len() < 2 {
            continue;
        }
        let od_grid = density.sample_onto_clamped(&grid);

        for signal_group in sample.partition_by_stable([columns::SIGNAL], true)? {
            let name = str_value_at(&signal_group, columns::SIGNAL, 0)?.unwrap_or_default();
            let result = direct_curve(config, &signal_group, name == biomass, &grid, &od_grid);
            if let Some(frame) = skip_or_err(result)? {
                out.push(frame);
            }
        }
    }

    // Final invalid-value drop over the aggregate result.
    let result = concat_frames(out)?;
    if result.height() == 0 {
        return Ok(result);
    }
    let values = float_values(&result, columns::MEASUREMENT)?;
    let keep: Vec<bool> = values.iter().map(|v| v.is_finite()).collect();
    let mask = BooleanChunked::from_slice("mask".into(), &keep);
    Ok(result.filter(&mask)?)
}

fn direct_curve(
    config: &AnalysisConfig,
    group: &DataFrame,
    is_density: bool,
    grid: &[f64],
    od_grid: &[f64],
) -> AnalysisResult<DataFrame> {
    let (mut frame, times, values) = sorted_signal_frame(group)?;
    if values.len() < 2 {
        return Err(SignalError::TooFewPoints {
            got: values.len(),
            need: 2,
        }
        .into());
    }

    let profile = if is_density {
        infer_growth_rate(od_grid, grid, config.n_gaussians, config.eps)?
    } else {
        let reporter = LinearInterpolator::new(times.clone(), values.clone())?;
        let expression_grid = reporter.sample_onto_clamped(grid);
        infer_synthesis_rate(
            &expression_grid,
            od_grid,
            grid,
            config.degr,
            config.n_gaussians,
            config.eps,
        )?
    };

    // Export the fitted profile back onto the curve's own time points; the
    // profile extrapolates flat at the grid boundary.
    let rates = profile.sample(&times);
    frame.with_column(Column::new(columns::MEASUREMENT.into(), rates))?;
    Ok(frame)
}

fn prepare(
    config: &AnalysisConfig,
    background: &mut BackgroundCorrector,
    df: &DataFrame,
) -> AnalysisResult<DataFrame> {
    if config.bg_correction {
        background.correct_frame(config, df)
    } else {
        Ok(df.clone())
    }
}
