//! Ratiometric alpha and rho.
//!
//! Alpha is the slope of reporter fluorescence against density over the
//! exponential-phase window derived from a Gompertz fit of the growth
//! curve; rho normalizes alpha by the alpha of a reference signal.

use log::debug;
use polars::prelude::*;

use crate::analysis::skip_or_err;
use crate::core::columns;
use crate::core::config::AnalysisConfig;
use crate::core::frame::{
    concat_frames, curve_of, filter_eq, float_values, sorted_signal_frame, str_value_at,
};
use crate::core::Curve;
use crate::error::AnalysisResult;
use crate::fitting::models::fit_gompertz;
use crate::fitting::regression::linear_fit;
use crate::fitting::FitError;
use crate::signal::grid::linspace;

/// Exponential-phase slope of each signal against density, one row per
/// (sample, signal).
pub(crate) fn alpha(config: &AnalysisConfig, df: &DataFrame) -> AnalysisResult<DataFrame> {
    let samples = df.partition_by_stable([columns::SAMPLE], true)?;
    let mut out = Vec::new();

    for sample in &samples {
        // A failed Gompertz fit skips this sample and continues with the
        // rest, consistent with the skip policy of every other entry.
        if let Some(rows) = skip_or_err(alpha_for_sample(config, sample))? {
            out.extend(rows);
        }
    }
    concat_frames(out)
}

fn alpha_for_sample(
    config: &AnalysisConfig,
    sample: &DataFrame,
) -> AnalysisResult<Vec<DataFrame>> {
    let biomass = config.biomass_signal.as_deref().unwrap_or_default();
    let density_rows = filter_eq(sample, columns::SIGNAL, biomass)?;
    let density = curve_of(&density_rows)?.positive();
    if density.len() < 4 {
        return Err(FitError::TooFewPoints {
            got: density.len(),
            need: 4,
        }
        .into());
    }

    let bounds = config.bounds.unwrap_or_default();
    let fit = fit_gompertz(density.times(), density.values(), &bounds)?;
    debug!(
        "gompertz fit: y0 {:.4}, ymax {:.4}, um {:.4}, lag {:.4}",
        fit.y0, fit.ymax, fit.um, fit.lag
    );

    // Exponential-phase window: peak growth extended by ndt doubling times.
    let t1 = fit.peak_growth_time();
    let t2 = t1 + config.ndt * fit.doubling_time();
    let density_window = density.window(t1, t2);

    let mut rows = Vec::new();
    for signal_group in sample.partition_by_stable([columns::SIGNAL], true)? {
        let (frame, times, values) = sorted_signal_frame(&signal_group)?;
        let signal_window = Curve::new(&times, &values).window(t1, t2);

        let alpha = regress_window(&signal_window, &density_window);
        let mut row = frame.head(Some(1));
        row.with_column(Column::new(
            columns::MEASUREMENT.into(),
            [alpha.unwrap_or(f64::NAN)],
        ))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Slope of signal against density over their common window, both
/// registered onto a shared 100-point grid.
fn regress_window(signal: &Curve, density: &Curve) -> Option<f64> {
    if signal.len() < 2 || density.len() < 2 {
        return None;
    }
    let (tmin, tmax) = signal.overlap(density)?;
    let grid = linspace(tmin, tmax, 100);
    let signal_values = signal.interpolator().ok()?.sample_onto_clamped(&grid);
    let density_values = density.interpolator().ok()?.sample_onto_clamped(&grid);
    linear_fit(&density_values, &signal_values).map(|(slope, _)| slope)
}

/// Alpha normalized by the reference signal's alpha, per sample.
pub(crate) fn rho(config: &AnalysisConfig, df: &DataFrame) -> AnalysisResult<DataFrame> {
    let reference = config.ref_signal.as_deref().unwrap_or_default();
    let alphas = alpha(config, df)?;
    if alphas.height() == 0 {
        return Ok(DataFrame::empty());
    }

    let mut out = Vec::new();
    for sample in alphas.partition_by_stable([columns::SAMPLE], true)? {
        let ref_rows = filter_eq(&sample, columns::SIGNAL, reference)?;
        let ref_alpha = if ref_rows.height() > 0 {
            float_values(&ref_rows, columns::MEASUREMENT)?[0]
        } else {
            debug!(
                "sample {:?} has no alpha for reference signal {reference}",
                str_value_at(&sample, columns::SAMPLE, 0)?
            );
            f64::NAN
        };

        let values = float_values(&sample, columns::MEASUREMENT)?;
        let normalized: Vec<f64> = values.iter().map(|v| v / ref_alpha).collect();
        let mut sample = sample;
        sample.with_column(Column::new(columns::MEASUREMENT.into(), normalized))?;
        out.push(sample);
    }
    concat_frames(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::models::gompertz;
    use serde_json::json;

    /// One sample: Gompertz OD plus a fluorescence channel proportional to
    /// density during growth.
    fn sample_frame(factor: f64) -> DataFrame {
        let times: Vec<f64> = (0..60).map(|i| i as f64 * 0.25).collect();
        let od: Vec<f64> = times
            .iter()
            .map(|&t| gompertz(t, 0.05, 1.0, 0.6, 2.0))
            .collect();
        let fluo: Vec<f64> = od.iter().map(|&d| factor * d).collect();

        let mut sample = Vec::new();
        let mut signal = Vec::new();
        let mut time = Vec::new();
        let mut value = Vec::new();
        for (i, &t) in times.iter().enumerate() {
            sample.push("s1");
            signal.push("OD");
            time.push(t);
            value.push(od[i]);
            sample.push("s1");
            signal.push("GFP");
            time.push(t);
            value.push(fluo[i]);
        }
        DataFrame::new(vec![
            Column::new(columns::SAMPLE.into(), sample),
            Column::new(columns::SIGNAL.into(), signal),
            Column::new(columns::TIME.into(), time),
            Column::new(columns::MEASUREMENT.into(), value),
        ])
        .unwrap()
    }

    #[test]
    fn test_alpha_recovers_proportionality() {
        let df = sample_frame(500.0);
        let config = AnalysisConfig::from_value(&json!({
            "type": "Alpha",
            "biomass_signal": "OD",
        }))
        .unwrap();
        let out = alpha(&config, &df).unwrap();
        // One row per (sample, signal): OD and GFP.
        assert_eq!(out.height(), 2);
        let gfp = filter_eq(&out, columns::SIGNAL, "GFP").unwrap();
        let a = float_values(&gfp, columns::MEASUREMENT).unwrap()[0];
        assert!((a - 500.0).abs() / 500.0 < 0.05, "alpha = {a}");
    }

    #[test]
    fn test_rho_normalizes_by_reference() {
        let df = sample_frame(500.0);
        let config = AnalysisConfig::from_value(&json!({
            "type": "Rho",
            "biomass_signal": "OD",
            "ref_signal": "GFP",
        }))
        .unwrap();
        let out = rho(&config, &df).unwrap();
        let gfp = filter_eq(&out, columns::SIGNAL, "GFP").unwrap();
        let r = float_values(&gfp, columns::MEASUREMENT).unwrap()[0];
        // The reference normalized by itself is exactly one.
        assert!((r - 1.0).abs() < 1e-9, "rho = {r}");
    }

    #[test]
    fn test_alpha_skips_samples_without_density() {
        let df = sample_frame(500.0);
        let gfp_only = filter_eq(&df, columns::SIGNAL, "GFP").unwrap();
        let config = AnalysisConfig::from_value(&json!({
            "type": "Alpha",
            "biomass_signal": "OD",
        }))
        .unwrap();
        let out = alpha(&config, &gfp_only).unwrap();
        assert_eq!(out.height(), 0);
    }
}
