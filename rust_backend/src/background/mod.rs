//! Background correction from control samples.
//!
//! Control samples carry vector "none": with strain "none" they measure the
//! media background, with a matching strain the strain (autofluorescence)
//! background. Profiles are computed lazily per (assay, media, strain) and
//! cached for the lifetime of one engine instance; the cache must not be
//! shared across requests with different configurations.

use std::collections::HashMap;

use log::debug;
use polars::prelude::*;

use crate::core::config::AnalysisConfig;
use crate::core::frame::{
    concat_frames, filter_eq, filter_eq_ignore_case, filter_ne_ignore_case, sorted_signal_frame,
    str_value_at,
};
use crate::core::{columns, Curve};
use crate::error::AnalysisResult;

/// Mean and standard-deviation curves of one signal's control replicates,
/// sampled on the first replicate's time grid.
#[derive(Debug, Clone)]
pub struct ControlProfile {
    times: Vec<f64>,
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl ControlProfile {
    /// Average control replicates, registering each onto the first
    /// replicate's grid by clamped linear interpolation first. Plate wells
    /// are normally sampled synchronously, so registration is usually the
    /// identity; it keeps mismatched grids from pairing unrelated times.
    fn from_replicates(replicates: &[Curve]) -> Option<Self> {
        let grid = replicates.iter().find(|r| !r.is_empty())?.times().to_vec();
        let mut registered: Vec<Vec<f64>> = Vec::new();
        for replicate in replicates {
            match replicate.len() {
                0 => continue,
                1 => registered.push(vec![replicate.values()[0]; grid.len()]),
                _ => {
                    let interp = replicate.interpolator().ok()?;
                    registered.push(interp.sample_onto_clamped(&grid));
                }
            }
        }
        if registered.is_empty() {
            return None;
        }

        let n = registered.len() as f64;
        let mut mean = vec![0.0; grid.len()];
        let mut std = vec![0.0; grid.len()];
        for values in &registered {
            for (m, v) in mean.iter_mut().zip(values.iter()) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }
        for values in &registered {
            for ((s, v), m) in std.iter_mut().zip(values.iter()).zip(mean.iter()) {
                *s += (v - m) * (v - m);
            }
        }
        for s in &mut std {
            *s = (*s / n).sqrt();
        }

        Some(Self {
            times: grid,
            mean,
            std,
        })
    }

    pub fn mean_at(&self, t: f64) -> f64 {
        interp_clamped(&self.times, &self.mean, t)
    }

    pub fn std_at(&self, t: f64) -> f64 {
        interp_clamped(&self.times, &self.std, t)
    }
}

fn interp_clamped(xs: &[f64], ys: &[f64], t: f64) -> f64 {
    let n = xs.len();
    if n == 0 {
        return 0.0;
    }
    if t <= xs[0] || n == 1 {
        return ys[0];
    }
    if t >= xs[n - 1] {
        return ys[n - 1];
    }
    let hi = xs.partition_point(|&k| k < t);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    if span == 0.0 {
        return ys[lo];
    }
    let w = (t - xs[lo]) / span;
    ys[lo] * (1.0 - w) + ys[hi] * w
}

/// Per-signal background profiles for one (assay, media, strain) key.
#[derive(Debug, Clone, Default)]
pub struct BackgroundProfile {
    /// Media background ("no cells" controls), used for the density signal.
    media: HashMap<String, ControlProfile>,
    /// Strain background ("no DNA" controls), used for reporter signals.
    strain: HashMap<String, ControlProfile>,
}

/// Computes, caches and applies background profiles.
pub struct BackgroundCorrector {
    controls: Option<DataFrame>,
    cache: HashMap<(String, String, String), BackgroundProfile>,
}

impl BackgroundCorrector {
    pub fn new() -> Self {
        Self {
            controls: None,
            cache: HashMap::new(),
        }
    }

    /// Remember the control rows (vector "none") of a measurement table.
    ///
    /// The orchestrator seeds the corrector with the full table before
    /// partitioning by sample, so per-sample groups can still be corrected
    /// against controls living in other partitions.
    pub fn seed(&mut self, df: &DataFrame) -> AnalysisResult<()> {
        let controls = filter_eq_ignore_case(df, columns::VECTOR, columns::CONTROL_NAME)?;
        debug!("seeded background corrector with {} control rows", controls.height());
        self.controls = Some(controls);
        Ok(())
    }

    pub fn is_seeded(&self) -> bool {
        self.controls.is_some()
    }

    /// Background-correct every experimental curve of a measurement table.
    ///
    /// Control rows are excluded from the output. Corrected points falling
    /// below the configured threshold are invalidated, the trailing
    /// truncation rule extends the invalidation backwards in time, and
    /// invalid points are dropped. The result may be empty.
    pub fn correct_frame(
        &mut self,
        config: &AnalysisConfig,
        df: &DataFrame,
    ) -> AnalysisResult<DataFrame> {
        if !self.is_seeded() {
            self.seed(df)?;
        }
        let experimental = filter_ne_ignore_case(df, columns::VECTOR, columns::CONTROL_NAME)?;

        let mut out = Vec::new();
        for sample in experimental.partition_by_stable([columns::SAMPLE], true)? {
            let assay = str_value_at(&sample, columns::ASSAY, 0)?.unwrap_or_default();
            let media = str_value_at(&sample, columns::MEDIA, 0)?.unwrap_or_default();
            let strain = str_value_at(&sample, columns::STRAIN, 0)?.unwrap_or_default();
            let profile = self.profile(&assay, &media, &strain)?.clone();

            for signal_group in sample.partition_by_stable([columns::SIGNAL], true)? {
                let name = str_value_at(&signal_group, columns::SIGNAL, 0)?.unwrap_or_default();
                let (frame, times, values) = sorted_signal_frame(&signal_group)?;
                if values.is_empty() {
                    continue;
                }

                let is_density = config.biomass_signal.as_deref() == Some(name.as_str());
                let control = if is_density {
                    profile.media.get(&name)
                } else {
                    profile.strain.get(&name)
                };

                let mut corrected =
                    correct_values(&times, &values, control, is_density, config);
                truncate_trailing(&mut corrected);

                let keep: Vec<bool> = corrected.iter().map(|v| v.is_finite()).collect();
                let removed = keep.iter().filter(|&&k| !k).count();
                if removed > 0 {
                    debug!("background correction removed {removed} points from signal {name}");
                }
                let mask = BooleanChunked::from_slice("mask".into(), &keep);
                let mut frame = frame.filter(&mask)?;
                let kept: Vec<f64> = corrected.into_iter().filter(|v| v.is_finite()).collect();
                if kept.is_empty() {
                    continue;
                }
                frame.with_column(Column::new(columns::MEASUREMENT.into(), kept))?;
                out.push(frame);
            }
        }
        concat_frames(out)
    }

    /// Cached background profile for one (assay, media, strain) key.
    fn profile(
        &mut self,
        assay: &str,
        media: &str,
        strain: &str,
    ) -> AnalysisResult<&BackgroundProfile> {
        let key = (assay.to_string(), media.to_string(), strain.to_string());
        if !self.cache.contains_key(&key) {
            let profile = match &self.controls {
                Some(controls) => compute_profile(controls, assay, media, strain)?,
                None => BackgroundProfile::default(),
            };
            debug!(
                "computed background for ({assay}, {media}, {strain}): {} media signals, {} strain signals",
                profile.media.len(),
                profile.strain.len()
            );
            self.cache.insert(key.clone(), profile);
        }
        Ok(&self.cache[&key])
    }
}

impl Default for BackgroundCorrector {
    fn default() -> Self {
        Self::new()
    }
}

fn compute_profile(
    controls: &DataFrame,
    assay: &str,
    media: &str,
    strain: &str,
) -> AnalysisResult<BackgroundProfile> {
    let scoped = filter_eq(controls, columns::ASSAY, assay)?;
    let scoped = filter_eq(&scoped, columns::MEDIA, media)?;

    let no_cells = filter_eq_ignore_case(&scoped, columns::STRAIN, columns::CONTROL_NAME)?;
    let no_dna = filter_eq(&scoped, columns::STRAIN, strain)?;

    Ok(BackgroundProfile {
        media: per_signal_profiles(&no_cells)?,
        strain: per_signal_profiles(&no_dna)?,
    })
}

fn per_signal_profiles(df: &DataFrame) -> AnalysisResult<HashMap<String, ControlProfile>> {
    let mut profiles = HashMap::new();
    if df.height() == 0 {
        return Ok(profiles);
    }
    for signal_group in df.partition_by_stable([columns::SIGNAL], true)? {
        let name = str_value_at(&signal_group, columns::SIGNAL, 0)?.unwrap_or_default();
        let mut replicates = Vec::new();
        for sample_group in signal_group.partition_by_stable([columns::SAMPLE], true)? {
            let (_, times, values) = sorted_signal_frame(&sample_group)?;
            replicates.push(Curve::new(&times, &values));
        }
        if let Some(profile) = ControlProfile::from_replicates(&replicates) {
            profiles.insert(name, profile);
        }
    }
    Ok(profiles)
}

/// Subtract the control mean and invalidate points indistinguishable from
/// background. Absent controls correct by zero with zero spread.
fn correct_values(
    times: &[f64],
    values: &[f64],
    control: Option<&ControlProfile>,
    is_density: bool,
    config: &AnalysisConfig,
) -> Vec<f64> {
    times
        .iter()
        .zip(values.iter())
        .map(|(&t, &v)| {
            let (mean, std) = match control {
                Some(c) => (c.mean_at(t), c.std_at(t)),
                None => (0.0, 0.0),
            };
            let corrected = v - mean;
            let mut threshold = config.bg_std_devs * std;
            if is_density {
                threshold = threshold.max(config.min_density);
            }
            if corrected < threshold {
                f64::NAN
            } else {
                corrected
            }
        })
        .collect()
}

/// Trailing-truncation rule: once a curve dips to background, every earlier
/// point is unreliable too. Everything at or before the last invalid point
/// becomes invalid.
fn truncate_trailing(values: &mut [f64]) {
    if let Some(last_invalid) = values.iter().rposition(|v| !v.is_finite()) {
        for v in &mut values[..=last_invalid] {
            *v = f64::NAN;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(biomass: &str) -> AnalysisConfig {
        AnalysisConfig::from_value(&json!({
            "type": "Expression Rate (indirect)",
            "biomass_signal": biomass,
            "bg_correction": true,
        }))
        .unwrap()
    }

    #[test]
    fn test_truncate_trailing() {
        let mut values = vec![1.0, f64::NAN, 2.0, 3.0, f64::NAN, 4.0, 5.0];
        truncate_trailing(&mut values);
        let finite: Vec<bool> = values.iter().map(|v| v.is_finite()).collect();
        assert_eq!(
            finite,
            vec![false, false, false, false, false, true, true]
        );
    }

    #[test]
    fn test_truncate_trailing_no_invalid() {
        let mut values = vec![1.0, 2.0, 3.0];
        truncate_trailing(&mut values);
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_control_profile_mean_std() {
        let a = Curve::new(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0]);
        let b = Curve::new(&[0.0, 1.0, 2.0], &[3.0, 4.0, 5.0]);
        let profile = ControlProfile::from_replicates(&[a, b]).unwrap();
        assert_eq!(profile.mean_at(1.0), 3.0);
        assert_eq!(profile.std_at(1.0), 1.0);
        // Clamped beyond the grid.
        assert_eq!(profile.mean_at(100.0), 4.0);
    }

    #[test]
    fn test_correct_values_threshold_and_floor() {
        let cfg = config("OD");
        let times = vec![0.0, 1.0];
        // No control: threshold is the min_density floor for density signals.
        let corrected = correct_values(&times, &[0.01, 0.5], None, true, &cfg);
        assert!(!corrected[0].is_finite());
        assert!((corrected[1] - 0.5).abs() < 1e-12);
        // Non-density signals with zero controls only drop negatives.
        let corrected = correct_values(&times, &[0.01, -0.5], None, false, &cfg);
        assert!(corrected[0].is_finite());
        assert!(!corrected[1].is_finite());
    }
}
