//! Analysis configuration.
//!
//! `AnalysisConfig` is the immutable parameter record for one analysis
//! request. It is deserialized once from the caller's flat key-value map;
//! unknown analysis kinds are a configuration error, unknown keys are
//! logged and ignored.

use std::collections::HashSet;

use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};
use crate::signal::smoothing::SmoothingMethod;

/// The closed set of analysis kinds.
///
/// Dispatch is an exhaustive `match` over this enum, so an unsupported tag
/// can only fail at configuration time, never inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisKind {
    #[serde(rename = "Velocity")]
    Velocity,
    #[serde(rename = "Expression Rate (direct)", alias = "ExpressionRateDirect")]
    ExpressionRateDirect,
    #[serde(rename = "Expression Rate (indirect)", alias = "ExpressionRateIndirect")]
    ExpressionRateIndirect,
    #[serde(rename = "Mean Expression", alias = "MeanExpression")]
    MeanExpression,
    #[serde(rename = "Max Expression", alias = "MaxExpression")]
    MaxExpression,
    #[serde(rename = "Mean Velocity", alias = "MeanVelocity")]
    MeanVelocity,
    #[serde(rename = "Max Velocity", alias = "MaxVelocity")]
    MaxVelocity,
    #[serde(rename = "Induction Curve", alias = "InductionCurve")]
    InductionCurve,
    #[serde(rename = "Kymograph")]
    Kymograph,
    #[serde(rename = "Alpha", alias = "RatiometricAlpha")]
    RatiometricAlpha,
    #[serde(rename = "Rho", alias = "RatiometricRho")]
    RatiometricRho,
}

impl AnalysisKind {
    /// Parse a kind tag, mapping failures to `UnknownAnalysis`.
    pub fn parse(tag: &str) -> AnalysisResult<Self> {
        serde_json::from_value(serde_json::Value::String(tag.to_string()))
            .map_err(|_| AnalysisError::UnknownAnalysis(tag.to_string()))
    }
}

/// Smoothing filter family, selected once at configuration time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmoothingType {
    #[default]
    #[serde(rename = "savgol", alias = "SavitzkyGolay")]
    SavitzkyGolay,
    #[serde(rename = "lowess", alias = "LocalRegression")]
    Lowess,
}

/// Box bounds for the four Gompertz parameters `(y0, ymax, um, lag)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GompertzBounds {
    pub lower: [f64; 4],
    pub upper: [f64; 4],
}

impl Default for GompertzBounds {
    fn default() -> Self {
        // Generous plate-reader scales: OD in [1e-6, 100], growth rate up to
        // 50/h, lag up to 100h.
        Self {
            lower: [1e-6, 1e-6, 1e-6, 0.0],
            upper: [100.0, 100.0, 50.0, 100.0],
        }
    }
}

fn default_bg_std_devs() -> f64 {
    2.0
}

fn default_min_density() -> f64 {
    0.05
}

fn default_pre_smoothing() -> f64 {
    21.0
}

fn default_post_smoothing() -> f64 {
    21.0
}

fn default_eps() -> f64 {
    1e-7
}

fn default_n_gaussians() -> usize {
    20
}

fn default_ndt() -> f64 {
    2.0
}

/// Immutable parameter record for one analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Analysis kind tag.
    #[serde(rename = "type")]
    pub kind: AnalysisKind,

    /// Name of the biomass/density signal.
    #[serde(default)]
    pub biomass_signal: Option<String>,

    /// Name of the reference signal for ratiometric rho.
    #[serde(default)]
    pub ref_signal: Option<String>,

    /// Subtract control backgrounds and remove data indistinguishable from
    /// them before expression-rate analyses.
    #[serde(default)]
    pub bg_correction: bool,

    /// Correction threshold as a multiple of the control standard deviation.
    #[serde(default = "default_bg_std_devs")]
    pub bg_std_devs: f64,

    /// Minimum density floor for the biomass signal during correction.
    #[serde(default = "default_min_density")]
    pub min_density: f64,

    #[serde(default)]
    pub smoothing_type: SmoothingType,

    /// Pre-smoothing window size (Savitzky-Golay) or fraction (lowess).
    #[serde(default = "default_pre_smoothing")]
    pub pre_smoothing: f64,

    /// Post-smoothing window size (Savitzky-Golay) or fraction (lowess).
    #[serde(default = "default_post_smoothing")]
    pub post_smoothing: f64,

    /// Reporter degradation rate for direct expression-rate inference.
    #[serde(default)]
    pub degr: f64,

    /// Tikhonov regularization weight for the inverse solver.
    #[serde(default = "default_eps")]
    pub eps: f64,

    /// Number of Gaussian basis functions in the inverse solver.
    #[serde(default = "default_n_gaussians")]
    pub n_gaussians: usize,

    /// Inducer chemical selector for induction curves and kymographs.
    #[serde(default)]
    pub chemical: Option<String>,

    /// Number of doubling times extending the exponential-phase window.
    #[serde(default = "default_ndt")]
    pub ndt: f64,

    /// Gompertz fit bounds for ratiometric analyses.
    #[serde(default)]
    pub bounds: Option<GompertzBounds>,
}

static RECOGNIZED_KEYS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "type",
        "biomass_signal",
        "ref_signal",
        "bg_correction",
        "bg_std_devs",
        "min_density",
        "smoothing_type",
        "pre_smoothing",
        "post_smoothing",
        "degr",
        "eps",
        "n_gaussians",
        "chemical",
        "ndt",
        "bounds",
    ]
    .into_iter()
    .collect()
});

impl AnalysisConfig {
    /// Build a config from the caller's flat key-value map.
    ///
    /// The kind tag is checked first so an unknown analysis reports as such
    /// rather than as a generic deserialization failure. Unrecognized keys
    /// are logged and ignored.
    pub fn from_value(value: &serde_json::Value) -> AnalysisResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| AnalysisError::InvalidConfig("parameters must be an object".into()))?;

        let kind_tag = map
            .get("type")
            .ok_or(AnalysisError::MissingParameter("type"))?;
        let kind_tag = kind_tag
            .as_str()
            .ok_or_else(|| AnalysisError::InvalidConfig("type must be a string".into()))?;
        AnalysisKind::parse(kind_tag)?;

        for key in map.keys() {
            if !RECOGNIZED_KEYS.contains(key.as_str()) {
                warn!("ignoring unrecognized analysis parameter {key:?}");
            }
        }

        let config: AnalysisConfig = serde_path_to_error::deserialize(value.clone())
            .map_err(|err| AnalysisError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check kind-specific required parameters and smoothing settings.
    ///
    /// Configuration errors are fatal and surface before any computation.
    pub fn validate(&self) -> AnalysisResult<()> {
        use AnalysisKind::*;
        match self.kind {
            ExpressionRateDirect | ExpressionRateIndirect | RatiometricAlpha | RatiometricRho => {
                if self.biomass_signal.is_none() {
                    return Err(AnalysisError::MissingParameter("biomass_signal"));
                }
            }
            InductionCurve | Kymograph => {
                if self.chemical.is_none() {
                    return Err(AnalysisError::MissingParameter("chemical"));
                }
            }
            _ => {}
        }
        if self.kind == RatiometricRho && self.ref_signal.is_none() {
            return Err(AnalysisError::MissingParameter("ref_signal"));
        }

        match self.smoothing_type {
            SmoothingType::SavitzkyGolay => {
                for (name, w) in [
                    ("pre_smoothing", self.pre_smoothing),
                    ("post_smoothing", self.post_smoothing),
                ] {
                    if w > 0.0 && (w.fract() != 0.0 || (w as usize) % 2 == 0 || w < 3.0) {
                        return Err(AnalysisError::InvalidConfig(format!(
                            "{name} must be an odd window length >= 3, got {w}"
                        )));
                    }
                }
            }
            SmoothingType::Lowess => {
                for (name, f) in [
                    ("pre_smoothing", self.pre_smoothing),
                    ("post_smoothing", self.post_smoothing),
                ] {
                    if f > 0.0 && f > 1.0 {
                        return Err(AnalysisError::InvalidConfig(format!(
                            "{name} must be a fraction in (0, 1] for lowess, got {f}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Smoother for the raw series, `None` when pre-smoothing is disabled.
    pub fn pre_smoother(&self) -> Option<SmoothingMethod> {
        self.smoother(self.pre_smoothing)
    }

    /// Smoother for the derived series, `None` when post-smoothing is disabled.
    pub fn post_smoother(&self) -> Option<SmoothingMethod> {
        self.smoother(self.post_smoothing)
    }

    fn smoother(&self, param: f64) -> Option<SmoothingMethod> {
        if param <= 0.0 {
            return None;
        }
        Some(match self.smoothing_type {
            SmoothingType::SavitzkyGolay => SmoothingMethod::SavitzkyGolay {
                window: param as usize,
                polyorder: 2,
            },
            SmoothingType::Lowess => SmoothingMethod::Lowess { frac: param },
        })
    }

    /// Minimum number of points a curve needs to enter an analysis.
    ///
    /// Shorter curves are skipped silently, not reported as errors.
    pub fn min_curve_points(&self) -> usize {
        match self.smoothing_type {
            SmoothingType::SavitzkyGolay => {
                self.pre_smoothing.max(self.post_smoothing).max(0.0) as usize
            }
            SmoothingType::Lowess => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_kind_aliases() {
        assert_eq!(
            AnalysisKind::parse("Expression Rate (indirect)").unwrap(),
            AnalysisKind::ExpressionRateIndirect
        );
        assert_eq!(
            AnalysisKind::parse("ExpressionRateIndirect").unwrap(),
            AnalysisKind::ExpressionRateIndirect
        );
        assert!(matches!(
            AnalysisKind::parse("Fourier"),
            Err(AnalysisError::UnknownAnalysis(_))
        ));
    }

    #[test]
    fn test_from_value_defaults() {
        let config = AnalysisConfig::from_value(&json!({"type": "Velocity"})).unwrap();
        assert_eq!(config.kind, AnalysisKind::Velocity);
        assert_eq!(config.pre_smoothing, 21.0);
        assert_eq!(config.bg_std_devs, 2.0);
        assert_eq!(config.n_gaussians, 20);
        assert!(!config.bg_correction);
    }

    #[test]
    fn test_missing_required_parameter() {
        let err = AnalysisConfig::from_value(&json!({
            "type": "Expression Rate (indirect)"
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::MissingParameter("biomass_signal")
        ));
    }

    #[test]
    fn test_unknown_kind_is_config_error() {
        let err = AnalysisConfig::from_value(&json!({"type": "Wavelet"})).unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownAnalysis(_)));
    }

    #[test]
    fn test_even_savgol_window_rejected() {
        let err = AnalysisConfig::from_value(&json!({
            "type": "Velocity",
            "pre_smoothing": 20.0
        }))
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn test_min_curve_points() {
        let config = AnalysisConfig::from_value(&json!({
            "type": "Velocity",
            "pre_smoothing": 11.0,
            "post_smoothing": 21.0
        }))
        .unwrap();
        assert_eq!(config.min_curve_points(), 21);

        let config = AnalysisConfig::from_value(&json!({
            "type": "Velocity",
            "smoothing_type": "lowess",
            "pre_smoothing": 0.3,
            "post_smoothing": 0.3
        }))
        .unwrap();
        assert_eq!(config.min_curve_points(), 2);
    }
}
