//! The analysis engine.
//!
//! `AnalysisEngine` dispatches on the configured `AnalysisKind` and applies
//! the per-sample analysis to a measurement table. Groups that are too
//! short, have non-overlapping time domains or fail a nonlinear fit are
//! excluded from the output rather than raised; an empty result is the
//! valid "nothing computable" outcome.

mod aggregate;
mod expression_rate;
mod induction;
mod ratiometric;
mod velocity;

use polars::prelude::DataFrame;

use crate::background::BackgroundCorrector;
use crate::core::config::{AnalysisConfig, AnalysisKind};
use crate::error::{AnalysisError, AnalysisResult};

pub use aggregate::Reduction;

/// One analysis request's engine: the immutable configuration plus the
/// background-profile cache scoped to this instance.
///
/// Create one engine per request; sharing an engine across requests with
/// different configurations would pollute the background cache.
pub struct AnalysisEngine {
    config: AnalysisConfig,
    background: BackgroundCorrector,
}

impl AnalysisEngine {
    /// Build an engine, validating the configuration up front.
    pub fn new(config: AnalysisConfig) -> AnalysisResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            background: BackgroundCorrector::new(),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Remember control rows from the full table before it is partitioned,
    /// so per-sample groups can be corrected against them.
    pub fn seed_background(&mut self, df: &DataFrame) -> AnalysisResult<()> {
        self.background.seed(df)
    }

    /// Run the configured analysis over a measurement table.
    ///
    /// The table may hold one sample group or a whole result set; every
    /// entry loops over the samples it finds.
    pub fn run(&mut self, df: &DataFrame) -> AnalysisResult<DataFrame> {
        if df.height() == 0 {
            return Ok(DataFrame::empty());
        }
        match self.config.kind {
            AnalysisKind::Velocity => velocity::run(&self.config, df),
            AnalysisKind::MeanVelocity => {
                let velocities = velocity::run(&self.config, df)?;
                aggregate::group_reduce(&velocities, Reduction::Mean)
            }
            AnalysisKind::MaxVelocity => {
                let velocities = velocity::run(&self.config, df)?;
                aggregate::group_reduce(&velocities, Reduction::Max)
            }
            AnalysisKind::MeanExpression => aggregate::group_reduce(df, Reduction::Mean),
            AnalysisKind::MaxExpression => aggregate::group_reduce(df, Reduction::Max),
            AnalysisKind::ExpressionRateIndirect => {
                expression_rate::indirect(&self.config, &mut self.background, df)
            }
            AnalysisKind::ExpressionRateDirect => {
                expression_rate::direct(&self.config, &mut self.background, df)
            }
            AnalysisKind::InductionCurve => induction::induction_curve(&self.config, df),
            AnalysisKind::Kymograph => induction::kymograph(&self.config, df),
            AnalysisKind::RatiometricAlpha => ratiometric::alpha(&self.config, df),
            AnalysisKind::RatiometricRho => ratiometric::rho(&self.config, df),
        }
    }
}

/// Skip-or-propagate branch shared by the analysis loops.
///
/// Returns `Ok(None)` for skippable errors so callers can continue with the
/// next group, keeping the skip policy an explicit, testable branch.
pub(crate) fn skip_or_err<T>(result: AnalysisResult<T>) -> AnalysisResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_skippable() => {
            log::debug!("skipping group: {err}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::columns;
    use polars::prelude::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_returns_empty_output_for_all_kinds() {
        let kinds = [
            json!({"type": "Velocity"}),
            json!({"type": "Mean Expression"}),
            json!({"type": "Max Expression"}),
            json!({"type": "Mean Velocity"}),
            json!({"type": "Max Velocity"}),
            json!({"type": "Expression Rate (indirect)", "biomass_signal": "OD"}),
            json!({"type": "Expression Rate (direct)", "biomass_signal": "OD"}),
            json!({"type": "Induction Curve", "chemical": "IPTG"}),
            json!({"type": "Kymograph", "chemical": "IPTG"}),
            json!({"type": "Alpha", "biomass_signal": "OD"}),
            json!({"type": "Rho", "biomass_signal": "OD", "ref_signal": "CFP"}),
        ];
        let empty = DataFrame::empty();
        for params in kinds {
            let config = AnalysisConfig::from_value(&params).unwrap();
            let mut engine = AnalysisEngine::new(config).unwrap();
            let out = engine.run(&empty).unwrap();
            assert_eq!(out.height(), 0, "non-empty output for {params}");
        }
    }

    #[test]
    fn test_missing_biomass_signal_is_fatal() {
        let config = AnalysisConfig {
            kind: AnalysisKind::ExpressionRateIndirect,
            ..AnalysisConfig::from_value(&json!({"type": "Velocity"})).unwrap()
        };
        assert!(matches!(
            AnalysisEngine::new(config),
            Err(AnalysisError::MissingParameter("biomass_signal"))
        ));
    }

    #[test]
    fn test_short_curves_are_skipped_not_raised() {
        // Three points against the default 21-point window: silently empty.
        let df = DataFrame::new(vec![
            Column::new(columns::SAMPLE.into(), ["s1", "s1", "s1"]),
            Column::new(columns::SIGNAL.into(), ["GFP", "GFP", "GFP"]),
            Column::new(columns::TIME.into(), [0.0, 1.0, 2.0]),
            Column::new(columns::MEASUREMENT.into(), [1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let config = AnalysisConfig::from_value(&json!({"type": "Velocity"})).unwrap();
        let mut engine = AnalysisEngine::new(config).unwrap();
        let out = engine.run(&df).unwrap();
        assert_eq!(out.height(), 0);
    }
}
