//! Per-sample orchestration of an analysis.
//!
//! Partitions the measurement table by sample, runs the engine once per
//! partition and reports fractional progress after each one. The calling
//! layer invokes this from its own scheduler and owns result delivery;
//! cancellation is only practical between groups, since no single fit is
//! interruptible once started.

use log::info;
use polars::prelude::DataFrame;

use crate::analysis::AnalysisEngine;
use crate::core::columns;
use crate::core::config::AnalysisConfig;
use crate::core::frame::concat_frames;
use crate::error::AnalysisResult;
use crate::services::progress::ProgressSink;

/// Applies the configured analysis to each sample partition sequentially,
/// concatenating the per-group outputs.
pub struct GroupingOrchestrator {
    engine: AnalysisEngine,
}

impl GroupingOrchestrator {
    pub fn new(config: AnalysisConfig) -> AnalysisResult<Self> {
        Ok(Self {
            engine: AnalysisEngine::new(config)?,
        })
    }

    /// Run the analysis over the full table, reporting progress in `[0, 1]`
    /// after each sample group.
    ///
    /// An empty input (or a run where every group is skipped) yields an
    /// empty table, not an error.
    pub fn run(&mut self, df: &DataFrame, sink: &dyn ProgressSink) -> AnalysisResult<DataFrame> {
        if df.height() == 0 {
            sink.progress(1.0);
            return Ok(DataFrame::empty());
        }

        if self.engine.config().bg_correction {
            // Controls live in their own partitions; remember them before
            // splitting so every group can be corrected.
            self.engine.seed_background(df)?;
        }

        let partitions = df.partition_by_stable([columns::SAMPLE], true)?;
        let n_groups = partitions.len();
        info!("running {:?} over {n_groups} sample groups", self.engine.config().kind);

        let mut results = Vec::with_capacity(n_groups);
        for (i, partition) in partitions.into_iter().enumerate() {
            let out = self.engine.run(&partition)?;
            if out.height() > 0 {
                results.push(out);
            }
            sink.progress((i + 1) as f64 / n_groups as f64);
        }
        concat_frames(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::progress::ProgressLog;
    use polars::prelude::*;
    use serde_json::json;

    fn three_sample_frame() -> DataFrame {
        let mut sample = Vec::new();
        let mut signal = Vec::new();
        let mut time = Vec::new();
        let mut value = Vec::new();
        for s in ["s1", "s2", "s3"] {
            for i in 0..5 {
                sample.push(s);
                signal.push("GFP");
                time.push(i as f64);
                value.push(10.0 * i as f64);
            }
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
    fn test_progress_fractions_after_each_group() {
        let config = AnalysisConfig::from_value(&json!({"type": "Mean Expression"})).unwrap();
        let mut orchestrator = GroupingOrchestrator::new(config).unwrap();
        let log = ProgressLog::new();
        let out = orchestrator.run(&three_sample_frame(), &log).unwrap();

        assert_eq!(out.height(), 3);
        let fractions: Vec<f64> = log.entries().iter().map(|e| e.fraction).collect();
        assert_eq!(fractions.len(), 3);
        assert!((fractions[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((fractions[1] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(fractions[2], 1.0);
    }

    #[test]
    fn test_empty_input_completes_immediately() {
        let config = AnalysisConfig::from_value(&json!({"type": "Velocity"})).unwrap();
        let mut orchestrator = GroupingOrchestrator::new(config).unwrap();
        let log = ProgressLog::new();
        let out = orchestrator.run(&DataFrame::empty(), &log).unwrap();
        assert_eq!(out.height(), 0);
        assert_eq!(log.fraction(), 1.0);
    }
}
