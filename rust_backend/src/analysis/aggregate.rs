//! Group-reduce aggregations over (sample, signal) groups.

use polars::prelude::*;

use crate::core::columns;
use crate::core::frame::concat_frames;
use crate::error::AnalysisResult;

/// Reduction applied to the value column of each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Mean,
    Max,
}

/// One output row per (sample, signal) group: the reduced value plus the
/// first value of every other column, which is assumed constant within a
/// group.
pub(crate) fn group_reduce(df: &DataFrame, reduction: Reduction) -> AnalysisResult<DataFrame> {
    if df.height() == 0 {
        return Ok(DataFrame::empty());
    }
    let mut rows = Vec::new();
    for group in df.partition_by_stable([columns::SAMPLE, columns::SIGNAL], true)? {
        let values = group
            .column(columns::MEASUREMENT)?
            .cast(&DataType::Float64)?;
        let values = values.f64()?;
        let reduced = match reduction {
            Reduction::Mean => values.mean(),
            Reduction::Max => values.max(),
        };
        let Some(reduced) = reduced else {
            continue;
        };
        let mut row = group.head(Some(1));
        row.with_column(Column::new(columns::MEASUREMENT.into(), [reduced]))?;
        rows.push(row);
    }
    concat_frames(rows)
}
