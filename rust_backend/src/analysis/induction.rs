//! Induction-curve and kymograph entries.
//!
//! Both filter the table to the configured inducer chemical; rows without
//! any chemical count as zero concentration and are kept. The 2-D
//! time-by-concentration binning of the kymograph belongs to the plotting
//! collaborator, so that entry returns the filtered table as-is.

use polars::prelude::*;

use crate::analysis::aggregate::{self, Reduction};
use crate::core::columns;
use crate::core::config::AnalysisConfig;
use crate::error::AnalysisResult;

/// Mean expression per (sample, signal) over the configured chemical; the
/// plotting layer reads the concentration column as the dose axis.
pub(crate) fn induction_curve(
    config: &AnalysisConfig,
    df: &DataFrame,
) -> AnalysisResult<DataFrame> {
    let filtered = filter_chemical(config, df)?;
    if filtered.height() == 0 {
        return Ok(DataFrame::empty());
    }
    aggregate::group_reduce(&filtered, Reduction::Mean)
}

/// Rows of the configured chemical, unreduced.
pub(crate) fn kymograph(config: &AnalysisConfig, df: &DataFrame) -> AnalysisResult<DataFrame> {
    filter_chemical(config, df)
}

fn filter_chemical(config: &AnalysisConfig, df: &DataFrame) -> AnalysisResult<DataFrame> {
    let chemical = config.chemical.as_deref().unwrap_or_default();
    let col = df
        .column(columns::CHEMICAL)
        .map_err(|_| crate::error::AnalysisError::MissingColumn(columns::CHEMICAL.to_string()))?;
    let casted = col.cast(&DataType::String)?;
    let ca = casted.str()?;
    let mask: Vec<bool> = ca
        .into_iter()
        .map(|v| match v {
            Some(name) => name == chemical,
            // Uninduced samples: no chemical, concentration zero.
            None => true,
        })
        .collect();
    let mask = BooleanChunked::from_slice("mask".into(), &mask);
    Ok(df.filter(&mask)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::float_values;
    use serde_json::json;

    fn induced_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new(columns::SAMPLE.into(), ["s1", "s1", "s2", "s2", "s3", "s3"]),
            Column::new(columns::SIGNAL.into(), ["GFP", "GFP", "GFP", "GFP", "GFP", "GFP"]),
            Column::new(columns::TIME.into(), [0.0, 1.0, 0.0, 1.0, 0.0, 1.0]),
            Column::new(
                columns::MEASUREMENT.into(),
                [10.0, 20.0, 100.0, 200.0, 7.0, 9.0],
            ),
            Column::new(
                columns::CHEMICAL.into(),
                [
                    Some("IPTG"),
                    Some("IPTG"),
                    Some("IPTG"),
                    Some("IPTG"),
                    Some("aTc"),
                    Some("aTc"),
                ],
            ),
            Column::new(
                columns::CONCENTRATION.into(),
                [0.1, 0.1, 10.0, 10.0, 1.0, 1.0],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_induction_curve_means_per_sample() {
        let config = AnalysisConfig::from_value(&json!({
            "type": "Induction Curve",
            "chemical": "IPTG",
        }))
        .unwrap();
        let out = induction_curve(&config, &induced_frame()).unwrap();
        // s3 carries a different chemical and is excluded.
        assert_eq!(out.height(), 2);
        let values = float_values(&out, columns::MEASUREMENT).unwrap();
        assert_eq!(values, vec![15.0, 150.0]);
    }

    #[test]
    fn test_kymograph_returns_filtered_rows() {
        let config = AnalysisConfig::from_value(&json!({
            "type": "Kymograph",
            "chemical": "aTc",
        }))
        .unwrap();
        let out = kymograph(&config, &induced_frame()).unwrap();
        assert_eq!(out.height(), 2);
        let values = float_values(&out, columns::MEASUREMENT).unwrap();
        assert_eq!(values, vec![7.0, 9.0]);
    }
}
