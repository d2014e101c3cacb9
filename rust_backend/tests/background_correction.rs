//! Background-correction behavior over the public API.

use flapjack_rust::background::BackgroundCorrector;
use flapjack_rust::core::columns;
use flapjack_rust::core::frame::float_values;
use flapjack_rust::AnalysisConfig;
use polars::prelude::*;
use serde_json::json;

fn correction_config() -> AnalysisConfig {
    AnalysisConfig::from_value(&json!({
        "type": "Expression Rate (indirect)",
        "biomass_signal": "OD",
        "bg_correction": true,
    }))
    .unwrap()
}

/// One experimental sample plus media and strain controls whose values are
/// identically zero, so correction subtracts nothing and only the threshold
/// logic acts.
fn table_with_zero_controls(experimental: &[f64]) -> DataFrame {
    let n = experimental.len();
    let mut sample = Vec::new();
    let mut signal = Vec::new();
    let mut time = Vec::new();
    let mut value = Vec::new();
    let mut assay = Vec::new();
    let mut media = Vec::new();
    let mut strain = Vec::new();
    let mut vector = Vec::new();

    for (who, strain_name, vector_name, values) in [
        ("exp1", "st1", "pReporter", experimental.to_vec()),
        ("ctl_media", "none", "none", vec![0.0; n]),
        ("ctl_strain", "st1", "none", vec![0.0; n]),
    ] {
        for (i, &v) in values.iter().enumerate() {
            sample.push(who);
            signal.push("GFP");
            time.push(i as f64);
            value.push(v);
            assay.push("a1");
            media.push("M9");
            strain.push(strain_name);
            vector.push(vector_name);
        }
    }

    DataFrame::new(vec![
        Column::new(columns::SAMPLE.into(), sample),
        Column::new(columns::SIGNAL.into(), signal),
        Column::new(columns::TIME.into(), time),
        Column::new(columns::MEASUREMENT.into(), value),
        Column::new(columns::ASSAY.into(), assay),
        Column::new(columns::MEDIA.into(), media),
        Column::new(columns::STRAIN.into(), strain),
        Column::new(columns::VECTOR.into(), vector),
    ])
    .unwrap()
}

#[test]
fn test_trailing_truncation_invariant() {
    // A dip below background at t=1 invalidates everything at or before it.
    let config = correction_config();
    let mut corrector = BackgroundCorrector::new();
    let df = table_with_zero_controls(&[5.0, -1.0, 6.0, 7.0, 8.0]);

    let corrected = corrector.correct_frame(&config, &df).unwrap();
    let times = float_values(&corrected, columns::TIME).unwrap();
    let values = float_values(&corrected, columns::MEASUREMENT).unwrap();

    assert_eq!(times, vec![2.0, 3.0, 4.0]);
    assert_eq!(values, vec![6.0, 7.0, 8.0]);

    // No retained point may precede a dropped point in time.
    let earliest_retained = times.first().copied().unwrap();
    for dropped_time in [0.0, 1.0] {
        assert!(dropped_time < earliest_retained);
    }
}

#[test]
fn test_correction_is_idempotent_with_zero_controls() {
    let config = correction_config();
    let df = table_with_zero_controls(&[5.0, -1.0, 6.0, 7.0, 8.0]);

    let mut corrector = BackgroundCorrector::new();
    let once = corrector.correct_frame(&config, &df).unwrap();

    // Feed the corrected rows through a fresh corrector seeded with the
    // same (zero) controls: nothing further changes.
    let mut corrector = BackgroundCorrector::new();
    corrector.seed(&df).unwrap();
    let twice = corrector.correct_frame(&config, &once).unwrap();

    assert_eq!(
        float_values(&once, columns::MEASUREMENT).unwrap(),
        float_values(&twice, columns::MEASUREMENT).unwrap()
    );
    assert_eq!(
        float_values(&once, columns::TIME).unwrap(),
        float_values(&twice, columns::TIME).unwrap()
    );
}

#[test]
fn test_fully_background_curve_yields_empty_output() {
    let config = correction_config();
    let mut corrector = BackgroundCorrector::new();
    let df = table_with_zero_controls(&[-1.0, -2.0, -0.5]);
    let corrected = corrector.correct_frame(&config, &df).unwrap();
    assert_eq!(corrected.height(), 0);
}

#[test]
fn test_control_mean_is_subtracted() {
    // Strain controls at a constant 10: experimental values shift down by 10.
    let n = 4;
    let mut df = table_with_zero_controls(&[15.0, 16.0, 17.0, 18.0]);
    // Rewrite the strain-control values to 10.
    let values = float_values(&df, columns::MEASUREMENT).unwrap();
    let samples: Vec<String> = df
        .column(columns::SAMPLE)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|s| s.unwrap().to_string())
        .collect();
    let patched: Vec<f64> = samples
        .iter()
        .zip(values.iter())
        .map(|(s, &v)| if s == "ctl_strain" { 10.0 } else { v })
        .collect();
    df.with_column(Column::new(columns::MEASUREMENT.into(), patched))
        .unwrap();

    let config = correction_config();
    let mut corrector = BackgroundCorrector::new();
    let corrected = corrector.correct_frame(&config, &df).unwrap();
    assert_eq!(corrected.height(), n);
    let out = float_values(&corrected, columns::MEASUREMENT).unwrap();
    assert_eq!(out, vec![5.0, 6.0, 7.0, 8.0]);
}
