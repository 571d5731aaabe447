//! End-to-end Sobol analysis tests
//!
//! A sample is generated with `sample_saltelli`, a closed-form model is
//! evaluated on every row, and the estimated indices are compared with the
//! analytic ones.

use crate::model::{OutputRecord, Table, Value, ValueMap};
use crate::sensitivity::{ColumnKey, ParameterRanges, SobolOptions, sample_saltelli};

/// Run `model` over a Saltelli sample and record the sweep
fn swept_record(
    ranges: &ParameterRanges,
    n: usize,
    second_order: bool,
    model: impl Fn(f64, f64) -> f64,
) -> OutputRecord {
    let sample = sample_saltelli(ranges, n, second_order, 42).unwrap();
    let rows = sample.nrows();
    let value = |row: usize, name: &str| sample.get(row, name).unwrap().as_f64().unwrap();
    let y: Vec<f64> = (0..rows).map(|r| model(value(r, "a"), value(r, "b"))).collect();
    let y_squared: Vec<f64> = y.iter().map(|v| v * v).collect();
    let reporters = Table::indexed_by("sample_id", 0..rows)
        .with_column("y", y)
        .unwrap()
        .with_column("y_squared", y_squared)
        .unwrap();

    OutputRecord::builder()
        .model_type("Linear")
        .sample_size(rows)
        .sample(sample)
        .constants(ranges.constants())
        .reporters(reporters)
        .build()
}

fn ranges() -> ParameterRanges {
    ParameterRanges::new()
        .range("a", 0.0, 1.0)
        .fixed("label", "linear")
        .range("b", 0.0, 1.0)
}

fn options() -> SobolOptions {
    SobolOptions {
        seed: Some(3),
        ..Default::default()
    }
}

#[test]
fn test_linear_model_first_order() {
    let ranges = ranges();
    // Var(2a) = 4/12, Var(b) = 1/12
    let mut record = swept_record(&ranges, 2048, false, |a, b| 2.0 * a + b);
    record
        .calc_sobol(&ranges, Some(&["y"][..]), false, &options())
        .unwrap();

    let s = record.sensitivity.as_ref().unwrap();
    assert!(!s.is_second_order());
    let s1_a = s.get("y", "a", &ColumnKey::s1()).unwrap();
    let s1_b = s.get("y", "b", &ColumnKey::s1()).unwrap();
    let st_a = s.get("y", "a", &ColumnKey::st()).unwrap();
    assert!((s1_a - 0.8).abs() < 0.1, "S1(a) = {s1_a}");
    assert!((s1_b - 0.2).abs() < 0.1, "S1(b) = {s1_b}");
    assert!((st_a - 0.8).abs() < 0.1, "ST(a) = {st_a}");

    let conf = record.sensitivity_conf.as_ref().unwrap();
    assert!(conf.rows().iter().all(|r| r.s1 >= 0.0 && r.st >= 0.0));
}

#[test]
fn test_every_reporter_is_analyzed_by_default() {
    let ranges = ranges();
    let mut record = swept_record(&ranges, 64, false, |a, b| a + b);
    record.calc_sobol(&ranges, None, false, &options()).unwrap();

    let s = record.sensitivity.as_ref().unwrap();
    let pairs: Vec<(&str, &str)> = s
        .rows()
        .iter()
        .map(|r| (r.reporter.as_str(), r.parameter.as_str()))
        .collect();
    assert_eq!(
        pairs,
        [("y", "a"), ("y", "b"), ("y_squared", "a"), ("y_squared", "b")]
    );
    assert_eq!(s.column_keys(), [ColumnKey::s1(), ColumnKey::st()]);
}

#[test]
fn test_additive_model_has_no_interactions() {
    let ranges = ranges();
    let mut record = swept_record(&ranges, 4096, true, |a, b| a + 3.0 * b);
    record
        .calc_sobol(&ranges, Some(&["y"][..]), true, &options())
        .unwrap();

    let s = record.sensitivity.as_ref().unwrap();
    assert_eq!(s.partners(), ["a", "b"]);
    let s2_ab = s.get("y", "a", &ColumnKey::s2("b")).unwrap();
    assert!(s2_ab.abs() < 0.15, "S2(a, b) = {s2_ab}");
    assert!(s.get("y", "b", &ColumnKey::s2("a")).unwrap().is_nan());
}

#[test]
fn test_wrong_layout_is_rejected() {
    let ranges = ranges();
    let mut record = swept_record(&ranges, 8, false, |a, b| a * b);
    // First-order sample analyzed as if it carried second-order blocks
    let err = record
        .calc_sobol(&ranges, Some(&["y"][..]), true, &options())
        .unwrap_err();
    assert!(err.to_string().contains("incorrect number of samples"));
    assert!(record.sensitivity.is_none());
}

#[test]
fn test_constants_are_recorded_not_analyzed() {
    let ranges = ranges();
    let record = swept_record(&ranges, 4, false, |a, _| a);
    assert_eq!(
        record.parameters.constants(),
        Some(&ValueMap::from([("label".to_string(), Value::from("linear"))]))
    );
}
