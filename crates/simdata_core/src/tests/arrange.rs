//! Tests for combining record sections
//!
//! These tests verify:
//! - Parameter samples merged with broadcast constants
//! - Per-type variables stacked under an `obj_type` level
//! - `arrange` joins of variables, reporters and parameters

use super::fixtures::{multi_type_record, sweep_record};
use crate::arrange::{ArrangeOptions, Selection};
use crate::model::{Cell, OutputRecord, Table, Value, ValueMap, Variables};

fn column_set(table: &Table) -> Vec<&str> {
    let mut names: Vec<&str> = table.columns().iter().map(String::as_str).collect();
    names.sort_unstable();
    names
}

#[test]
fn test_combine_parameters_broadcasts_constants() {
    let pars = sweep_record().combine_parameters(true, true).unwrap().unwrap();
    assert_eq!(pars.nrows(), 4);
    assert_eq!(column_set(&pars), ["x", "y"]);
    assert!(pars.column("y").unwrap().iter().all(|c| *c == Cell::Int(1)));
    assert_eq!(pars.index_names(), ["sample_id"]);
}

#[test]
fn test_combine_parameters_constants_only() {
    let pars = sweep_record().combine_parameters(false, true).unwrap().unwrap();
    assert_eq!(pars.columns(), ["y"]);
    assert_eq!(pars.nrows(), 4);
    assert_eq!(
        pars.level_values("sample_id").unwrap(),
        [&Cell::Int(0), &Cell::Int(1), &Cell::Int(2), &Cell::Int(3)]
    );
}

#[test]
fn test_combine_parameters_copies_sample() {
    let record = sweep_record();
    let mut pars = record.combine_parameters(true, false).unwrap().unwrap();
    pars.set_constant("x", Cell::Float(9.0));
    assert_eq!(
        record.parameters.sample().unwrap().get(0, "x"),
        Some(&Cell::Float(0.1))
    );
}

#[test]
fn test_combine_parameters_keeps_constant_order() {
    let constants = ValueMap::from([
        ("zeta".to_string(), Value::Int(1)),
        ("alpha".to_string(), Value::Int(2)),
        ("mid".to_string(), Value::Int(3)),
    ]);
    let record = OutputRecord::builder()
        .sample_size(2)
        .constants(constants)
        .build();
    let pars = record.combine_parameters(false, true).unwrap().unwrap();
    assert_eq!(pars.columns(), ["zeta", "alpha", "mid"]);

    let record = OutputRecord::builder()
        .fixed_parameters(ValueMap::from([
            ("b".to_string(), Value::Int(1)),
            ("a".to_string(), Value::Int(2)),
        ]))
        .build();
    let pars = record.combine_parameters(false, true).unwrap().unwrap();
    assert_eq!(pars.columns(), ["b", "a"]);
}

#[test]
fn test_combine_variables_keeps_recorded_type_order() {
    let model = Table::indexed_by("t", [0i64]).with_column("gini", [0.5]).unwrap();
    let agents = Table::from_parts(
        vec!["obj_id".into(), "t".into()],
        vec![vec![Cell::Int(1), Cell::Int(0)]],
        vec![("wealth".into(), vec![Cell::Int(3)])],
    )
    .unwrap();
    let record = OutputRecord::builder()
        .model_type("Model")
        .variables("Model", model)
        .variables("Agent", agents)
        .build();

    let combined = record
        .combine_variables(&Selection::All, &Selection::All)
        .unwrap()
        .unwrap();
    assert_eq!(combined.get(0, "gini"), Some(&Cell::Float(0.5)));
    assert_eq!(combined.key(0)[0], Cell::from("Model"));
    assert_eq!(combined.key(1)[0], Cell::from("Agent"));
    assert_eq!(combined.columns(), ["gini", "wealth"]);
}

#[test]
fn test_combine_parameters_empty() {
    assert!(OutputRecord::new().combine_parameters(true, true).unwrap().is_none());
}

#[test]
fn test_arrange_reporters_with_varying_parameters() {
    let table = sweep_record().arrange_reporters().unwrap().unwrap();
    assert_eq!(table.nrows(), 4);
    assert_eq!(table.columns(), ["sample_id", "out", "x"]);
    assert_eq!(table.get(2, "x"), Some(&Cell::Float(0.3)));
    assert_eq!(table.get(2, "out"), Some(&Cell::Float(3.0)));
}

#[test]
fn test_arrange_reporters_with_named_parameters() {
    let options = ArrangeOptions::new().reporters(true).parameters(vec!["x", "y"]);
    let table = sweep_record().arrange(&options).unwrap().unwrap();
    assert_eq!(table.nrows(), 4);
    assert_eq!(column_set(&table), ["out", "sample_id", "x", "y"]);
    assert!(table.column("y").unwrap().iter().all(|c| *c == Cell::Int(1)));
}

#[test]
fn test_arrange_nothing_selected() {
    assert!(sweep_record().arrange(&ArrangeOptions::new()).unwrap().is_none());
    // Selected but absent
    let options = ArrangeOptions::new().variables(true);
    assert!(sweep_record().arrange(&options).unwrap().is_none());
}

#[test]
fn test_arrange_keeps_index_on_request() {
    let options = ArrangeOptions::new()
        .reporters("out")
        .parameters(true)
        .keep_index(true);
    let table = sweep_record().arrange(&options).unwrap().unwrap();
    assert_eq!(table.index_names(), ["sample_id"]);
    assert_eq!(table.columns(), ["out", "x"]);
}

#[test]
fn test_combine_variables_single_child_is_identity() {
    let agents = Table::indexed_by("t", [0i64, 1]).with_column("a", [1i64, 2]).unwrap();
    let record = OutputRecord::builder()
        .model_type("M")
        .variables("Agent", agents.clone())
        .build();
    let combined = record
        .combine_variables(&Selection::All, &Selection::All)
        .unwrap()
        .unwrap();
    assert_eq!(combined, agents);
}

#[test]
fn test_arrange_variables_joins_sample_parameters() {
    let table = multi_type_record().arrange_variables().unwrap().unwrap();
    assert_eq!(
        table.columns(),
        [
            "obj_type",
            "sample_id",
            "obj_id",
            "t",
            "infected",
            "health",
            "infection_chance"
        ]
    );
    assert_eq!(table.nrows(), 4 + 8);
    assert_eq!(table.get(0, "obj_type"), Some(&Cell::from("VirusModel")));

    // Model rows get obj_id 0 and the parameters of their sample
    let model_rows: Vec<usize> = (0..table.nrows())
        .filter(|&r| table.get(r, "obj_type") == Some(&Cell::from("VirusModel")))
        .collect();
    assert_eq!(model_rows.len(), 4);
    for row in model_rows {
        assert_eq!(table.get(row, "obj_id"), Some(&Cell::Int(0)));
        let expected = match table.get(row, "sample_id") {
            Some(Cell::Int(0)) => 0.2,
            _ => 0.4,
        };
        assert_eq!(table.get(row, "infection_chance"), Some(&Cell::Float(expected)));
    }
}

#[test]
fn test_arrange_filters_object_types() {
    let options = ArrangeOptions::new().variables(true).obj_types("Person");
    let table = multi_type_record().arrange(&options).unwrap().unwrap();
    assert_eq!(table.nrows(), 8);
    assert_eq!(table.columns(), ["obj_type", "sample_id", "obj_id", "t", "health"]);
}

#[test]
fn test_arrange_stacks_variables_and_reporters() {
    let variables = Table::from_parts(
        vec!["sample_id".into(), "t".into()],
        vec![
            vec![Cell::Int(0), Cell::Int(0)],
            vec![Cell::Int(0), Cell::Int(1)],
        ],
        vec![("infected".into(), vec![Cell::Int(1), Cell::Int(3)])],
    )
    .unwrap();
    let reporters = Table::indexed_by("sample_id", [0i64])
        .with_column("peak", [3i64])
        .unwrap();
    let mut record = OutputRecord::builder()
        .model_type("VirusModel")
        .fixed_parameters(ValueMap::from([("steps".to_string(), Value::Int(2))]))
        .reporters(reporters)
        .build();
    record.variables = Variables::Single(variables);

    let options = ArrangeOptions::new()
        .variables(true)
        .reporters(true)
        .parameters("steps");
    let table = record.arrange(&options).unwrap().unwrap();
    assert_eq!(table.columns(), ["sample_id", "t", "peak", "infected", "steps"]);
    assert_eq!(table.nrows(), 3);
    // Reporter row has no time step
    assert_eq!(table.get(0, "t"), Some(&Cell::Null));
    assert!(table.column("steps").unwrap().iter().all(|c| *c == Cell::Int(2)));
}
