//! Records shared by the integration tests

use crate::model::{Cell, OutputRecord, Table, Value, ValueMap};

/// A four-sample sweep over `x` with the constant `y = 1` and one reporter
pub fn sweep_record() -> OutputRecord {
    let sample = Table::indexed_by("sample_id", 0..4usize)
        .with_column("x", [0.1, 0.2, 0.3, 0.4])
        .unwrap();
    let reporters = Table::indexed_by("sample_id", 0..4usize)
        .with_column("out", [1.0, 2.0, 3.0, 4.0])
        .unwrap();
    OutputRecord::builder()
        .model_type("VirusModel")
        .sample_size(4)
        .sample(sample)
        .constants(ValueMap::from([("y".to_string(), Value::Int(1))]))
        .reporters(reporters)
        .build()
}

/// A two-sample sweep with model and agent variables over two time steps
pub fn multi_type_record() -> OutputRecord {
    let mut model_keys = Vec::new();
    let mut agent_keys = Vec::new();
    for sample_id in 0..2i64 {
        for t in 0..2i64 {
            model_keys.push(vec![Cell::Int(sample_id), Cell::Int(t)]);
            for obj_id in 1..3i64 {
                agent_keys.push(vec![Cell::Int(sample_id), Cell::Int(obj_id), Cell::Int(t)]);
            }
        }
    }
    let infected: Vec<Cell> = (0..model_keys.len()).map(|i| Cell::Int(i as i64)).collect();
    let health: Vec<Cell> = (0..agent_keys.len())
        .map(|i| Cell::Float(1.0 - i as f64 / 10.0))
        .collect();
    let model = Table::from_parts(
        vec!["sample_id".into(), "t".into()],
        model_keys,
        vec![("infected".into(), infected)],
    )
    .unwrap();
    let agents = Table::from_parts(
        vec!["sample_id".into(), "obj_id".into(), "t".into()],
        agent_keys,
        vec![("health".into(), health)],
    )
    .unwrap();
    let sample = Table::indexed_by("sample_id", 0..2usize)
        .with_column("infection_chance", [0.2, 0.4])
        .unwrap();

    OutputRecord::builder()
        .model_type("VirusModel")
        .sample_size(2)
        .log("time_stamp", "2026-10-16 12:00:00")
        .sample(sample)
        .constants(ValueMap::from([("population".to_string(), Value::Int(2))]))
        .variables("VirusModel", model)
        .variables("Person", agents)
        .build()
}
