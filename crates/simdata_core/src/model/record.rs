//! The output record of a simulation run or experiment.
//!
//! Sections whose shape depends on how the data was produced (a single run,
//! multiple iterations, a parameter sweep) are tagged variants resolved when
//! the record is built, so the arrangement code never inspects types.

use indexmap::IndexMap;

use super::{Table, Value, ValueMap};
use crate::error::RecordError;
use crate::sensitivity::SensitivityTable;

/// Run metadata. Always a flat mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Log(pub ValueMap);

impl Log {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the top-level simulated entity type
    pub fn model_type(&self) -> Option<&str> {
        self.0.get("model_type").and_then(Value::as_str)
    }

    /// Number of parameter combinations in a sweep
    pub fn sample_size(&self) -> Option<usize> {
        self.0
            .get("sample_size")
            .and_then(Value::as_i64)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The `parameters` section
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Parameters {
    #[default]
    Empty,
    /// Fixed values of a single run
    Fixed(ValueMap),
    /// Values of a parameter sweep: constants shared by all runs and a table
    /// of varying values indexed by `sample_id`
    Sampled {
        constants: Option<ValueMap>,
        sample: Option<Table>,
    },
}

impl Parameters {
    /// Resolve a loosely typed entry into a parameters section.
    pub fn try_from_entry(entry: Entry) -> Result<Self, RecordError> {
        const EXPECTED: &str = "a mapping of parameter values or a group with \
                                'constants' (mapping) and 'sample' (table)";
        match entry {
            Entry::Value(Value::Map(map)) => Ok(Parameters::Fixed(map)),
            Entry::Group(children) => {
                let mut constants = None;
                let mut sample = None;
                for (key, child) in children {
                    match (key.as_str(), child) {
                        ("constants", Entry::Value(Value::Map(map))) => constants = Some(map),
                        ("sample", Entry::Table(table)) => sample = Some(table),
                        _ => {
                            return Err(RecordError::TypeMismatch {
                                key: format!("parameters.{key}"),
                                expected: EXPECTED,
                            });
                        }
                    }
                }
                Ok(Parameters::Sampled { constants, sample })
            }
            _ => Err(RecordError::TypeMismatch {
                key: "parameters".to_string(),
                expected: EXPECTED,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Parameters::Empty)
    }

    pub fn constants(&self) -> Option<&ValueMap> {
        match self {
            Parameters::Sampled { constants, .. } => constants.as_ref(),
            _ => None,
        }
    }

    pub fn sample(&self) -> Option<&Table> {
        match self {
            Parameters::Sampled { sample, .. } => sample.as_ref(),
            _ => None,
        }
    }
}

/// The `variables` section
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Variables {
    #[default]
    Empty,
    Single(Table),
    /// One table per object type
    PerType(IndexMap<String, Table>),
}

impl Variables {
    pub fn try_from_entry(entry: Entry) -> Result<Self, RecordError> {
        const EXPECTED: &str = "a table or a group of tables keyed by object type";
        match entry {
            Entry::Table(table) => Ok(Variables::Single(table)),
            Entry::Group(children) => children
                .into_iter()
                .map(|(key, child)| match child {
                    Entry::Table(table) => Ok((key, table)),
                    _ => Err(RecordError::TypeMismatch {
                        key: format!("variables.{key}"),
                        expected: EXPECTED,
                    }),
                })
                .collect::<Result<_, _>>()
                .map(Variables::PerType),
            Entry::Value(_) => Err(RecordError::TypeMismatch {
                key: "variables".to_string(),
                expected: EXPECTED,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Variables::Empty)
    }

    /// Table recorded for one object type
    pub fn get(&self, obj_type: &str) -> Option<&Table> {
        match self {
            Variables::PerType(tables) => tables.get(obj_type),
            _ => None,
        }
    }
}

/// A free-form record entry
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Table(Table),
    Value(Value),
    /// Nested entries, saved one file per child
    Group(IndexMap<String, Entry>),
}

impl From<Table> for Entry {
    fn from(t: Table) -> Self {
        Entry::Table(t)
    }
}

impl From<Value> for Entry {
    fn from(v: Value) -> Self {
        Entry::Value(v)
    }
}

/// Recorded data of a simulation.
///
/// Equality is structural: tables compare element-wise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputRecord {
    pub log: Option<Log>,
    pub parameters: Parameters,
    pub variables: Variables,
    pub reporters: Option<Table>,
    pub sensitivity: Option<SensitivityTable>,
    pub sensitivity_conf: Option<SensitivityTable>,
    /// Entries outside the standard sections, in insertion order
    pub other: IndexMap<String, Entry>,
}

impl OutputRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> OutputRecordBuilder {
        OutputRecordBuilder::default()
    }

    pub fn model_type(&self) -> Option<&str> {
        self.log.as_ref().and_then(Log::model_type)
    }

    pub fn sample_size(&self) -> Option<usize> {
        self.log.as_ref().and_then(Log::sample_size)
    }

    /// Number of populated top-level entries
    pub fn len(&self) -> usize {
        usize::from(self.log.is_some())
            + usize::from(!self.parameters.is_empty())
            + usize::from(!self.variables.is_empty())
            + usize::from(self.reporters.is_some())
            + usize::from(self.sensitivity.is_some())
            + usize::from(self.sensitivity_conf.is_some())
            + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store an entry under `key`, routing standard section names to their
    /// typed fields.
    pub fn insert(&mut self, key: &str, entry: Entry) -> Result<(), RecordError> {
        match key {
            "log" => match entry {
                Entry::Value(Value::Map(map)) => self.log = Some(Log(map)),
                _ => {
                    return Err(RecordError::TypeMismatch {
                        key: "log".to_string(),
                        expected: "a mapping",
                    });
                }
            },
            "parameters" => self.parameters = Parameters::try_from_entry(entry)?,
            "variables" => self.variables = Variables::try_from_entry(entry)?,
            "reporters" => match entry {
                Entry::Table(table) => self.reporters = Some(table),
                _ => {
                    return Err(RecordError::TypeMismatch {
                        key: "reporters".to_string(),
                        expected: "a table",
                    });
                }
            },
            "sensitivity" | "sensitivity_conf" => {
                let parsed = match &entry {
                    Entry::Table(table) => SensitivityTable::from_table(table).ok(),
                    _ => None,
                };
                match (key, parsed) {
                    ("sensitivity", Some(t)) => self.sensitivity = Some(t),
                    (_, Some(t)) => self.sensitivity_conf = Some(t),
                    (_, None) => {
                        self.other.insert(key.to_string(), entry);
                    }
                }
            }
            _ => {
                self.other.insert(key.to_string(), entry);
            }
        }
        Ok(())
    }

    /// The populated sections as loosely typed entries, the inverse of
    /// [`OutputRecord::insert`]. Sensitivity tables are flattened.
    pub fn entries(&self) -> Vec<(String, Entry)> {
        let mut entries = Vec::with_capacity(self.len());
        if let Some(log) = &self.log {
            entries.push(("log".to_string(), Entry::Value(Value::Map(log.0.clone()))));
        }
        match &self.parameters {
            Parameters::Empty => {}
            Parameters::Fixed(map) => {
                entries.push(("parameters".to_string(), Entry::Value(Value::Map(map.clone()))));
            }
            Parameters::Sampled { constants, sample } => {
                let mut group = IndexMap::new();
                if let Some(c) = constants {
                    group.insert("constants".to_string(), Entry::Value(Value::Map(c.clone())));
                }
                if let Some(s) = sample {
                    group.insert("sample".to_string(), Entry::Table(s.clone()));
                }
                entries.push(("parameters".to_string(), Entry::Group(group)));
            }
        }
        match &self.variables {
            Variables::Empty => {}
            Variables::Single(table) => {
                entries.push(("variables".to_string(), Entry::Table(table.clone())));
            }
            Variables::PerType(tables) => {
                let group = tables
                    .iter()
                    .map(|(k, t)| (k.clone(), Entry::Table(t.clone())))
                    .collect();
                entries.push(("variables".to_string(), Entry::Group(group)));
            }
        }
        if let Some(table) = &self.reporters {
            entries.push(("reporters".to_string(), Entry::Table(table.clone())));
        }
        if let Some(s) = &self.sensitivity {
            entries.push(("sensitivity".to_string(), Entry::Table(s.to_table())));
        }
        if let Some(s) = &self.sensitivity_conf {
            entries.push(("sensitivity_conf".to_string(), Entry::Table(s.to_table())));
        }
        entries.extend(self.other.iter().map(|(k, e)| (k.clone(), e.clone())));
        entries
    }

    /// Check cross-section invariants.
    pub fn validate(&self) -> Result<(), RecordError> {
        match (self.parameters.sample(), self.sample_size()) {
            (Some(sample), Some(sample_size)) if sample.nrows() != sample_size => {
                Err(RecordError::SampleSizeMismatch {
                    rows: sample.nrows(),
                    sample_size,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Fluent construction of an [`OutputRecord`]
#[derive(Debug, Default)]
pub struct OutputRecordBuilder {
    record: OutputRecord,
}

impl OutputRecordBuilder {
    pub fn model_type(mut self, model_type: &str) -> Self {
        self.log_mut().insert("model_type", model_type);
        self
    }

    pub fn sample_size(mut self, n: usize) -> Self {
        self.log_mut().insert("sample_size", n as i64);
        self
    }

    pub fn log(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.log_mut().insert(key, value);
        self
    }

    /// Fixed parameters of a single run
    pub fn fixed_parameters(mut self, parameters: ValueMap) -> Self {
        self.record.parameters = Parameters::Fixed(parameters);
        self
    }

    pub fn constants(mut self, constants: ValueMap) -> Self {
        let sample = self.record.parameters.sample().cloned();
        self.record.parameters = Parameters::Sampled {
            constants: Some(constants),
            sample,
        };
        self
    }

    pub fn sample(mut self, sample: Table) -> Self {
        let constants = self.record.parameters.constants().cloned();
        self.record.parameters = Parameters::Sampled {
            constants,
            sample: Some(sample),
        };
        self
    }

    /// Add the variable table of one object type
    pub fn variables(mut self, obj_type: &str, table: Table) -> Self {
        let mut tables = match std::mem::take(&mut self.record.variables) {
            Variables::PerType(tables) => tables,
            _ => IndexMap::new(),
        };
        tables.insert(obj_type.to_string(), table);
        self.record.variables = Variables::PerType(tables);
        self
    }

    pub fn reporters(mut self, table: Table) -> Self {
        self.record.reporters = Some(table);
        self
    }

    pub fn entry(mut self, key: &str, entry: impl Into<Entry>) -> Self {
        self.record.other.insert(key.to_string(), entry.into());
        self
    }

    pub fn build(self) -> OutputRecord {
        self.record
    }

    fn log_mut(&mut self) -> &mut Log {
        self.record.log.get_or_insert_with(Log::new)
    }
}
