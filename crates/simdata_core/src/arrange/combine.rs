use super::{ArrangeOptions, Selection};
use crate::error::RecordError;
use crate::model::{Cell, IndexLevel, OBJ_TYPE, OutputRecord, Parameters, Table, ValueMap, Variables};

/// Broadcast `values` as constant columns over `n` rows indexed by `sample_id`
fn broadcast(values: &ValueMap, n: usize) -> Table {
    let mut table = Table::indexed_by(IndexLevel::SampleId.name(), 0..n);
    for (key, value) in values {
        table.set_constant(key, Cell::from(value));
    }
    table
}

impl OutputRecord {
    /// Combine the `variables` section into one table.
    ///
    /// A single table, or a single per-type table, is returned as is.
    /// Otherwise per-type tables are filtered by `var_keys` (a table survives
    /// if it holds at least one requested column) and `obj_types`, then
    /// stacked in recorded order under a new outermost `obj_type` level. The
    /// table of the model type gets `obj_id = 0` inserted before its last
    /// index level so all parts share one index shape.
    pub fn combine_variables(
        &self,
        obj_types: &Selection,
        var_keys: &Selection,
    ) -> Result<Option<Table>, RecordError> {
        let tables = match &self.variables {
            Variables::Empty => return Ok(None),
            Variables::Single(table) => return Ok(Some(table.clone())),
            Variables::PerType(tables) if tables.len() == 1 => {
                return Ok(tables.values().next().cloned());
            }
            Variables::PerType(tables) => tables,
        };

        let selected: Vec<(&String, &Table)> = tables
            .iter()
            .filter(|(_, table)| match var_keys {
                Selection::All => true,
                _ => table.columns().iter().any(|c| var_keys.contains(c)),
            })
            .filter(|(obj_type, _)| obj_types.contains(obj_type))
            .collect();
        if selected.is_empty() {
            return Ok(None);
        }

        let model_type = self.model_type();
        let parts = selected
            .into_iter()
            .map(|(obj_type, table)| {
                let mut table = table.clone();
                if model_type == Some(obj_type.as_str()) {
                    let position = table.index_names().len().saturating_sub(1);
                    table.insert_index_level(position, IndexLevel::ObjId.name(), Cell::Int(0));
                }
                (Cell::Str(obj_type.clone()), table)
            })
            .collect();
        let combined = Table::concat_keyed(OBJ_TYPE, parts);

        match var_keys {
            Selection::Keys(keys) => Ok(Some(combined.select(keys)?)),
            _ => Ok(Some(combined)),
        }
    }

    /// Combine the `parameters` section into one table indexed by `sample_id`.
    ///
    /// With a sweep, the sample table is copied and constants are broadcast
    /// as extra columns. Constants alone are broadcast over
    /// `log.sample_size` rows (one row if absent), as are the fixed
    /// parameters of a single run. Returns `None` when nothing is selected.
    pub fn combine_parameters(
        &self,
        sample: bool,
        constants: bool,
    ) -> Result<Option<Table>, RecordError> {
        let n = self.sample_size().unwrap_or(1);
        let table = match &self.parameters {
            Parameters::Empty => None,
            Parameters::Sampled {
                constants: fixed,
                sample: Some(table),
            } if sample => {
                let mut table = table.clone();
                if let (true, Some(fixed)) = (constants, fixed) {
                    for (key, value) in fixed {
                        table.set_constant(key, Cell::from(value));
                    }
                }
                Some(table)
            }
            Parameters::Sampled {
                constants: Some(fixed),
                ..
            } if constants => Some(broadcast(fixed, n)),
            Parameters::Sampled { .. } => None,
            Parameters::Fixed(fixed) if constants => Some(broadcast(fixed, n)),
            Parameters::Fixed(_) => None,
        };
        Ok(table.filter(|t| t.ncols() > 0))
    }

    /// Combine and filter record sections into one table.
    ///
    /// Variables and reporters are stacked row-wise, aligned on the
    /// variables' index levels. Parameters are then joined through
    /// `sample_id` when there are several rows of them, or set as constant
    /// columns for a single run. The index is flattened into leading columns
    /// unless `options.index` is set.
    pub fn arrange(&self, options: &ArrangeOptions) -> Result<Option<Table>, RecordError> {
        let variables = if options.variables.is_none() {
            None
        } else {
            self.combine_variables(&options.obj_types, &options.variables)?
        };

        let reporters = match (&options.reporters, &self.reporters) {
            (Selection::None, _) | (_, None) => None,
            (Selection::All, Some(table)) => Some(table.clone()),
            (Selection::Keys(keys), Some(table)) => Some(table.select(keys)?),
        };

        let parameters = match &options.parameters {
            Selection::None => None,
            Selection::All => self.combine_parameters(true, false)?,
            Selection::Keys(keys) => self
                .combine_parameters(true, true)?
                .map(|t| t.select(keys))
                .transpose()?,
        };

        let mut combined = match (variables, reporters) {
            (Some(v), Some(m)) => {
                let index_names = v.index_names().to_vec();
                let stacked = Table::concat_rows(&[m.reset_index()?, v.reset_index()?]);
                Some(stacked.set_index(&index_names)?)
            }
            (v, m) => v.or(m),
        };

        if let Some(parameters) = parameters {
            combined = Some(match combined {
                None => parameters,
                Some(table) if parameters.nrows() > 1 => {
                    table.join_on_level(&parameters, IndexLevel::SampleId.name())?
                }
                Some(mut table) => {
                    for name in parameters.columns() {
                        let value = parameters.get(0, name).cloned().unwrap_or_default();
                        table.set_constant(name, value);
                    }
                    table
                }
            });
        }

        let Some(table) = combined else {
            tracing::debug!("Nothing to arrange");
            return Ok(None);
        };
        if options.index {
            Ok(Some(table))
        } else {
            Ok(Some(table.reset_index()?))
        }
    }

    /// Reporters joined with the varying parameters
    pub fn arrange_reporters(&self) -> Result<Option<Table>, RecordError> {
        self.arrange(&ArrangeOptions::new().reporters(true).parameters(true))
    }

    /// Variables joined with the varying parameters
    pub fn arrange_variables(&self) -> Result<Option<Table>, RecordError> {
        self.arrange(&ArrangeOptions::new().variables(true).parameters(true))
    }
}
