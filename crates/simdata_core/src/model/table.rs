//! Column-major table with a named multi-level row index.
//!
//! This is the tabular form every record section is reshaped into. A table
//! with no index levels has a positional index: flattening it adds nothing.

use rustc_hash::FxHashMap;

use super::Cell;
use crate::error::TableError;

/// Hashable form of a key cell. Whole floats match the equal integer.
#[derive(Debug, PartialEq, Eq, Hash)]
enum JoinKey<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(&'a str),
}

impl<'a> From<&'a Cell> for JoinKey<'a> {
    fn from(cell: &'a Cell) -> Self {
        match cell {
            Cell::Null => JoinKey::Null,
            Cell::Bool(b) => JoinKey::Bool(*b),
            Cell::Int(i) => JoinKey::Int(*i),
            Cell::Float(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                JoinKey::Int(*f as i64)
            }
            Cell::Float(f) => JoinKey::Float(f.to_bits()),
            Cell::Str(s) => JoinKey::Str(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Names of the index levels, outermost first
    index_names: Vec<String>,
    /// One key tuple per row, `index_names.len()` wide
    keys: Vec<Vec<Cell>>,
    columns: Vec<String>,
    /// Column-major values, `data[col][row]`
    data: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given index levels and columns.
    pub fn new<S: Into<String>>(
        index_names: impl IntoIterator<Item = S>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        Self {
            index_names: index_names.into_iter().map(Into::into).collect(),
            keys: Vec::new(),
            data: vec![Vec::new(); columns.len()],
            columns,
        }
    }

    /// Create a table with a single index level and no columns yet.
    pub fn indexed_by<C: Into<Cell>>(level: &str, keys: impl IntoIterator<Item = C>) -> Self {
        Self {
            index_names: vec![level.to_string()],
            keys: keys.into_iter().map(|k| vec![k.into()]).collect(),
            columns: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Create a table with a positional index and no columns yet.
    #[must_use]
    pub fn positional(nrows: usize) -> Self {
        Self {
            keys: vec![Vec::new(); nrows],
            ..Self::default()
        }
    }

    /// Build a table from index keys and named columns, validating shapes.
    pub fn from_parts(
        index_names: Vec<String>,
        keys: Vec<Vec<Cell>>,
        columns: Vec<(String, Vec<Cell>)>,
    ) -> Result<Self, TableError> {
        if let Some(bad) = keys.iter().find(|k| k.len() != index_names.len()) {
            return Err(TableError::KeyWidth {
                expected: index_names.len(),
                actual: bad.len(),
            });
        }
        let mut table = Self {
            index_names,
            keys,
            columns: Vec::new(),
            data: Vec::new(),
        };
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Append a column (builder style).
    pub fn with_column<C: Into<Cell>>(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = C>,
    ) -> Result<Self, TableError> {
        self.push_column(name.to_string(), values.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    pub fn push_column(&mut self, name: String, values: Vec<Cell>) -> Result<(), TableError> {
        if self.has_column(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        if values.len() != self.nrows() {
            return Err(TableError::LengthMismatch {
                column: name,
                expected: self.nrows(),
                actual: values.len(),
            });
        }
        self.columns.push(name);
        self.data.push(values);
        Ok(())
    }

    pub fn push_row(&mut self, key: Vec<Cell>, values: Vec<Cell>) -> Result<(), TableError> {
        if key.len() != self.index_names.len() {
            return Err(TableError::KeyWidth {
                expected: self.index_names.len(),
                actual: key.len(),
            });
        }
        if values.len() != self.columns.len() {
            return Err(TableError::LengthMismatch {
                column: "<row>".to_string(),
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        self.keys.push(key);
        for (col, value) in self.data.iter_mut().zip(values) {
            col.push(value);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn nrows(&self) -> usize {
        self.keys.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// True if the table has neither rows nor columns
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.columns.is_empty()
    }

    pub fn index_names(&self) -> &[String] {
        &self.index_names
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn level_position(&self, name: &str) -> Option<usize> {
        self.index_names.iter().position(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Cell]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.data[i].as_slice())
    }

    pub fn key(&self, row: usize) -> &[Cell] {
        &self.keys[row]
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        self.column(column).and_then(|c| c.get(row))
    }

    /// Values of one row in column order
    pub fn row(&self, row: usize) -> impl Iterator<Item = &Cell> {
        self.data.iter().map(move |col| &col[row])
    }

    /// Values of an index level, one per row
    pub fn level_values(&self, name: &str) -> Option<Vec<&Cell>> {
        let pos = self.level_position(name)?;
        Some(self.keys.iter().map(|k| &k[pos]).collect())
    }

    // ------------------------------------------------------------------
    // Reshaping
    // ------------------------------------------------------------------

    /// Keep only the named columns, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, TableError> {
        let mut data = Vec::with_capacity(names.len());
        for name in names {
            let col = self
                .column(name.as_ref())
                .ok_or_else(|| TableError::MissingColumn(name.as_ref().to_string()))?;
            data.push(col.to_vec());
        }
        Ok(Table {
            index_names: self.index_names.clone(),
            keys: self.keys.clone(),
            columns: names.iter().map(|n| n.as_ref().to_string()).collect(),
            data,
        })
    }

    /// Set `name` to the same value on every row, replacing an existing column.
    pub fn set_constant(&mut self, name: &str, value: Cell) {
        let values = vec![value; self.nrows()];
        match self.columns.iter().position(|c| c == name) {
            Some(i) => self.data[i] = values,
            None => {
                self.columns.push(name.to_string());
                self.data.push(values);
            }
        }
    }

    /// Insert a new index level at `position` holding `value` on every row.
    pub fn insert_index_level(&mut self, position: usize, name: &str, value: Cell) {
        let position = position.min(self.index_names.len());
        self.index_names.insert(position, name.to_string());
        for key in &mut self.keys {
            key.insert(position, value.clone());
        }
    }

    /// Move all index levels into leading columns, leaving a positional index.
    pub fn reset_index(&self) -> Result<Table, TableError> {
        if let Some(dup) = self.index_names.iter().find(|n| self.has_column(n)) {
            return Err(TableError::DuplicateColumn(dup.clone()));
        }
        let mut columns = self.index_names.clone();
        columns.extend(self.columns.iter().cloned());
        let mut data: Vec<Vec<Cell>> = (0..self.index_names.len())
            .map(|level| self.keys.iter().map(|k| k[level].clone()).collect())
            .collect();
        data.extend(self.data.iter().cloned());
        Ok(Table {
            index_names: Vec::new(),
            keys: vec![Vec::new(); self.nrows()],
            columns,
            data,
        })
    }

    /// Use the named columns as the index. Existing index levels are dropped.
    pub fn set_index<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, TableError> {
        let mut positions = Vec::with_capacity(names.len());
        for name in names {
            let pos = self
                .columns
                .iter()
                .position(|c| c == name.as_ref())
                .ok_or_else(|| TableError::MissingColumn(name.as_ref().to_string()))?;
            positions.push(pos);
        }
        let keys = (0..self.nrows())
            .map(|row| positions.iter().map(|&p| self.data[p][row].clone()).collect())
            .collect();
        let (columns, data): (Vec<String>, Vec<Vec<Cell>>) = self
            .columns
            .iter()
            .zip(&self.data)
            .enumerate()
            .filter(|(i, _)| !positions.contains(i))
            .map(|(_, (c, d))| (c.clone(), d.clone()))
            .unzip();
        Ok(Table {
            index_names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            keys,
            columns,
            data,
        })
    }

    /// Stack tables row-wise. Index levels and columns are aligned by name
    /// (outer join, first appearance order); missing values are null.
    #[must_use]
    pub fn concat_rows(parts: &[Table]) -> Table {
        let mut index_names: Vec<String> = Vec::new();
        let mut columns: Vec<String> = Vec::new();
        for part in parts {
            for name in &part.index_names {
                if !index_names.contains(name) {
                    index_names.push(name.clone());
                }
            }
            for name in &part.columns {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }

        let mut keys = Vec::new();
        let mut data: Vec<Vec<Cell>> = vec![Vec::new(); columns.len()];
        for part in parts {
            let level_map: Vec<Option<usize>> =
                index_names.iter().map(|n| part.level_position(n)).collect();
            for key in &part.keys {
                keys.push(
                    level_map
                        .iter()
                        .map(|p| p.map(|i| key[i].clone()).unwrap_or_default())
                        .collect(),
                );
            }
            for (name, out) in columns.iter().zip(data.iter_mut()) {
                match part.column(name) {
                    Some(values) => out.extend(values.iter().cloned()),
                    None => out.extend(std::iter::repeat_n(Cell::Null, part.nrows())),
                }
            }
        }

        Table {
            index_names,
            keys,
            columns,
            data,
        }
    }

    /// Stack tables row-wise under a new outermost index level `level`,
    /// whose value on each row is the key of the part it came from.
    #[must_use]
    pub fn concat_keyed(level: &str, parts: Vec<(Cell, Table)>) -> Table {
        let tagged: Vec<Table> = parts
            .into_iter()
            .map(|(key, mut table)| {
                table.insert_index_level(0, level, key);
                table
            })
            .collect();
        Table::concat_rows(&tagged)
    }

    /// Append the columns of `other` to every row, matching rows through the
    /// index level `level` that both tables share. Rows without a match get
    /// null values.
    pub fn join_on_level(&self, other: &Table, level: &str) -> Result<Table, TableError> {
        let own = self
            .level_position(level)
            .ok_or_else(|| TableError::MissingIndexLevel(level.to_string()))?;
        let theirs = other
            .level_position(level)
            .ok_or_else(|| TableError::MissingIndexLevel(level.to_string()))?;

        let lookup: FxHashMap<JoinKey<'_>, usize> = other
            .keys
            .iter()
            .enumerate()
            .map(|(row, key)| (JoinKey::from(&key[theirs]), row))
            .collect();
        let matches: Vec<Option<usize>> = self
            .keys
            .iter()
            .map(|key| lookup.get(&JoinKey::from(&key[own])).copied())
            .collect();

        let mut joined = self.clone();
        for (name, values) in other.columns.iter().zip(&other.data) {
            let column = matches
                .iter()
                .map(|m| m.map(|row| values[row].clone()).unwrap_or_default())
                .collect();
            joined.push_column(name.clone(), column)?;
        }
        Ok(joined)
    }
}
