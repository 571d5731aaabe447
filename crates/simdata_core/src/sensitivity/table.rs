//! Sensitivity tables keyed by `(reporter, parameter)`

use std::fmt;

use crate::error::TableError;
use crate::model::{Cell, Table};

pub const REPORTER: &str = "reporter";
pub const PARAMETER: &str = "parameter";

const S2_PREFIX: &str = "S2_";

/// Order of a Sobol index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    /// First order
    S1,
    /// Total order
    ST,
    /// Second order, one column per partner parameter
    S2,
}

impl Order {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Order::S1 => "S1",
            Order::ST => "ST",
            Order::S2 => "S2",
        }
    }
}

/// Two-level column key `(order, parameter)`. `S1` and `ST` carry an empty
/// parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub order: Order,
    pub parameter: String,
}

impl ColumnKey {
    pub fn s1() -> Self {
        Self {
            order: Order::S1,
            parameter: String::new(),
        }
    }

    pub fn st() -> Self {
        Self {
            order: Order::ST,
            parameter: String::new(),
        }
    }

    pub fn s2(partner: &str) -> Self {
        Self {
            order: Order::S2,
            parameter: partner.to_string(),
        }
    }

    /// Name of the column in the flat form: `S1`, `ST` or `S2_<partner>`
    pub fn flat_name(&self) -> String {
        match self.order {
            Order::S2 => format!("{S2_PREFIX}{}", self.parameter),
            order => order.name().to_string(),
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.order.name(), self.parameter)
    }
}

fn same(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Indices of one parameter for one reporter
#[derive(Debug, Clone)]
pub struct SensitivityRow {
    pub reporter: String,
    pub parameter: String,
    pub s1: f64,
    pub st: f64,
    /// One value per partner parameter of the owning table. NaN where no
    /// interaction was computed.
    pub s2: Vec<f64>,
}

impl PartialEq for SensitivityRow {
    fn eq(&self, other: &Self) -> bool {
        self.reporter == other.reporter
            && self.parameter == other.parameter
            && same(self.s1, other.s1)
            && same(self.st, other.st)
            && self.s2.len() == other.s2.len()
            && self.s2.iter().zip(&other.s2).all(|(a, b)| same(*a, *b))
    }
}

/// Sobol indices (or their confidence intervals) of every analyzed
/// `(reporter, parameter)` pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensitivityTable {
    partners: Vec<String>,
    rows: Vec<SensitivityRow>,
}

impl SensitivityTable {
    /// Create an empty table. A non-empty `partners` list makes it a
    /// second-order table.
    pub fn new(partners: Vec<String>) -> Self {
        Self {
            partners,
            rows: Vec::new(),
        }
    }

    /// Append a row. Missing second-order values are padded with NaN.
    pub fn push(&mut self, mut row: SensitivityRow) {
        row.s2.resize(self.partners.len(), f64::NAN);
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[SensitivityRow] {
        &self.rows
    }

    pub fn partners(&self) -> &[String] {
        &self.partners
    }

    pub fn is_second_order(&self) -> bool {
        !self.partners.is_empty()
    }

    /// Column hierarchy: `(S1, "")`, `(ST, "")`, then `(S2, partner)` per partner
    pub fn column_keys(&self) -> Vec<ColumnKey> {
        let mut keys = vec![ColumnKey::s1(), ColumnKey::st()];
        keys.extend(self.partners.iter().map(|p| ColumnKey::s2(p)));
        keys
    }

    pub fn get(&self, reporter: &str, parameter: &str, column: &ColumnKey) -> Option<f64> {
        let row = self
            .rows
            .iter()
            .find(|r| r.reporter == reporter && r.parameter == parameter)?;
        match column.order {
            Order::S1 => Some(row.s1),
            Order::ST => Some(row.st),
            Order::S2 => self
                .partners
                .iter()
                .position(|p| *p == column.parameter)
                .map(|i| row.s2[i]),
        }
    }

    /// Union of several tables. Partner columns are aligned by name in
    /// first-appearance order.
    #[must_use]
    pub fn concat(parts: &[SensitivityTable]) -> SensitivityTable {
        let mut partners: Vec<String> = Vec::new();
        for part in parts {
            for p in &part.partners {
                if !partners.contains(p) {
                    partners.push(p.clone());
                }
            }
        }
        let mut out = SensitivityTable::new(partners);
        for part in parts {
            for row in &part.rows {
                let s2 = out
                    .partners
                    .iter()
                    .map(|p| {
                        part.partners
                            .iter()
                            .position(|q| q == p)
                            .map_or(f64::NAN, |i| row.s2[i])
                    })
                    .collect();
                out.rows.push(SensitivityRow { s2, ..row.clone() });
            }
        }
        out
    }

    /// Flat form indexed by `(reporter, parameter)` with columns `S1`, `ST`
    /// and `S2_<partner>`.
    pub fn to_table(&self) -> Table {
        let keys = self
            .rows
            .iter()
            .map(|r| {
                vec![
                    Cell::Str(r.reporter.clone()),
                    Cell::Str(r.parameter.clone()),
                ]
            })
            .collect();
        let mut columns = vec![
            (
                Order::S1.name().to_string(),
                self.rows.iter().map(|r| Cell::Float(r.s1)).collect(),
            ),
            (
                Order::ST.name().to_string(),
                self.rows.iter().map(|r| Cell::Float(r.st)).collect(),
            ),
        ];
        for (i, partner) in self.partners.iter().enumerate() {
            columns.push((
                ColumnKey::s2(partner).flat_name(),
                self.rows.iter().map(|r| Cell::Float(r.s2[i])).collect(),
            ));
        }
        Table::from_parts(vec![REPORTER.into(), PARAMETER.into()], keys, columns)
            .unwrap_or_default()
    }

    /// Parse the flat form. `reporter` and `parameter` may be index levels
    /// or plain columns (as after a CSV round trip).
    pub fn from_table(table: &Table) -> Result<Self, TableError> {
        let reporters = labels(table, REPORTER)?;
        let parameters = labels(table, PARAMETER)?;
        let s1 = floats(table, Order::S1.name())?;
        let st = floats(table, Order::ST.name())?;

        let partners: Vec<String> = table
            .columns()
            .iter()
            .filter_map(|c| c.strip_prefix(S2_PREFIX))
            .map(str::to_string)
            .collect();
        let s2_columns = partners
            .iter()
            .map(|p| floats(table, &ColumnKey::s2(p).flat_name()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = SensitivityTable::new(partners);
        for row in 0..table.nrows() {
            out.rows.push(SensitivityRow {
                reporter: reporters[row].clone(),
                parameter: parameters[row].clone(),
                s1: s1[row],
                st: st[row],
                s2: s2_columns.iter().map(|c| c[row]).collect(),
            });
        }
        Ok(out)
    }
}

fn labels(table: &Table, name: &str) -> Result<Vec<String>, TableError> {
    let cells: Vec<&Cell> = match table.level_values(name) {
        Some(values) => values,
        None => table
            .column(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))?
            .iter()
            .collect(),
    };
    Ok(cells
        .into_iter()
        .map(|c| match c {
            Cell::Str(s) => s.clone(),
            other => other.to_string(),
        })
        .collect())
}

fn floats(table: &Table, name: &str) -> Result<Vec<f64>, TableError> {
    let column = table
        .column(name)
        .ok_or_else(|| TableError::MissingColumn(name.to_string()))?;
    Ok(column
        .iter()
        .map(|c| c.as_f64().unwrap_or(f64::NAN))
        .collect())
}
