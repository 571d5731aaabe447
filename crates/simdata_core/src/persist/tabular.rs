//! CSV reading and writing of tables.
//!
//! The header holds the index level names followed by the columns. Empty
//! fields are null. On read, any columns named after an index level are moved
//! back into the index.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::PersistError;
use crate::model::{Cell, IndexLevel, Table};

pub fn write_table(path: &Path, table: &Table) -> Result<(), PersistError> {
    write_table_to(File::create(path)?, table)
}

/// Write a table as CSV to any writer, e.g. stdout.
pub fn write_table_to<W: io::Write>(writer: W, table: &Table) -> Result<(), PersistError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(table.index_names().iter().chain(table.columns()))?;
    for row in 0..table.nrows() {
        writer.write_record(
            table
                .key(row)
                .iter()
                .chain(table.row(row))
                .map(Cell::to_string),
        )?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_table(path: &Path) -> Result<Table, PersistError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut data: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
    let mut nrows = 0;
    for record in reader.records() {
        let record = record?;
        for (column, field) in data.iter_mut().zip(record.iter()) {
            column.push(Cell::parse(field));
        }
        nrows += 1;
    }

    let flat = Table::from_parts(
        Vec::new(),
        vec![Vec::new(); nrows],
        headers.iter().cloned().zip(data).collect(),
    )?;
    let index = IndexLevel::present_in(&headers);
    Ok(flat.set_index(&index)?)
}
