use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::experiment::{experiment_dir_name, last_exp_id, normalize_name};
use super::portable;
use super::tabular::write_table;
use crate::error::PersistError;
use crate::model::{Entry, OutputRecord, Value};

/// Outcome of [`OutputRecord::save`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    /// The experiment directory that was created
    pub dir: PathBuf,
    pub written: Vec<PathBuf>,
    /// Entries that could not be written, with the reason
    pub skipped: Vec<(String, String)>,
}

fn write_json(path: &Path, value: &Value) -> Result<(), PersistError> {
    let json = portable::to_json(value)?;
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer(&mut writer, &json)?;
    writer.flush()?;
    Ok(())
}

/// Write one entry, removing any partial file on failure.
fn write_entry(dir: &Path, key: &str, entry: &Entry, report: &mut SaveReport) {
    let (path, result) = match entry {
        Entry::Table(table) => {
            let path = dir.join(format!("{key}.csv"));
            let result = write_table(&path, table);
            (path, result)
        }
        Entry::Value(value) => {
            let path = dir.join(format!("{key}.json"));
            let result = write_json(&path, value);
            (path, result)
        }
        Entry::Group(children) => {
            for (sub, child) in children {
                write_entry(dir, &format!("{key}_{sub}"), child, report);
            }
            return;
        }
    };

    match result {
        Ok(()) => report.written.push(path),
        Err(e) => {
            tracing::warn!(entry = key, error = %e, "Could not save entry");
            if let Err(rm) = fs::remove_file(&path)
                && rm.kind() != io::ErrorKind::NotFound
            {
                tracing::warn!(path = %path.display(), error = %rm, "Could not remove partial file");
            }
            report.skipped.push((key.to_string(), e.to_string()));
        }
    }
}

impl OutputRecord {
    /// Write the record to `{path}/{name}_{id}/`.
    ///
    /// `name` defaults to the model type (or `Unnamed`) and `id` to one past
    /// the highest id already saved under that name. Tables are written as
    /// CSV and structured values as JSON; nested sections produce one file
    /// per child, named `{key}_{child}`. Entries that cannot be written are
    /// logged, their partial files removed, and listed in the report.
    pub fn save(
        &self,
        path: &Path,
        name: Option<&str>,
        id: Option<u32>,
    ) -> Result<SaveReport, PersistError> {
        let name = normalize_name(name.or(self.model_type()).unwrap_or("Unnamed"));
        fs::create_dir_all(path)?;
        let id = match id {
            Some(id) => id,
            None => last_exp_id(path, &name)? + 1,
        };

        let dir = path.join(experiment_dir_name(&name, id));
        fs::create_dir(&dir).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => PersistError::AlreadyExists(dir.clone()),
            _ => e.into(),
        })?;

        let mut report = SaveReport {
            dir: dir.clone(),
            ..Default::default()
        };
        for (key, entry) in self.entries() {
            write_entry(&dir, &key, &entry, &mut report);
        }

        tracing::info!(
            dir = %dir.display(),
            files = report.written.len(),
            skipped = report.skipped.len(),
            "Saved output record"
        );
        Ok(report)
    }
}
