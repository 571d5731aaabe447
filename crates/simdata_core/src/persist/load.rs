use std::collections::BTreeMap;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::experiment::{experiment_dir_name, last_exp_id, latest_experiment, normalize_name};
use super::tabular::read_table;
use crate::error::PersistError;
use crate::model::{Entry, OutputRecord, Value};

/// Sections whose children are saved as `{section}_{child}` files
const NESTED_SECTIONS: [&str; 2] = ["variables", "parameters"];

/// A file that could not be loaded
#[derive(Debug)]
pub struct LoadFailure {
    pub file: PathBuf,
    pub error: PersistError,
}

/// Outcome of [`OutputRecord::load`]
#[derive(Debug)]
pub struct LoadReport {
    pub record: OutputRecord,
    /// The experiment directory that was read
    pub dir: PathBuf,
    pub failures: Vec<LoadFailure>,
}

fn read_entry(path: &Path) -> Result<Entry, PersistError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match ext {
        "csv" => Ok(Entry::Table(read_table(path)?)),
        "json" => {
            let reader = BufReader::new(fs::File::open(path)?);
            let json: serde_json::Value = serde_json::from_reader(reader)?;
            Ok(Entry::Value(Value::from(json)))
        }
        other => Err(PersistError::UnsupportedExtension(other.to_string())),
    }
}

/// Resolve the experiment directory from an optional name and id.
fn resolve_dir(
    path: &Path,
    name: Option<&str>,
    id: Option<u32>,
) -> Result<PathBuf, PersistError> {
    let not_found = |name: &str| PersistError::NotFound {
        name: name.to_string(),
        path: path.to_path_buf(),
    };
    let name = match name {
        Some(name) => normalize_name(name),
        None => latest_experiment(path)?.ok_or_else(|| not_found("<any>"))?,
    };
    let id = match id {
        Some(id) => id,
        None => match last_exp_id(path, &name)? {
            0 => return Err(not_found(&name)),
            last => last,
        },
    };
    let dir = path.join(experiment_dir_name(&name, id));
    if !dir.is_dir() {
        return Err(not_found(&name));
    }
    Ok(dir)
}

impl OutputRecord {
    /// Read a record saved with [`OutputRecord::save`].
    ///
    /// Without a `name`, the most recently modified experiment in `path` is
    /// used; without an `id`, the highest id saved under the name. Files
    /// named `variables_*` and `parameters_*` are nested back under their
    /// section. Files that fail to load are logged and listed in the report;
    /// they never abort the load.
    pub fn load(
        path: &Path,
        name: Option<&str>,
        id: Option<u32>,
    ) -> Result<LoadReport, PersistError> {
        let dir = resolve_dir(path, name, id)?;
        tracing::debug!(dir = %dir.display(), "Loading output record");

        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();

        let mut failures = Vec::new();
        let mut top: BTreeMap<String, (PathBuf, Entry)> = BTreeMap::new();
        let mut nested: BTreeMap<&str, BTreeMap<String, Entry>> = BTreeMap::new();
        for file in files {
            let Some(stem) = file.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let entry = match read_entry(&file) {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(file = %file.display(), error = %error, "Could not load file");
                    failures.push(LoadFailure { file, error });
                    continue;
                }
            };
            let section = NESTED_SECTIONS.iter().find_map(|section| {
                stem.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|child| (*section, child.to_string()))
            });
            match section {
                Some((section, child)) => {
                    nested.entry(section).or_default().insert(child, entry);
                }
                None => {
                    top.insert(stem, (file, entry));
                }
            }
        }
        for (section, children) in nested {
            top.insert(
                section.to_string(),
                (dir.join(section), Entry::Group(children.into_iter().collect())),
            );
        }

        let mut record = OutputRecord::new();
        for (key, (file, entry)) in top {
            if let Err(e) = record.insert(&key, entry) {
                tracing::warn!(entry = %key, error = %e, "Could not restore entry");
                failures.push(LoadFailure {
                    file,
                    error: e.into(),
                });
            }
        }

        if let Err(e) = record.validate() {
            tracing::warn!(dir = %dir.display(), error = %e, "Loaded record is inconsistent");
            failures.push(LoadFailure {
                file: dir.join("parameters_sample.csv"),
                error: e.into(),
            });
        }

        Ok(LoadReport {
            record,
            dir,
            failures,
        })
    }
}
