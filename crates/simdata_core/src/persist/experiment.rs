//! Experiment directory naming and lookup.
//!
//! Experiments are stored as `{path}/{name}_{id}/` with `id` counting up
//! from 1 for each name.

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use crate::error::PersistError;

/// Directory name for an experiment, with spaces replaced by underscores
pub fn experiment_dir_name(name: &str, id: u32) -> String {
    format!("{}_{id}", normalize_name(name))
}

pub fn normalize_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Split `{name}_{id}` into its parts
fn parse_dir_name(dir_name: &str) -> Option<(&str, u32)> {
    let (name, id) = dir_name.rsplit_once('_')?;
    Some((name, id.parse().ok()?))
}

/// Highest id among `{name}_{id}` directories in `path`, or 0 if there are
/// none (or `path` does not exist).
pub fn last_exp_id(path: &Path, name: &str) -> Result<u32, PersistError> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let name = normalize_name(name);
    let mut last = 0;
    for entry in entries.flatten() {
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let file_name = entry.file_name();
        if let Some((n, id)) = file_name.to_str().and_then(parse_dir_name)
            && n == name
        {
            last = last.max(id);
        }
    }
    Ok(last)
}

/// Name prefix of the most recently modified experiment directory in `path`
pub fn latest_experiment(path: &Path) -> Result<Option<String>, PersistError> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut latest: Option<(SystemTime, String)> = None;
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_dir() {
            continue;
        }
        let modified = meta.modified()?;
        if latest.as_ref().is_none_or(|(t, _)| modified > *t) {
            latest = Some((modified, entry.file_name().to_string_lossy().into_owned()));
        }
    }
    Ok(latest.map(|(_, dir_name)| match dir_name.rsplit_once('_') {
        Some((name, _)) => name.to_string(),
        None => dir_name,
    }))
}
