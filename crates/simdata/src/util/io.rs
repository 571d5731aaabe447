//! I/O utility functions

use std::fs;
use std::io;
use std::path::Path;

/// Write bytes to a file atomically using write-then-rename pattern.
///
/// The content goes to `{path}.tmp` first and is renamed over the target, so
/// readers never see a half-written CSV.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");

    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;

    Ok(())
}
