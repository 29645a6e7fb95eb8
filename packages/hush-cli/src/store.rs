//! JSON files standing in for the profile and message stores.

use std::fs;
use std::io::Write;
use std::path::Path;

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

/// Read and parse a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).wrap_err_with(|| format!("{} is not valid", path.display()))
}

/// Read a JSON array file, treating a missing file as empty
pub fn read_json_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    read_json(path)
}

/// Replace `path` with `value` in one rename
///
/// The new contents go to a temp file in the same directory first, so a
/// crash leaves either the old file or the new one, never a mix.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .wrap_err_with(|| format!("failed to create temp file in {}", dir.display()))?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;

    tmp.persist(path)
        .map_err(|e| eyre!("failed to replace {}: {}", path.display(), e.error))?;
    Ok(())
}
