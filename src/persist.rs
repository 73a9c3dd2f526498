//! Durable persistence of tables as delimited text.

use crate::error::WriteError;
use crate::table::Table;
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Write `table` to `path` as CSV with a header row.
///
/// The destination directory is created if absent and any existing file is
/// overwritten. Content goes to a temporary file in the same directory first
/// and is renamed into place, so the destination never holds a partial write.
pub fn persist(table: &Table, path: &Path) -> Result<(), WriteError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|source| WriteError::CreateDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    table.write_csv(&mut tmp).map_err(|source| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.as_file().sync_all().map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.persist(path).map_err(|e| WriteError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "Persisted table"
    );
    Ok(())
}
