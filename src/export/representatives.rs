//! Plain-text representative lists.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::ExportError;
use crate::identity::SequenceId;

/// Joins IDs with newlines, without a trailing newline.
pub fn format_representatives(ids: &[SequenceId]) -> String {
    ids.join("\n")
}

/// Writes selected IDs to `path`, one per line and in selection order.
///
/// Parent directories are created as needed. The file has no trailing
/// newline, and an empty selection produces an empty file.
///
/// # Errors
///
/// Returns `ExportError::WriteFailed` if the directory or file cannot be written.
pub fn write_representatives(ids: &[SequenceId], path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let write_failed = |source: std::io::Error| ExportError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_failed)?;
    }
    fs::write(path, format_representatives(ids)).map_err(write_failed)?;

    info!(path = %path.display(), count = ids.len(), "Wrote representatives");
    Ok(())
}
