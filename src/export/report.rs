//! JSON run reports.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::ExportError;
use crate::selection::SelectionReport;

/// Serializes a report as pretty-printed JSON.
pub fn report_to_json(report: &SelectionReport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Writes a report to `path` as JSON, creating parent directories.
pub fn write_report(report: &SelectionReport, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let json = report_to_json(report)?;
    let write_failed = |source: std::io::Error| ExportError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_failed)?;
    }
    fs::write(path, json).map_err(write_failed)?;

    info!(path = %path.display(), "Wrote selection report");
    Ok(())
}

/// Reads a report previously written by [`write_report`].
pub fn read_report(path: impl AsRef<Path>) -> Result<SelectionReport, ExportError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
