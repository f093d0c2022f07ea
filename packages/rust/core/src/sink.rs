//! CSV output of extracted records.
//!
//! Identifiers are digit runs or the `N/A` sentinel, so rows are written
//! without quoting.

use std::path::Path;

use tracing::info;

use adlib_shared::{AdLibError, ExtractedRecord, Result};

/// First line of every output file.
pub const CSV_HEADER: &str = "index,libraryId";

/// Render records as `index,libraryId` rows under the header.
pub fn render_csv(records: &[ExtractedRecord]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 20);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for record in records {
        out.push_str(&format!("{},{}\n", record.ordinal(), record.identifier()));
    }
    out
}

/// Write the CSV to `path`, creating parent directories.
pub fn write_csv(path: &Path, records: &[ExtractedRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AdLibError::io(parent, e))?;
    }
    std::fs::write(path, render_csv(records)).map_err(|e| AdLibError::io(path, e))?;
    info!(path = %path.display(), rows = records.len(), "wrote csv");
    Ok(())
}
