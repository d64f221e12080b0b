//! Snapshot Files
//!
//! Best-effort persistence of `export()` output as a JSON array. Not a
//! write-ahead log: anything written after the last save is lost.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::models::ExportedEntry;

/// Writes entries to `path`, replacing any existing file.
pub fn save(path: impl AsRef<Path>, entries: &[ExportedEntry]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, entries)?;
    writer.flush()?;

    info!("Snapshot saved: {} entries to {}", entries.len(), path.display());
    Ok(())
}

/// Reads entries written by [`save`].
pub fn load(path: impl AsRef<Path>) -> Result<Vec<ExportedEntry>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let entries: Vec<ExportedEntry> = serde_json::from_reader(reader)?;

    info!("Snapshot loaded: {} entries from {}", entries.len(), path.display());
    Ok(entries)
}
