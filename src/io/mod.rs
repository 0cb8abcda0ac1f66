//! File access for the reader and writer.
//!
//! - [`open_source`] opens a file for reading, decompressing by extension.
//! - [`open_sink`] opens a file for appending, or creates it (and its parent
//!   directories) when missing, compressing by extension.

pub mod compression;

use crate::error::{Error, Result};
use compression::Sink;
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::Read;
use std::path::Path;

/// Open `path` for reading.
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be opened or its decompressor fails to
/// initialize.
pub fn open_source(path: &Path) -> Result<Box<dyn Read>> {
    let f = File::open(path).map_err(|e| Error::io("open", path, e))?;
    compression::wrap_reader(f, path).map_err(|e| Error::io("set up decompression for", path, e))
}

/// Open `path` for appending, creating it when it does not exist.
///
/// Existing content is kept; new rows land after it.
///
/// # Errors
/// Returns [`Error::Io`] if the parent directory or the file cannot be created.
pub fn open_sink(path: &Path) -> Result<Box<dyn Sink>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
    }
    let existed = path.exists();
    let f = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| Error::io(if existed { "open for append" } else { "create" }, path, e))?;
    tracing::debug!(path = %path.display(), append = existed, "opened output");
    compression::wrap_writer(f, path).map_err(|e| Error::io("set up compression for", path, e))
}
