//! Flattening records into CSV rows.

use crate::codec::ValueCodec;
use crate::error::{Error, Result};
use crate::io::{self, compression::Sink};
use crate::resolver::Schema;
use crate::schema::Record;
use std::path::Path;

/// Append `records` to the CSV file at `path`, creating it if missing.
///
/// A header row is written first, then one row per record with nested fields
/// flattened in declaration order. Leaves under an absent (`None`) optional
/// sub-record are written as their kind's zero literal.
///
/// The header is written on every call: appending to a file that already has one
/// produces a second header row.
///
/// Returns the number of records written.
///
/// # Errors
/// [`Error::EmptyInput`] before any I/O when `records` is empty; schema errors;
/// [`Error::Io`] and [`Error::WriteRow`] for output failures. Rows written before a
/// failure are flushed and stay in the file.
pub fn write<T: Record>(path: impl AsRef<Path>, records: &[T]) -> Result<usize> {
    let path = path.as_ref();
    if records.is_empty() {
        return Err(Error::EmptyInput);
    }
    let schema = Schema::of::<T>()?;
    let sink = io::open_sink(path)?;
    let mut wtr = csv::Writer::from_writer(sink);
    let written = write_rows(&mut wtr, &schema, records);
    let closed = close(wtr).map_err(|e| Error::io("flush", path, e));
    let rows = written?;
    closed?;
    tracing::debug!(rows, path = %path.display(), record = schema.type_name(), "wrote records");
    Ok(rows)
}

/// Like [`write`], into any writer. The writer is flushed before returning.
///
/// # Errors
/// See [`write`].
pub fn write_to<T: Record, W: std::io::Write>(writer: W, records: &[T]) -> Result<usize> {
    if records.is_empty() {
        return Err(Error::EmptyInput);
    }
    let schema = Schema::of::<T>()?;
    let mut wtr = csv::Writer::from_writer(writer);
    let written = write_rows(&mut wtr, &schema, records);
    let flushed = wtr.flush().map_err(|e| Error::io("flush", "<writer>", e));
    let rows = written?;
    flushed?;
    Ok(rows)
}

fn write_rows<T: Record, W: std::io::Write>(
    wtr: &mut csv::Writer<W>,
    schema: &Schema,
    records: &[T],
) -> Result<usize> {
    let leaves = schema.leaves();
    wtr.write_record(leaves.iter().map(|l| l.column.as_str()))
        .map_err(|source| Error::WriteRow { row: 0, source })?;

    let mut cells: Vec<String> = Vec::with_capacity(leaves.len());
    for (i, record) in records.iter().enumerate() {
        cells.clear();
        for leaf in leaves {
            let cell = match leaf.path.read(record) {
                Some(Some(value)) => ValueCodec::new(leaf.kind).encode(&value),
                Some(None) => leaf.kind.zero_literal().to_string(),
                None => {
                    return Err(Error::ShapeMismatch {
                        type_name: schema.type_name(),
                        column: leaf.column.clone(),
                    });
                }
            };
            cells.push(cell);
        }
        wtr.write_record(&cells)
            .map_err(|source| Error::WriteRow { row: i + 1, source })?;
    }
    Ok(records.len())
}

fn close(wtr: csv::Writer<Box<dyn Sink>>) -> std::io::Result<()> {
    let sink = wtr.into_inner().map_err(|e| e.into_error())?;
    sink.close()
}
