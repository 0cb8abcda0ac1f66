//! The row-processing pipeline.
//!
//! One producer reads rows strictly in file order and submits one task per row to
//! a [`WorkerPool`]. Each task materializes a fresh record, applies every
//! [`FieldBinding`] to it, and moves it into the handler. Bindings are resolved
//! once per file and shared read-only by all tasks.
//!
//! With `concurrency > 1` tasks complete in any order, so the handler must be safe
//! to call from several threads at once. The first failure (bad cell, handler
//! error, panic) stops the producer; tasks already submitted still run, and the
//! pool is drained before the call returns.

use crate::error::{Error, Result};
use crate::io;
use crate::pool::{InlinePool, RayonPool, WorkerPool};
use crate::resolver::{ColumnIndex, FieldBinding, Schema};
use crate::schema::Record;
use csv::StringRecord;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Callback invoked once per materialized row.
pub type Handler<T> = Arc<dyn Fn(T) -> anyhow::Result<()> + Send + Sync>;

/// Label used in errors when reading from a bare `io::Read`.
const READER_LABEL: &str = "<reader>";

/// Options for [`read`] and [`read_from`].
pub struct ReadOptions<T> {
    handler: Option<Handler<T>>,
    concurrency: usize,
}

impl<T> Default for ReadOptions<T> {
    fn default() -> Self {
        Self {
            handler: None,
            concurrency: 1,
        }
    }
}

impl<T> Clone for ReadOptions<T> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            concurrency: self.concurrency,
        }
    }
}

impl<T: Record> ReadOptions<T> {
    /// No handler, one worker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every record. Returning an error aborts the read.
    #[must_use]
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Number of rows processed in parallel. Must be at least 1.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// One worker per logical CPU.
    #[must_use]
    pub fn with_available_parallelism(self) -> Self {
        self.with_concurrency(num_cpus::get())
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// # Errors
    /// [`Error::InvalidConfiguration`] when `concurrency` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::InvalidConfiguration(
                "concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Read every row of the CSV file at `path` into `T`.
///
/// Returns the number of rows dispatched.
///
/// # Errors
/// Configuration, schema, header, row, value, and handler errors; see [`Error`].
/// Nothing is read when the options or the schema are invalid.
pub fn read<T: Record>(path: impl AsRef<Path>, options: ReadOptions<T>) -> Result<usize> {
    let path = path.as_ref();
    options.validate()?;
    let schema = Schema::of::<T>()?;
    let source = io::open_source(path)?;
    let pool = new_pool(options.concurrency)?;
    run(path, source, &schema, options.handler, pool.as_ref())
}

/// Like [`read`], over any reader.
///
/// # Errors
/// See [`read`].
pub fn read_from<T: Record, R: std::io::Read>(reader: R, options: ReadOptions<T>) -> Result<usize> {
    options.validate()?;
    let schema = Schema::of::<T>()?;
    let pool = new_pool(options.concurrency)?;
    run(Path::new(READER_LABEL), reader, &schema, options.handler, pool.as_ref())
}

/// Like [`read_from`], dispatching to a caller-supplied pool.
///
/// The pool's own size governs parallelism; `options.concurrency` is only
/// validated.
///
/// # Errors
/// See [`read`].
pub fn read_with_pool<T: Record, R: std::io::Read>(
    reader: R,
    options: ReadOptions<T>,
    pool: &dyn WorkerPool,
) -> Result<usize> {
    options.validate()?;
    let schema = Schema::of::<T>()?;
    run(Path::new(READER_LABEL), reader, &schema, options.handler, pool)
}

/// Read the whole file into memory, in file order.
///
/// # Errors
/// See [`read`].
pub fn read_vec<T: Record>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let out = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&out);
    read(
        path,
        ReadOptions::new().with_handler(move |record: T| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(record);
            Ok(())
        }),
    )?;
    let records = std::mem::take(&mut *out.lock().unwrap_or_else(PoisonError::into_inner));
    Ok(records)
}

/// Build a record of type `T` from one row.
///
/// # Errors
/// [`Error::ValueParse`] for the first field that fails to decode.
pub fn materialize_row<T: Record>(row: &StringRecord, line: u64, bindings: &[FieldBinding]) -> Result<T> {
    let mut record = T::materialize();
    for binding in bindings {
        binding.apply(row, line, &mut record)?;
    }
    Ok(record)
}

fn new_pool(concurrency: usize) -> Result<Box<dyn WorkerPool>> {
    if concurrency == 1 {
        Ok(Box::new(InlinePool::new()))
    } else {
        Ok(Box::new(RayonPool::new(concurrency)?))
    }
}

fn run<T: Record, R: std::io::Read>(
    label: &Path,
    source: R,
    schema: &Schema,
    handler: Option<Handler<T>>,
    pool: &dyn WorkerPool,
) -> Result<usize> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(source);

    let mut header = StringRecord::new();
    match rdr.read_record(&mut header) {
        Ok(true) => {}
        Ok(false) => {
            return Err(Error::HeaderRead {
                path: label.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "no header row"),
            });
        }
        Err(e) => {
            return Err(Error::HeaderRead {
                path: label.to_path_buf(),
                source: e.into(),
            });
        }
    }

    let index = ColumnIndex::from_headers(header.iter());
    let bindings: Arc<[FieldBinding]> = schema.bind(&index).into();
    tracing::debug!(
        record = schema.type_name(),
        source = %label.display(),
        columns = index.width(),
        fields = bindings.len(),
        workers = pool.workers(),
        "resolved bindings"
    );
    if handler.is_none() {
        tracing::debug!("no handler configured; records are discarded after materialization");
    }

    let produced = dispatch(&mut rdr, &bindings, &handler, pool);
    let drained = pool.wait();
    let rows = produced?;
    drained?;
    tracing::debug!(rows, source = %label.display(), "finished reading");
    Ok(rows)
}

fn dispatch<T: Record, R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    bindings: &Arc<[FieldBinding]>,
    handler: &Option<Handler<T>>,
    pool: &dyn WorkerPool,
) -> Result<usize> {
    let mut rows = 0usize;
    while !pool.has_failed() {
        let next_line = rdr.position().line();
        let mut row = StringRecord::new();
        match rdr.read_record(&mut row) {
            Ok(true) => {}
            Ok(false) => break,
            Err(source) => {
                let line = source.position().map_or(next_line, csv::Position::line);
                return Err(Error::RowRead { line, source });
            }
        }
        let line = row.position().map_or(next_line, csv::Position::line);
        rows += 1;

        let bindings = Arc::clone(bindings);
        let handler = handler.clone();
        pool.submit(Box::new(move || {
            process_row(&row, line, &bindings, handler.as_deref())
        }));
    }
    Ok(rows)
}

fn process_row<T: Record>(
    row: &StringRecord,
    line: u64,
    bindings: &[FieldBinding],
    handler: Option<&(dyn Fn(T) -> anyhow::Result<()> + Send + Sync)>,
) -> Result<()> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let record = materialize_row::<T>(row, line, bindings)?;
        match handler {
            Some(handle) => handle(record).map_err(|source| Error::Handler { line, source }),
            None => Ok(()),
        }
    }));
    outcome.unwrap_or_else(|payload| {
        Err(Error::Panicked {
            line,
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
