//! # csvbind
//!
//! Map CSV rows to and from typed Rust records, including nested sub-records,
//! optional (`Option<T>`) sub-records, per-field default values, and column names
//! taken from a field's tag or name.
//!
//! ## Key Features
//!
//! - **Declarative records** - [`record!`] declares a struct and its column mapping
//! - **Nested flattening** - `address: Address` becomes `address_street`, `address_city`
//! - **Missing columns are not errors** - absent columns fall back to the field's
//!   default, then to the kind's zero literal
//! - **Concurrent reads** - rows are materialized and handed to your callback on a
//!   bounded worker pool
//! - **Transparent compression** - `.gz` and `.zst` paths are handled by extension
//!
//! ## Quick Start
//!
//! ```no_run
//! use csvbind::{read, record, write, ReadOptions};
//!
//! record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Address {
//!         #[csv(name = "street")]
//!         pub street: String,
//!         #[csv(name = "city")]
//!         pub city: String,
//!     }
//! }
//!
//! record! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Person {
//!         #[csv(name = "name")]
//!         pub name: String,
//!         #[csv(name = "age", default = "18")]
//!         pub age: i32,
//!         #[csv(name = "address")]
//!         pub address: Address,
//!     }
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let people = vec![Person {
//!     name: "John".into(),
//!     age: 30,
//!     address: Address { street: "Main St".into(), city: "New York".into() },
//! }];
//! write("people.csv", &people)?; // name,age,address_street,address_city
//!
//! read(
//!     "people.csv",
//!     ReadOptions::new()
//!         .with_concurrency(4)
//!         .with_handler(|p: Person| {
//!             println!("{} lives in {}", p.name, p.address.city);
//!             Ok(())
//!         }),
//! )?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Column Mapping
//!
//! A field's column name is its `#[csv(name = ..)]` tag, or its Rust name when
//! untagged. Nested fields prefix their children with their own column name and
//! `_`. Leaves are ordered depth-first in declaration order; that order is the
//! column order on write and the binding order on read.
//!
//! When reading, a cell resolves as: the cell if non-empty, else the field's
//! `default`, else the zero literal of its kind (`""`, `0`, `0`, `false`).
//!
//! ## Feature Flags
//!
//! - `compression-gzip` - gzip for `.gz`/`.gzip` paths (default)
//! - `compression-zstd` - zstd for `.zst`/`.zstd` paths (default)
//!
//! ## Module Overview
//!
//! - [`schema`] - `Record`/`Field` traits and shape descriptors
//! - [`resolver`] - flattening, column index, field bindings
//! - [`codec`] - scalar parsing and rendering
//! - [`reader`] - the row-processing pipeline
//! - [`writer`] - flattening records into rows
//! - [`pool`] - worker pools behind the reader
//! - [`io`] - file access and compression

pub mod codec;
pub mod error;
pub mod io;
mod macros;
pub mod pool;
pub mod reader;
pub mod resolver;
pub mod schema;
pub mod writer;

pub use codec::{effective_raw, DecodeError, Scalar, ScalarKind, ValueCodec};
pub use error::{Error, Result};
pub use pool::{InlinePool, RayonPool, Task, WorkerPool};
pub use reader::{materialize_row, read, read_from, read_vec, read_with_pool, Handler, ReadOptions};
pub use resolver::{headers, resolve, ColumnIndex, FieldBinding, FieldPath, Leaf, Schema};
pub use schema::{AssignError, Field, FieldDef, FieldKind, FieldRef, Record, Shape};
pub use writer::{write, write_to};
