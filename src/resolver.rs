//! Field-path resolution and flattening.
//!
//! [`Schema::of`] walks a record type's [`Shape`] once, depth-first in declaration
//! order, and produces one [`Leaf`] per scalar field: its flattened column name,
//! the [`FieldPath`] that addresses it inside a live record, its kind and default.
//! That order is the column order on write and the binding order on read.
//!
//! [`Schema::bind`] pairs every leaf with its position in a file's header
//! ([`ColumnIndex`]). The resulting [`FieldBinding`]s are computed once per file and
//! shared read-only by every worker.

use crate::codec::{effective_raw, Scalar, ScalarKind, ValueCodec};
use crate::error::{Error, Result};
use crate::schema::{AssignError, FieldKind, FieldRef, Record, Shape};
use csv::StringRecord;
use std::collections::HashMap;

/// Separator between a parent's column name and its child's.
pub const COLUMN_SEPARATOR: &str = "_";

/// Structural field indices from the root record down to one leaf.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<usize>);

impl FieldPath {
    #[must_use]
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    fn split(&self) -> Option<(&[usize], usize)> {
        let (last, parents) = self.0.split_last()?;
        Some((parents, *last))
    }

    /// Read the leaf.
    ///
    /// Returns `None` when the record does not have the structure the path expects,
    /// and `Some(None)` when an optional ancestor is absent.
    #[must_use]
    pub fn read(&self, root: &dyn Record) -> Option<Option<Scalar>> {
        let (parents, leaf) = self.split()?;
        let mut rec = root;
        for &i in parents {
            match rec.field(i)? {
                FieldRef::Nested(Some(child)) => rec = child,
                FieldRef::Nested(None) => return Some(None),
                FieldRef::Scalar(_) => return None,
            }
        }
        match rec.field(leaf)? {
            FieldRef::Scalar(value) => Some(Some(value)),
            FieldRef::Nested(_) => None,
        }
    }

    /// Store `value` into the leaf, allocating absent optional ancestors on the way.
    ///
    /// # Errors
    /// Returns the [`AssignError`] raised by the leaf field.
    pub fn write(&self, root: &mut dyn Record, value: Scalar) -> std::result::Result<(), AssignError> {
        let (parents, leaf) = self.split().ok_or(AssignError::NotScalar)?;
        let mut rec = root;
        for &i in parents {
            rec = rec.nested_mut(i).ok_or(AssignError::NotScalar)?;
        }
        rec.assign(leaf, value)
    }
}

/// Column name → position in each data row, built from the header row.
#[derive(Clone, Debug, Default)]
pub struct ColumnIndex {
    positions: HashMap<String, usize>,
    width: usize,
}

impl ColumnIndex {
    /// Index a header row. A repeated name maps to its last occurrence.
    #[must_use]
    pub fn from_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut positions = HashMap::new();
        let mut width = 0;
        for (i, name) in headers.into_iter().enumerate() {
            positions.insert(name.as_ref().to_string(), i);
            width = i + 1;
        }
        Self { positions, width }
    }

    #[must_use]
    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// Number of columns in the header row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }
}

/// One scalar field of a flattened shape.
#[derive(Clone, Debug)]
pub struct Leaf {
    /// Flattened column name, e.g. `address_city`.
    pub column: String,
    pub path: FieldPath,
    pub kind: ScalarKind,
    pub default: Option<&'static str>,
}

/// A leaf resolved against one file's header.
#[derive(Clone, Debug)]
pub struct FieldBinding {
    pub column: String,
    pub path: FieldPath,
    /// Position in each data row; `None` when the header lacks the column.
    pub position: Option<usize>,
    pub default: Option<&'static str>,
    pub codec: ValueCodec,
}

impl FieldBinding {
    /// The string to decode for this field in `row`, after the default fallback.
    #[must_use]
    pub fn raw<'r>(&'r self, row: &'r StringRecord) -> &'r str {
        let cell = self.position.and_then(|i| row.get(i));
        effective_raw(cell, self.default, self.codec.kind())
    }

    /// Decode this field from `row` and store it into `target`.
    ///
    /// # Errors
    /// Returns [`Error::ValueParse`] (tagged with `line`) when the cell does not
    /// decode or does not fit the field.
    pub fn apply(&self, row: &StringRecord, line: u64, target: &mut dyn Record) -> Result<()> {
        let raw = self.raw(row);
        let value = self.codec.decode(raw).map_err(|e| Error::ValueParse {
            line,
            field: self.column.clone(),
            kind: e.kind,
            raw: e.raw,
            reason: e.reason,
        })?;
        self.path.write(target, value).map_err(|e| Error::ValueParse {
            line,
            field: self.column.clone(),
            kind: self.codec.kind(),
            raw: raw.to_string(),
            reason: e.to_string(),
        })
    }
}

/// The flattened leaves of one record type.
#[derive(Clone, Debug)]
pub struct Schema {
    type_name: &'static str,
    leaves: Vec<Leaf>,
}

impl Schema {
    /// Flatten `T`'s shape.
    ///
    /// # Errors
    /// [`Error::UnsupportedFieldType`] for a leaf without a codec and
    /// [`Error::CyclicSchema`] for a shape that contains itself.
    pub fn of<T: Record>() -> Result<Self> {
        Self::from_shape(T::shape())
    }

    /// Flatten an explicit shape descriptor.
    ///
    /// # Errors
    /// See [`Schema::of`].
    pub fn from_shape(shape: Shape) -> Result<Self> {
        let type_name = shape.type_name;
        let mut leaves = Vec::new();
        let mut ancestors = vec![type_name];
        flatten(&shape, "", &mut Vec::new(), &mut ancestors, &mut leaves)?;
        Ok(Self { type_name, leaves })
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Column names in write order.
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        self.leaves.iter().map(|l| l.column.clone()).collect()
    }

    /// Resolve every leaf against a header. Absent columns fall back to defaults.
    #[must_use]
    pub fn bind(&self, index: &ColumnIndex) -> Vec<FieldBinding> {
        self.leaves
            .iter()
            .map(|leaf| {
                let position = index.position(&leaf.column);
                if position.is_none() {
                    tracing::debug!(
                        record = self.type_name,
                        column = %leaf.column,
                        default = leaf.default.unwrap_or(""),
                        "column absent from header; using default"
                    );
                }
                FieldBinding {
                    column: leaf.column.clone(),
                    path: leaf.path.clone(),
                    position,
                    default: leaf.default,
                    codec: ValueCodec::new(leaf.kind),
                }
            })
            .collect()
    }
}

fn flatten(
    shape: &Shape,
    prefix: &str,
    path: &mut Vec<usize>,
    ancestors: &mut Vec<&'static str>,
    out: &mut Vec<Leaf>,
) -> Result<()> {
    for (i, def) in shape.fields.iter().enumerate() {
        let column = if prefix.is_empty() {
            def.column_name().to_string()
        } else {
            format!("{prefix}{COLUMN_SEPARATOR}{}", def.column_name())
        };
        path.push(i);
        match def.kind {
            FieldKind::Scalar(kind) => out.push(Leaf {
                column,
                path: FieldPath::new(path.clone()),
                kind,
                default: def.default,
            }),
            FieldKind::Unsupported(type_name) => {
                return Err(Error::UnsupportedFieldType {
                    field: format!("{}.{}", shape.type_name, def.name),
                    type_name,
                });
            }
            FieldKind::Nested { shape: child, .. } => {
                let child = child();
                if ancestors.contains(&child.type_name) {
                    let mut cycle = ancestors.clone();
                    cycle.push(child.type_name);
                    return Err(Error::CyclicSchema {
                        path: cycle.join(" -> "),
                    });
                }
                ancestors.push(child.type_name);
                flatten(&child, &column, path, ancestors, out)?;
                ancestors.pop();
            }
        }
        path.pop();
    }
    Ok(())
}

/// Bindings for `T` against a header.
///
/// # Errors
/// See [`Schema::of`].
pub fn resolve<T: Record>(index: &ColumnIndex) -> Result<Vec<FieldBinding>> {
    Ok(Schema::of::<T>()?.bind(index))
}

/// Column names `T` writes, in order.
///
/// # Errors
/// See [`Schema::of`].
pub fn headers<T: Record>() -> Result<Vec<String>> {
    Ok(Schema::of::<T>()?.headers())
}
