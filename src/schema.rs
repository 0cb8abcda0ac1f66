//! Record description: the [`Record`] and [`Field`] traits and the static [`Shape`]
//! of a record type.
//!
//! A record type describes itself once, as an ordered list of [`FieldDef`]s, and
//! gives indexed access to its fields. Scalar fields are read as [`Scalar`]s and
//! assigned from them; nested fields hand out the sub-record as `&dyn Record`, so
//! the resolver and the pipeline can walk a [`FieldPath`](crate::FieldPath) through
//! any depth of nesting without knowing concrete types.
//!
//! Implementations are normally generated by [`record!`](crate::record); writing one
//! by hand is supported and only has to keep `shape`, `field`, `assign`, and
//! `nested_mut` consistent with each other.

use crate::codec::{Scalar, ScalarKind};
use thiserror::Error;

/// Static description of a record type.
#[derive(Clone, Debug)]
pub struct Shape {
    pub type_name: &'static str,
    pub fields: Vec<FieldDef>,
}

impl Shape {
    #[must_use]
    pub fn new(type_name: &'static str, fields: Vec<FieldDef>) -> Self {
        Self { type_name, fields }
    }
}

/// What a field holds.
#[derive(Clone, Copy, Debug)]
pub enum FieldKind {
    /// A leaf with a value codec.
    Scalar(ScalarKind),
    /// A sub-record, flattened into the parent's columns.
    Nested {
        shape: fn() -> Shape,
        optional: bool,
    },
    /// A leaf type without a value codec; rejected at resolution.
    ///
    /// For hand-written [`Field`] impls of types that may appear in a record but
    /// cannot be stored in a cell.
    Unsupported(&'static str),
}

/// One declared field of a [`Shape`].
#[derive(Clone, Debug)]
pub struct FieldDef {
    /// Structural (Rust) name of the field.
    pub name: &'static str,
    /// Column-name override.
    pub tag: Option<&'static str>,
    /// Fallback string used when the column is absent or the cell is empty.
    pub default: Option<&'static str>,
    pub kind: FieldKind,
}

impl FieldDef {
    #[must_use]
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            tag: None,
            default: None,
            kind,
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: Option<&'static str>) -> Self {
        self.tag = tag;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: Option<&'static str>) -> Self {
        self.default = default;
        self
    }

    /// The tag when set and non-empty, else the structural name.
    #[must_use]
    pub fn column_name(&self) -> &'static str {
        match self.tag {
            Some(tag) if !tag.is_empty() => tag,
            _ => self.name,
        }
    }
}

/// Read access to one field of a live record.
pub enum FieldRef<'a> {
    Scalar(Scalar),
    /// A sub-record; `None` for an absent optional one.
    Nested(Option<&'a dyn Record>),
}

/// A scalar could not be stored in the concrete field type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssignError {
    #[error("value {value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },
    #[error("expected a {expected} value, got {got}")]
    KindMismatch { expected: ScalarKind, got: ScalarKind },
    #[error("field does not hold a scalar")]
    NotScalar,
}

/// A struct-like type that maps to one CSV row.
pub trait Record: Send + 'static {
    /// The declared fields, in column order.
    fn shape() -> Shape
    where
        Self: Sized;

    /// A fresh instance with every nested and optional sub-record allocated.
    fn materialize() -> Self
    where
        Self: Sized;

    /// Field `index` in declaration order.
    fn field(&self, index: usize) -> Option<FieldRef<'_>>;

    /// Store a decoded scalar into field `index`.
    fn assign(&mut self, index: usize, value: Scalar) -> Result<(), AssignError>;

    /// The sub-record at field `index`, allocating an absent optional one.
    fn nested_mut(&mut self, index: usize) -> Option<&mut dyn Record>;
}

impl<T: Record> Record for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn materialize() -> Self {
        Box::new(T::materialize())
    }

    fn field(&self, index: usize) -> Option<FieldRef<'_>> {
        (**self).field(index)
    }

    fn assign(&mut self, index: usize, value: Scalar) -> Result<(), AssignError> {
        (**self).assign(index, value)
    }

    fn nested_mut(&mut self, index: usize) -> Option<&mut dyn Record> {
        (**self).nested_mut(index)
    }
}

/// A type usable as a field inside a [`record!`](crate::record) struct.
pub trait Field: Send + 'static {
    fn kind() -> FieldKind;

    fn materialize() -> Self;

    fn get(&self) -> FieldRef<'_>;

    fn set(&mut self, _value: Scalar) -> Result<(), AssignError> {
        Err(AssignError::NotScalar)
    }

    fn nested_mut(&mut self) -> Option<&mut dyn Record> {
        None
    }
}

impl Field for String {
    fn kind() -> FieldKind {
        FieldKind::Scalar(ScalarKind::String)
    }

    fn materialize() -> Self {
        String::new()
    }

    fn get(&self) -> FieldRef<'_> {
        FieldRef::Scalar(Scalar::String(self.clone()))
    }

    fn set(&mut self, value: Scalar) -> Result<(), AssignError> {
        match value {
            Scalar::String(s) => {
                *self = s;
                Ok(())
            }
            other => Err(mismatch(ScalarKind::String, &other)),
        }
    }
}

impl Field for bool {
    fn kind() -> FieldKind {
        FieldKind::Scalar(ScalarKind::Bool)
    }

    fn materialize() -> Self {
        false
    }

    fn get(&self) -> FieldRef<'_> {
        FieldRef::Scalar(Scalar::Bool(*self))
    }

    fn set(&mut self, value: Scalar) -> Result<(), AssignError> {
        match value {
            Scalar::Bool(b) => {
                *self = b;
                Ok(())
            }
            other => Err(mismatch(ScalarKind::Bool, &other)),
        }
    }
}

impl Field for f64 {
    fn kind() -> FieldKind {
        FieldKind::Scalar(ScalarKind::Float)
    }

    fn materialize() -> Self {
        0.0
    }

    fn get(&self) -> FieldRef<'_> {
        FieldRef::Scalar(Scalar::Float(*self))
    }

    fn set(&mut self, value: Scalar) -> Result<(), AssignError> {
        match value {
            Scalar::Float(x) => {
                *self = x;
                Ok(())
            }
            other => Err(mismatch(ScalarKind::Float, &other)),
        }
    }
}

impl Field for f32 {
    fn kind() -> FieldKind {
        FieldKind::Scalar(ScalarKind::Float)
    }

    fn materialize() -> Self {
        0.0
    }

    fn get(&self) -> FieldRef<'_> {
        // Widen through the shortest f32 rendering so 0.1f32 writes as "0.1".
        let widened = self.to_string().parse::<f64>().unwrap_or(f64::from(*self));
        FieldRef::Scalar(Scalar::Float(widened))
    }

    fn set(&mut self, value: Scalar) -> Result<(), AssignError> {
        match value {
            Scalar::Float(x) => {
                // Decimal renderings of f32::MAX sit just above it in f64; only
                // values that round to infinity are out of range.
                let narrowed = x as f32;
                if x.is_finite() && narrowed.is_infinite() {
                    return Err(AssignError::OutOfRange {
                        value: x.to_string(),
                        target: "f32",
                    });
                }
                *self = narrowed;
                Ok(())
            }
            other => Err(mismatch(ScalarKind::Float, &other)),
        }
    }
}

macro_rules! int_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Field for $ty {
                fn kind() -> FieldKind {
                    FieldKind::Scalar(ScalarKind::Int)
                }

                fn materialize() -> Self {
                    0
                }

                fn get(&self) -> FieldRef<'_> {
                    FieldRef::Scalar(Scalar::Int(i128::from(*self)))
                }

                fn set(&mut self, value: Scalar) -> Result<(), AssignError> {
                    match value {
                        Scalar::Int(i) => {
                            *self = <$ty>::try_from(i).map_err(|_| AssignError::OutOfRange {
                                value: i.to_string(),
                                target: stringify!($ty),
                            })?;
                            Ok(())
                        }
                        other => Err(mismatch(ScalarKind::Int, &other)),
                    }
                }
            }
        )*
    };
}

int_field!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl Field for isize {
    fn kind() -> FieldKind {
        FieldKind::Scalar(ScalarKind::Int)
    }

    fn materialize() -> Self {
        0
    }

    fn get(&self) -> FieldRef<'_> {
        FieldRef::Scalar(Scalar::Int(*self as i128))
    }

    fn set(&mut self, value: Scalar) -> Result<(), AssignError> {
        match value {
            Scalar::Int(i) => {
                *self = isize::try_from(i).map_err(|_| AssignError::OutOfRange {
                    value: i.to_string(),
                    target: "isize",
                })?;
                Ok(())
            }
            other => Err(mismatch(ScalarKind::Int, &other)),
        }
    }
}

impl Field for usize {
    fn kind() -> FieldKind {
        FieldKind::Scalar(ScalarKind::Int)
    }

    fn materialize() -> Self {
        0
    }

    fn get(&self) -> FieldRef<'_> {
        FieldRef::Scalar(Scalar::Int(*self as i128))
    }

    fn set(&mut self, value: Scalar) -> Result<(), AssignError> {
        match value {
            Scalar::Int(i) => {
                *self = usize::try_from(i).map_err(|_| AssignError::OutOfRange {
                    value: i.to_string(),
                    target: "usize",
                })?;
                Ok(())
            }
            other => Err(mismatch(ScalarKind::Int, &other)),
        }
    }
}

impl<T: Record> Field for Box<T> {
    fn kind() -> FieldKind {
        FieldKind::Nested {
            shape: T::shape,
            optional: false,
        }
    }

    fn materialize() -> Self {
        Box::new(T::materialize())
    }

    fn get(&self) -> FieldRef<'_> {
        FieldRef::Nested(Some(&**self))
    }

    fn nested_mut(&mut self) -> Option<&mut dyn Record> {
        Some(&mut **self)
    }
}

impl<T: Record> Field for Option<T> {
    fn kind() -> FieldKind {
        FieldKind::Nested {
            shape: T::shape,
            optional: true,
        }
    }

    fn materialize() -> Self {
        Some(T::materialize())
    }

    fn get(&self) -> FieldRef<'_> {
        FieldRef::Nested(self.as_ref().map(|r| r as &dyn Record))
    }

    fn nested_mut(&mut self) -> Option<&mut dyn Record> {
        Some(self.get_or_insert_with(T::materialize))
    }
}

fn mismatch(expected: ScalarKind, got: &Scalar) -> AssignError {
    AssignError::KindMismatch {
        expected,
        got: got.kind(),
    }
}
