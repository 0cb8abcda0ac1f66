//! Scalar value codecs.
//!
//! Every leaf field of a record has one of four [`ScalarKind`]s. A [`ValueCodec`]
//! turns a single CSV cell into a [`Scalar`] of its kind and back. Which string
//! actually reaches the codec is decided by [`effective_raw`], the one place the
//! fallback order lives:
//!
//! 1. the cell, when the column exists and the cell is non-empty;
//! 2. the field's declared default, when non-empty;
//! 3. the kind's zero literal (`""`, `"0"`, `"0"`, `"false"`).

use std::fmt;
use thiserror::Error;

/// The primitive kinds a leaf field can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Int,
    Float,
    Bool,
}

impl ScalarKind {
    /// The literal substituted for an empty cell when no default applies.
    #[must_use]
    pub const fn zero_literal(self) -> &'static str {
        match self {
            Self::String => "",
            Self::Int | Self::Float => "0",
            Self::Bool => "false",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        })
    }
}

/// A decoded cell.
///
/// Integers are widened to `i128` so every supported integer type, signed or not,
/// round-trips through one variant; the field narrows on assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    String(String),
    Int(i128),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::String(_) => ScalarKind::String,
            Self::Int(_) => ScalarKind::Int,
            Self::Float(_) => ScalarKind::Float,
            Self::Bool(_) => ScalarKind::Bool,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A cell that is not a valid literal of the codec's kind.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot parse {raw:?} as {kind}: {reason}")]
pub struct DecodeError {
    pub kind: ScalarKind,
    pub raw: String,
    pub reason: String,
}

/// String conversion for one [`ScalarKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueCodec {
    kind: ScalarKind,
}

impl ValueCodec {
    #[must_use]
    pub const fn new(kind: ScalarKind) -> Self {
        Self { kind }
    }

    #[must_use]
    pub const fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Decode one cell. An empty string decodes as the kind's zero literal.
    ///
    /// # Errors
    /// Returns [`DecodeError`] when a non-empty `raw` is not a literal of this kind.
    pub fn decode(&self, raw: &str) -> Result<Scalar, DecodeError> {
        let raw = if raw.is_empty() {
            self.kind.zero_literal()
        } else {
            raw
        };
        let fail = |reason: String| DecodeError {
            kind: self.kind,
            raw: raw.to_string(),
            reason,
        };
        match self.kind {
            ScalarKind::String => Ok(Scalar::String(raw.to_string())),
            ScalarKind::Int => raw
                .parse::<i128>()
                .map(Scalar::Int)
                .map_err(|e| fail(e.to_string())),
            ScalarKind::Float => raw
                .parse::<f64>()
                .map(Scalar::Float)
                .map_err(|e| fail(e.to_string())),
            ScalarKind::Bool => parse_bool(raw)
                .map(Scalar::Bool)
                .ok_or_else(|| fail("invalid boolean literal".into())),
        }
    }

    /// Render a scalar with its natural `Display` form.
    #[must_use]
    pub fn encode(&self, value: &Scalar) -> String {
        value.to_string()
    }
}

/// Pick the string to decode for one leaf.
///
/// `cell` is `None` when the column is absent from the header (or the row is
/// shorter than the header). An empty default counts as no default.
#[must_use]
pub fn effective_raw<'a>(cell: Option<&'a str>, default: Option<&'a str>, kind: ScalarKind) -> &'a str {
    match cell {
        Some(v) if !v.is_empty() => v,
        _ => match default {
            Some(d) if !d.is_empty() => d,
            _ => kind.zero_literal(),
        },
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
