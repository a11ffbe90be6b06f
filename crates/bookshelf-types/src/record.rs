//! Field descriptors for storable records
//!
//! Every storable type exposes a static table describing its attributes
//! (name, kind, column constraint, accessor). Stores and the filter engine
//! walk this table instead of inspecting the type at runtime.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use thiserror::Error;

/// Attribute type as seen by the stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Float,
    Integer,
    Boolean,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// Column constraint used when a relational backend creates the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Auto-incrementing integer key. Owned by the backend.
    PrimaryKey,
    Unique,
    /// Text column with a maximum length
    Sized(usize),
    Plain,
}

/// A single attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

impl FieldValue {
    /// Whether the value marks an active filter: non-empty text or a
    /// positive number. Booleans never do.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Float(f) => *f > 0.0,
            FieldValue::Integer(i) => *i > 0,
            FieldValue::Boolean(_) => false,
        }
    }

    /// Convert a JSON value into a value of the given kind.
    ///
    /// Integers are accepted for float fields; floats are not accepted for
    /// integer fields.
    pub fn from_json(kind: FieldKind, value: &Value) -> Option<Self> {
        match kind {
            FieldKind::Text => value.as_str().map(|s| FieldValue::Text(s.to_string())),
            FieldKind::Float => value.as_f64().map(FieldValue::Float),
            FieldKind::Integer => value.as_i64().map(FieldValue::Integer),
            FieldKind::Boolean => value.as_bool().map(FieldValue::Boolean),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::from(s.clone()),
            FieldValue::Float(f) => Value::from(*f),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Boolean(b) => Value::from(*b),
        }
    }

    /// Order two values of the same kind. Text compares byte-wise.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.partial_cmp(b),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            (FieldValue::Float(a), FieldValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (FieldValue::Integer(a), FieldValue::Float(b)) => (*a as f64).partial_cmp(b),
            _ => None,
        }
    }
}

/// Static description of one attribute of `T`
#[derive(Debug)]
pub struct Field<T> {
    pub name: &'static str,
    pub kind: FieldKind,
    pub column: Column,
    pub get: fn(&T) -> FieldValue,
}

impl<T> Field<T> {
    /// Read this attribute from a record
    pub fn value(&self, record: &T) -> FieldValue {
        (self.get)(record)
    }

    pub fn is_primary_key(&self) -> bool {
        self.column == Column::PrimaryKey
    }
}

/// Errors raised while resolving field names and values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("unknown field '{0}'")]
    Unknown(String),

    #[error("field '{0}' is the primary key and cannot be changed")]
    PrimaryKey(String),

    #[error("field '{field}' expects a {expected} value")]
    TypeMismatch { field: String, expected: FieldKind },
}

/// A type that can live in a record store
///
/// The serde representation must use the descriptor names as keys: stores
/// rebuild records from rows and merge partial updates through JSON.
pub trait Record: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static {
    /// Table name for relational backends
    const TABLE: &'static str;

    /// Attribute used for ordering when a list request names none
    const DEFAULT_SORT: &'static str;

    /// The descriptor table, in column order
    fn fields() -> &'static [Field<Self>];

    fn field(name: &str) -> Option<&'static Field<Self>> {
        Self::fields().iter().find(|f| f.name == name)
    }

    fn primary_key() -> Option<&'static Field<Self>> {
        Self::fields().iter().find(|f| f.is_primary_key())
    }

    /// Resolve a partial update into typed values.
    ///
    /// Unknown names, the primary key and values of the wrong JSON type are
    /// rejected. The result follows the map's key order.
    fn resolve_updates(
        updates: &Map<String, Value>,
    ) -> Result<Vec<(&'static Field<Self>, FieldValue)>, FieldError> {
        updates
            .iter()
            .map(|(name, value)| {
                let field = Self::field(name).ok_or_else(|| FieldError::Unknown(name.clone()))?;
                if field.is_primary_key() {
                    return Err(FieldError::PrimaryKey(name.clone()));
                }
                let value = FieldValue::from_json(field.kind, value).ok_or_else(|| {
                    FieldError::TypeMismatch {
                        field: name.clone(),
                        expected: field.kind,
                    }
                })?;
                Ok((field, value))
            })
            .collect()
    }
}
