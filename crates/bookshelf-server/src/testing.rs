//! Shared test fixtures

use bookshelf_types::{Book, Column, Field, FieldKind, FieldValue, Record};
use serde::{Deserialize, Serialize};

/// The catalogue the server seeds on startup
pub fn seed_books() -> Vec<Book> {
    crate::services::books::seed_catalogue()
}

/// A record with a boolean attribute, which the filter engine cannot handle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gadget {
    pub id: i64,
    pub name: String,
    pub in_stock: bool,
}

static GADGET_FIELDS: &[Field<Gadget>] = &[
    Field {
        name: "id",
        kind: FieldKind::Integer,
        column: Column::PrimaryKey,
        get: |g| FieldValue::Integer(g.id),
    },
    Field {
        name: "name",
        kind: FieldKind::Text,
        column: Column::Plain,
        get: |g| FieldValue::Text(g.name.clone()),
    },
    Field {
        name: "in_stock",
        kind: FieldKind::Boolean,
        column: Column::Plain,
        get: |g| FieldValue::Boolean(g.in_stock),
    },
];

impl Record for Gadget {
    const TABLE: &'static str = "gadgets";
    const DEFAULT_SORT: &'static str = "name";

    fn fields() -> &'static [Field<Self>] {
        GADGET_FIELDS
    }
}
