//! User types

use crate::record::{Column, Field, FieldKind, FieldValue, Record};
use serde::{Deserialize, Serialize};

/// Registered user. The identifier is the store key, not an attribute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub name: String,
    pub email: String,
    pub age: i64,
}

static USER_FIELDS: &[Field<User>] = &[
    Field {
        name: "name",
        kind: FieldKind::Text,
        column: Column::Plain,
        get: |u| FieldValue::Text(u.name.clone()),
    },
    Field {
        name: "email",
        kind: FieldKind::Text,
        column: Column::Unique,
        get: |u| FieldValue::Text(u.email.clone()),
    },
    Field {
        name: "age",
        kind: FieldKind::Integer,
        column: Column::Plain,
        get: |u| FieldValue::Integer(u.age),
    },
];

impl Record for User {
    const TABLE: &'static str = "users";
    const DEFAULT_SORT: &'static str = "name";

    fn fields() -> &'static [Field<Self>] {
        USER_FIELDS
    }
}
