//! Book catalogue types

use crate::record::{Column, Field, FieldKind, FieldValue, Record};
use serde::{Deserialize, Serialize};

/// A catalogue entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub price: f64,
    /// RFC 3339 timestamp, stamped on creation
    pub created_at: String,
}

/// Longest author name the relational schema accepts
pub const AUTHOR_MAX_LEN: usize = 255;

static BOOK_FIELDS: &[Field<Book>] = &[
    Field {
        name: "id",
        kind: FieldKind::Integer,
        column: Column::PrimaryKey,
        get: |b| FieldValue::Integer(b.id),
    },
    Field {
        name: "title",
        kind: FieldKind::Text,
        column: Column::Unique,
        get: |b| FieldValue::Text(b.title.clone()),
    },
    Field {
        name: "author",
        kind: FieldKind::Text,
        column: Column::Sized(AUTHOR_MAX_LEN),
        get: |b| FieldValue::Text(b.author.clone()),
    },
    Field {
        name: "price",
        kind: FieldKind::Float,
        column: Column::Plain,
        get: |b| FieldValue::Float(b.price),
    },
    Field {
        name: "created_at",
        kind: FieldKind::Text,
        column: Column::Plain,
        get: |b| FieldValue::Text(b.created_at.clone()),
    },
];

impl Record for Book {
    const TABLE: &'static str = "books";
    const DEFAULT_SORT: &'static str = "title";

    fn fields() -> &'static [Field<Self>] {
        BOOK_FIELDS
    }
}

impl Book {
    pub fn new(title: impl Into<String>, author: impl Into<String>, price: f64) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            price,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let book: Book = serde_json::from_str(r#"{"title":"E-Myth","price":15.99}"#).unwrap();
        assert_eq!(book.id, 0);
        assert_eq!(book.title, "E-Myth");
        assert!(book.author.is_empty());
    }

    #[test]
    fn test_descriptor_table() {
        assert_eq!(Book::primary_key().map(|f| f.name), Some("id"));
        let book = Book::new("QM", "Bohr", 10.99);
        let title = Book::field("title").unwrap();
        assert_eq!(title.value(&book), FieldValue::Text("QM".into()));
        assert_eq!(title.column, Column::Unique);
    }
}
