//! List query parameters

use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Order {
    #[default]
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl Order {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("order must be ASC or DESC, got '{0}'")]
pub struct ParseOrderError(pub String);

impl FromStr for Order {
    type Err = ParseOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASC" => Ok(Order::Asc),
            "DESC" => Ok(Order::Desc),
            other => Err(ParseOrderError(other.to_string())),
        }
    }
}

/// Predicates, pagination and ordering for one list request.
///
/// `model` is a sparse prototype: attributes holding a present value
/// (non-empty text, positive number) become filters, the rest are ignored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters<T> {
    pub model: T,
    pub limit: usize,
    pub offset: usize,
    pub sort_by: String,
    pub order: Order,
}

impl<T: Record> Filters<T> {
    /// First page of `limit` records sorted ascending by the type's default
    /// attribute
    pub fn new(model: T, limit: usize) -> Self {
        Self {
            model,
            limit,
            offset: 0,
            sort_by: T::DEFAULT_SORT.to_string(),
            order: Order::Asc,
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn sorted_by(mut self, sort_by: impl Into<String>, order: Order) -> Self {
        self.sort_by = sort_by.into();
        self.order = order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Book;

    #[test]
    fn test_order_parsing_is_exact() {
        assert_eq!("ASC".parse::<Order>(), Ok(Order::Asc));
        assert_eq!("DESC".parse::<Order>(), Ok(Order::Desc));
        assert!("asc".parse::<Order>().is_err());
        assert!("RANDOM".parse::<Order>().is_err());
    }

    #[test]
    fn test_metadata_shape() {
        let filters = Filters::new(Book::default(), 10).sorted_by("price", Order::Desc);
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json["sortBy"], "price");
        assert_eq!(json["order"], "DESC");
        assert_eq!(json["limit"], 10);
        assert_eq!(json["offset"], 0);
    }
}
