//! Request validation and list parameter parsing

use crate::error::ApiError;
use bookshelf_types::{Book, Filters, Order, User, AUTHOR_MAX_LEN};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_LIMIT: usize = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.0)
    }
}

fn invalid(message: impl Into<String>) -> ValidationError {
    ValidationError(message.into())
}

pub fn validate_user(user: &User) -> Result<(), ValidationError> {
    if user.name.chars().count() < 3 {
        return Err(invalid("name must be at least 3 characters"));
    }
    if !user.email.contains('@') {
        return Err(invalid("email must contain '@'"));
    }
    if user.age <= 21 {
        return Err(invalid("age must be greater than 21"));
    }
    Ok(())
}

pub fn validate_book(book: &Book) -> Result<(), ValidationError> {
    if book.title.is_empty() {
        return Err(invalid("title is required"));
    }
    if book.author.chars().count() > AUTHOR_MAX_LEN {
        return Err(invalid(format!(
            "author must be at most {} characters",
            AUTHOR_MAX_LEN
        )));
    }
    if book.price.is_nan() || book.price < 0.0 {
        return Err(invalid("price must be >= 0"));
    }
    Ok(())
}

/// Query string of `GET /api/v1/books`, kept as raw strings so that every
/// parse failure gets a readable message
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub price: Option<String>,
}

impl TryFrom<ListParams> for Filters<Book> {
    type Error = ValidationError;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        let limit = match params.limit.as_deref() {
            None => DEFAULT_LIMIT,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(invalid("'limit' query parameter must be a number > 0")),
            },
        };

        let offset = match params.offset.as_deref() {
            None => 0,
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| invalid("'offset' query parameter must be a number >= 0"))?,
        };

        let order = match params.order.as_deref() {
            None => Order::Asc,
            Some(raw) => raw.parse::<Order>().map_err(|e| invalid(e.to_string()))?,
        };

        let price = match params.price.as_deref() {
            None => 0.0,
            Some(raw) => match raw.parse::<f64>() {
                Ok(p) if p >= 0.0 => p,
                _ => {
                    return Err(invalid(
                        "'price' query parameter must be a number >= 0",
                    ))
                }
            },
        };

        let model = Book {
            title: params.title.unwrap_or_default(),
            author: params.author.unwrap_or_default(),
            price,
            ..Book::default()
        };

        let mut filters = Filters::new(model, limit).with_offset(offset);
        filters.order = order;
        if let Some(sort_by) = params.sort_by.filter(|s| !s.is_empty()) {
            filters.sort_by = sort_by;
        }
        Ok(filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, email: &str, age: i64) -> User {
        User {
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    #[test]
    fn test_validate_user() {
        let cases = [
            (user("John", "john@work.com", 35), true),
            (user("Jo", "jo@work.com", 35), false),
            (user("John", "john.work.com", 35), false),
            (user("John", "john@work.com", 21), false),
            (user("Ann", "a@b", 22), true),
        ];

        for (u, ok) in cases {
            assert_eq!(validate_user(&u).is_ok(), ok, "{:?}", u);
        }
    }

    #[test]
    fn test_validate_book() {
        assert!(validate_book(&Book::new("QM", "Bohr", 10.99)).is_ok());
        assert!(validate_book(&Book::new("", "Bohr", 10.99)).is_err());
        assert!(validate_book(&Book::new("QM", "Bohr", -1.0)).is_err());
        assert!(validate_book(&Book::new("QM", "Bohr", f64::NAN)).is_err());

        let long_author = "x".repeat(AUTHOR_MAX_LEN + 1);
        assert!(validate_book(&Book::new("QM", &long_author, 1.0)).is_err());
    }

    #[test]
    fn test_list_defaults() {
        let filters = Filters::<Book>::try_from(ListParams::default()).unwrap();
        assert_eq!(filters.limit, 10);
        assert_eq!(filters.offset, 0);
        assert_eq!(filters.sort_by, "title");
        assert_eq!(filters.order, Order::Asc);
        assert_eq!(filters.model, Book::default());
    }

    #[test]
    fn test_list_params_parsed() {
        let params = ListParams {
            limit: Some("5".into()),
            offset: Some("2".into()),
            sort_by: Some("price".into()),
            order: Some("DESC".into()),
            title: Some("q".into()),
            author: None,
            price: Some("11.5".into()),
        };

        let filters = Filters::<Book>::try_from(params).unwrap();
        assert_eq!(filters.limit, 5);
        assert_eq!(filters.offset, 2);
        assert_eq!(filters.sort_by, "price");
        assert_eq!(filters.order, Order::Desc);
        assert_eq!(filters.model.title, "q");
        assert_eq!(filters.model.price, 11.5);
    }

    #[test]
    fn test_list_params_rejected() {
        let cases: [(fn(&mut ListParams), &str); 6] = [
            (|p| p.limit = Some("0".into()), "limit"),
            (|p| p.limit = Some("ten".into()), "limit"),
            (|p| p.offset = Some("-1".into()), "offset"),
            (|p| p.order = Some("asc".into()), "order"),
            (|p| p.price = Some("cheap".into()), "price"),
            (|p| p.price = Some("-3".into()), "price"),
        ];

        for (tweak, needle) in cases {
            let mut params = ListParams::default();
            tweak(&mut params);
            let err = Filters::<Book>::try_from(params).unwrap_err();
            assert!(err.0.contains(needle), "{} should mention {}", err, needle);
        }
    }
}
