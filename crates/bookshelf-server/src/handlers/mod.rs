//! HTTP handlers

pub mod books;
pub mod fleet;
pub mod health;
pub mod users;

pub use health::health;

use crate::error::ApiError;
use serde::Deserialize;

/// `?id=` query parameter shared by the by-id endpoints
#[derive(Debug, Deserialize)]
pub struct IdParam {
    pub id: Option<String>,
}

impl IdParam {
    pub fn require(self) -> Result<String, ApiError> {
        self.id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::BadRequest("missing 'id' query parameter".into()))
    }
}
