//! Book catalogue handlers

use super::IdParam;
use crate::error::ApiError;
use crate::validation::{validate_book, ListParams};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bookshelf_types::{Book, Filters};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub struct BookListResponse {
    data: Vec<Book>,
    metadata: Filters<Book>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<BookListResponse>, ApiError> {
    let filters = Filters::<Book>::try_from(params)?;
    let data = state.books.list(filters.clone()).await?;

    Ok(Json(BookListResponse {
        data,
        metadata: filters,
    }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, ApiError> {
    Ok(Json(state.books.get(&id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(mut book): Json<Book>,
) -> Result<(StatusCode, String), ApiError> {
    book.created_at = Utc::now().to_rfc3339();
    validate_book(&book)?;

    let created = state.books.create(book).await?;
    Ok((
        StatusCode::CREATED,
        format!(
            "{} created successfully with ID {}",
            created.title, created.id
        ),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Query(params): Query<IdParam>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<StatusCode, ApiError> {
    let id = params.require()?;
    state.books.update(&id, &fields).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    State(state): State<AppState>,
    Query(params): Query<IdParam>,
) -> Result<StatusCode, ApiError> {
    let id = params.require()?;
    state.books.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
