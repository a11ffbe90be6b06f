//! User handlers

use super::IdParam;
use crate::error::{internal, ApiError};
use crate::validation::validate_user;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use bookshelf_types::User;

pub async fn register(
    State(state): State<AppState>,
    Json(user): Json<User>,
) -> Result<String, ApiError> {
    validate_user(&user)?;
    let id = state.users.register(user).await?;
    Ok(format!("User {} created successfully", id))
}

pub async fn get(
    State(state): State<AppState>,
    Query(params): Query<IdParam>,
) -> Result<impl IntoResponse, ApiError> {
    let id = params.require()?;
    let user = state.users.get(&id).await?;
    let body = serde_json::to_string_pretty(&user).map_err(internal("encoding user"))?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}
