//! HTTP router

use crate::handlers;
use crate::rate_limit::limit_requests;
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    let limiter = state.limiter.clone();

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Book catalogue
        .nest("/api/v1", api_routes())
        // Users and fleet
        .route("/register", post(handlers::users::register))
        .route("/users", get(handlers::users::get))
        .route("/fleet", get(handlers::fleet::status))
        // Layers
        .layer(middleware::from_fn_with_state(limiter, limit_requests))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(handlers::books::list))
        .route("/book/:id", get(handlers::books::get))
        .route(
            "/book",
            post(handlers::books::create)
                .patch(handlers::books::update)
                .delete(handlers::books::delete),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::RateLimiter;
    use crate::services::{books::seed_catalogue, BookService, FleetService, UserService};
    use crate::storage::{RelationalStore, ResponseCache, VolatileStore};
    use anyhow::Result;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use bookshelf_types::{Book, User};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::assert_ok;
    use tower::ServiceExt;

    async fn app_with_capacity(capacity: u32) -> Result<Router> {
        let books = BookService::new(
            Arc::new(RelationalStore::in_memory(seed_catalogue())?),
            Arc::new(ResponseCache::new(Duration::from_secs(60))),
        );
        books.init().await?;
        let users = UserService::new(Arc::new(VolatileStore::<User>::new()));
        users.init().await?;

        Ok(router(AppState {
            books: Arc::new(books),
            users: Arc::new(users),
            fleet: Arc::new(FleetService::with_delay(Duration::from_millis(5))),
            limiter: Arc::new(RateLimiter::new(capacity, Duration::from_secs(3600))),
        }))
    }

    async fn app() -> Result<Router> {
        app_with_capacity(1000).await
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Result<Response> {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json)?)
            }
            None => Body::empty(),
        };
        Ok(app.clone().oneshot(request.body(body)?).await?)
    }

    async fn body_text(response: Response) -> Result<String> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    async fn body_json(response: Response) -> Result<Value> {
        Ok(serde_json::from_str(&body_text(response).await?)?)
    }

    #[tokio::test]
    async fn test_health() -> Result<()> {
        let app = app().await?;
        let response = send(&app, Method::GET, "/health", None).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await?, json!({ "status": "ok" }));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_books_sorted_with_metadata() -> Result<()> {
        let app = app().await?;
        let response = send(&app, Method::GET, "/api/v1/books?order=DESC&limit=2", None).await?;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await?;
        let titles: Vec<_> = body["data"]
            .as_array()
            .map(|books| books.iter().map(|b| b["title"].clone()).collect())
            .unwrap_or_default();
        assert_eq!(titles, vec![json!("QM"), json!("QFT")]);
        assert_eq!(body["metadata"]["limit"], 2);
        assert_eq!(body["metadata"]["sortBy"], "title");
        assert_eq!(body["metadata"]["order"], "DESC");
        Ok(())
    }

    #[tokio::test]
    async fn test_list_books_bad_params() -> Result<()> {
        let app = app().await?;
        for uri in [
            "/api/v1/books?limit=0",
            "/api/v1/books?order=up",
            "/api/v1/books?price=-1",
            "/api/v1/books?sortBy=isbn",
        ] {
            let response = send(&app, Method::GET, uri, None).await?;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_list_books_past_last_page() -> Result<()> {
        let app = app().await?;
        let response = send(
            &app,
            Method::GET,
            "/api/v1/books?offset=18446744073709551615",
            None,
        )
        .await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await?["data"], json!([]));
        Ok(())
    }

    #[tokio::test]
    async fn test_book_lifecycle() -> Result<()> {
        let app = app().await?;

        let response = send(
            &app,
            Method::POST,
            "/api/v1/book",
            Some(json!({ "title": "Dune", "author": "Herbert", "price": 9.5 })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_text(response).await?, "Dune created successfully with ID 4");

        let response = send(&app, Method::GET, "/api/v1/book/4", None).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let book: Book = serde_json::from_value(body_json(response).await?)?;
        assert_eq!(book.author, "Herbert");
        assert!(!book.created_at.is_empty());

        let response = send(
            &app,
            Method::PATCH,
            "/api/v1/book?id=4",
            Some(json!({ "price": 7.25 })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, Method::GET, "/api/v1/book/4", None).await?;
        assert_eq!(body_json(response).await?["price"], 7.25);

        let response = send(&app, Method::DELETE, "/api/v1/book?id=4", None).await?;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, Method::GET, "/api/v1/book/4", None).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await?["code"], "not_found");
        Ok(())
    }

    #[tokio::test]
    async fn test_book_errors() -> Result<()> {
        let app = app().await?;

        let duplicate = json!({ "title": "QM", "author": "Heisenberg", "price": 1.0 });
        let response = send(&app, Method::POST, "/api/v1/book", Some(duplicate)).await?;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let untitled = json!({ "author": "Nobody", "price": 1.0 });
        let response = send(&app, Method::POST, "/api/v1/book", Some(untitled)).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, Method::DELETE, "/api/v1/book", None).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, Method::DELETE, "/api/v1/book?id=42", None).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &app,
            Method::PATCH,
            "/api/v1/book?id=1",
            Some(json!({ "isbn": "123" })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_and_fetch_user() -> Result<()> {
        let app = app().await?;

        let response = send(
            &app,
            Method::POST,
            "/register",
            Some(json!({ "name": "John", "email": "john@work.com", "age": 35 })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await?;
        let id = text
            .strip_prefix("User ")
            .and_then(|rest| rest.strip_suffix(" created successfully"))
            .map(str::to_string);
        assert!(id.is_some(), "unexpected body: {}", text);
        let id = id.unwrap_or_default();

        let response = send(&app, Method::GET, &format!("/users?id={}", id), None).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await?;
        assert!(text.contains('\n'));
        let user: User = serde_json::from_str(&text)?;
        assert_eq!(user.email, "john@work.com");

        let response = send(&app, Method::GET, "/users?id=missing", None).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_user() -> Result<()> {
        let app = app().await?;
        let response = send(
            &app,
            Method::POST,
            "/register",
            Some(json!({ "name": "Jo", "email": "jo@work.com", "age": 35 })),
        )
        .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_fleet_status() -> Result<()> {
        let app = app().await?;
        let response = send(&app, Method::GET, "/fleet", None).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await?,
            json!({ "networking": true, "data_center": true, "kubernetes": false })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_rate_limit_returns_429() -> Result<()> {
        let app = app_with_capacity(1).await?;

        let first = send(&app, Method::GET, "/health", None).await;
        let first = assert_ok!(first);
        assert_eq!(first.status(), StatusCode::OK);

        let second = send(&app, Method::GET, "/health", None).await?;
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        Ok(())
    }
}
