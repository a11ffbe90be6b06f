//! Bookshelf Server
//!
//! Book catalogue and user registry over HTTP. Books persist in SQLite,
//! users live in memory for the life of the process, and every request
//! passes a token-bucket rate limiter first.

mod config;
mod error;
mod filter;
mod handlers;
mod rate_limit;
mod routes;
mod services;
mod storage;
#[cfg(test)]
mod testing;
mod validation;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::ServerConfig;
use rate_limit::RateLimiter;
use services::{
    books::seed_catalogue, users::seed_directory, BookService, FleetService, UserService,
};
use storage::{RelationalStore, ResponseCache, VolatileStore};

/// `database_path` value selecting a private in-memory SQLite database
const IN_MEMORY_DATABASE: &str = ":memory:";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub books: Arc<BookService>,
    pub users: Arc<UserService>,
    pub fleet: Arc<FleetService>,
    pub limiter: Arc<RateLimiter>,
}

#[tokio::main]
async fn main() {
    install_panic_hook();

    // Initialize tracing, RUST_LOG overrides the default level
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Bookshelf Server v{}", env!("CARGO_PKG_VERSION"));
    info!("PID: {}", std::process::id());

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

/// Log panics to stderr and through tracing
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());

        eprintln!("[PANIC] {} at {}", payload, location);
        error!(%location, "panic: {}", payload);
    }));
}

async fn run_server() -> Result<()> {
    info!("Loading configuration...");
    let config = ServerConfig::load().context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, db={}, rate_limit={}/{}ms",
        config.bind_address,
        config.database_path,
        config.rate_limit_capacity,
        config.rate_limit_interval_ms
    );

    // Book catalogue in SQLite, fronted by the in-memory response cache
    let cache = Arc::new(ResponseCache::new(config.cache_ttl()));
    let book_store = if config.database_path == IN_MEMORY_DATABASE {
        warn!("Using an in-memory database, books will not survive a restart");
        RelationalStore::in_memory(seed_catalogue())
            .context("Failed to create in-memory database")?
    } else {
        RelationalStore::open(&config.database_path, seed_catalogue())
    };
    let books = Arc::new(BookService::new(Arc::new(book_store), cache));
    books
        .init()
        .await
        .context("Failed to initialize book store")?;
    info!("Book store initialized at: {}", config.database_path);

    let users = Arc::new(UserService::new(Arc::new(VolatileStore::with_seed(
        seed_directory(),
    ))));
    users
        .init()
        .await
        .context("Failed to initialize user store")?;
    info!("User store initialized");

    let state = AppState {
        books: books.clone(),
        users: users.clone(),
        fleet: Arc::new(FleetService::new()),
        limiter: Arc::new(RateLimiter::new(
            config.rate_limit_capacity,
            config.rate_limit_interval(),
        )),
    };

    info!("Building HTTP router...");
    let app = routes::router(state);

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Server ready to accept connections");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down, closing stores");
    books.close().await;
    users.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
