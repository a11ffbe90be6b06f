//! Book catalogue service

use crate::error::{internal, StoreResult};
use crate::storage::{ResponseCache, Store};
use bookshelf_types::{Book, Filters};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Records loaded into an empty catalogue on startup
pub fn seed_catalogue() -> Vec<Book> {
    vec![
        Book::new("QM", "Bohr", 10.99),
        Book::new("QFT", "Dirac", 11.99),
        Book::new("GR", "Einstein", 12.99),
    ]
}

pub struct BookService {
    store: Arc<dyn Store<Book>>,
    cache: Arc<ResponseCache>,
}

/// Book ids are integers, so "01" and "1" name the same record and must
/// share one cache entry
fn cache_key(id: &str) -> String {
    match id.parse::<i64>() {
        Ok(n) => format!("book:{}", n),
        Err(_) => format!("book:{}", id),
    }
}

impl BookService {
    pub fn new(store: Arc<dyn Store<Book>>, cache: Arc<ResponseCache>) -> Self {
        Self { store, cache }
    }

    pub async fn init(&self) -> StoreResult<()> {
        self.store.initialize().await
    }

    pub async fn close(&self) {
        self.store.close().await;
    }

    /// Run the store query on its own task and wait for its single result.
    ///
    /// Dropping the returned future does not cancel the query: the spawned
    /// task always runs to completion and its result is discarded.
    pub async fn list(&self, filters: Filters<Book>) -> StoreResult<Vec<Book>> {
        let (tx, rx) = oneshot::channel();
        let store = self.store.clone();

        tokio::spawn(async move {
            let result = store.get_all(&filters).await;
            let _ = tx.send(result);
        });

        rx.await.map_err(internal("waiting for book query"))?
    }

    /// Cached lookup, falling back to the store on a miss
    pub async fn get(&self, id: &str) -> StoreResult<Book> {
        let key = cache_key(id);
        if let Some(book) = self.cache.get_json::<Book>(&key) {
            debug!("Cache hit for {}", key);
            return Ok(book);
        }

        let book = self.store.get(id).await?;
        if let Err(e) = self.cache.set_json(key, &book) {
            warn!("Failed to cache book {}: {}", id, e);
        }
        Ok(book)
    }

    pub async fn create(&self, book: Book) -> StoreResult<Book> {
        let created = self.store.insert("", book).await?;
        info!("Created book {} ({})", created.id, created.title);
        Ok(created)
    }

    pub async fn update(&self, id: &str, fields: &Map<String, Value>) -> StoreResult<()> {
        self.store.update(id, fields).await?;
        self.cache.invalidate(&cache_key(id));
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(id).await?;
        self.cache.invalidate(&cache_key(id));
        info!("Deleted book {}", id);
        Ok(())
    }
}
