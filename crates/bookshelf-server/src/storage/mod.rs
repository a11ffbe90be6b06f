//! Storage layer
//!
//! One contract, two backends: `VolatileStore` keeps records in a
//! mutex-guarded map for the life of the process, `RelationalStore`
//! persists them in SQLite. `ResponseCache` is a TTL cache in front of
//! single-record reads (replaces Redis).

pub mod cache;
pub mod relational;
pub mod volatile;

pub use cache::ResponseCache;
pub use relational::RelationalStore;
pub use volatile::VolatileStore;

use crate::error::StoreResult;
use async_trait::async_trait;
use bookshelf_types::{Filters, Record};
use serde_json::{Map, Value};

/// Record store contract shared by every backend
#[async_trait]
pub trait Store<T: Record>: Send + Sync {
    /// Prepare the backend (connect, create schema, load seed records)
    async fn initialize(&self) -> StoreResult<()>;

    /// Release backend resources. Idempotent; errors are logged, not returned.
    async fn close(&self);

    async fn get(&self, id: &str) -> StoreResult<T>;

    /// One page of records matching `filters`, in the requested order
    async fn get_all(&self, filters: &Filters<T>) -> StoreResult<Vec<T>>;

    /// Store a record and return it as stored.
    ///
    /// Backends that generate identifiers ignore `id` and return the record
    /// carrying the assigned key.
    async fn insert(&self, id: &str, record: T) -> StoreResult<T>;

    /// Overwrite the named fields of an existing record
    async fn update(&self, id: &str, fields: &Map<String, Value>) -> StoreResult<()>;

    async fn delete(&self, id: &str) -> StoreResult<()>;
}
