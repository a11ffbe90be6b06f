//! In-memory record store
//!
//! Every operation, reads included, holds one exclusive lock for its whole
//! duration. Contents are lost when the process exits.

use super::Store;
use crate::error::{internal, StoreError, StoreResult};
use crate::filter;
use async_trait::async_trait;
use bookshelf_types::{Filters, Record};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

pub struct VolatileStore<T> {
    data: Mutex<BTreeMap<String, T>>,
    seed: Vec<(String, T)>,
}

impl<T: Record> VolatileStore<T> {
    /// Empty store
    pub fn new() -> Self {
        Self::with_seed(Vec::new())
    }

    /// Store that loads `seed` on initialization. Seed entries never
    /// overwrite records already present.
    pub fn with_seed(seed: Vec<(String, T)>) -> Self {
        Self {
            data: Mutex::new(BTreeMap::new()),
            seed,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, T>> {
        // A panic while holding the lock cannot leave the map half-written
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Record> Default for VolatileStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> Store<T> for VolatileStore<T> {
    async fn initialize(&self) -> StoreResult<()> {
        let mut data = self.lock();
        for (id, record) in &self.seed {
            data.entry(id.clone()).or_insert_with(|| record.clone());
        }
        info!("Volatile {} store ready with {} records", T::TABLE, data.len());
        Ok(())
    }

    async fn close(&self) {
        let mut data = self.lock();
        if !data.is_empty() {
            info!("Dropping {} volatile {} records", data.len(), T::TABLE);
        }
        data.clear();
    }

    async fn get(&self, id: &str) -> StoreResult<T> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("record {}", id)))
    }

    async fn get_all(&self, filters: &Filters<T>) -> StoreResult<Vec<T>> {
        let query = filter::build(filters)?;
        let data = self.lock();
        let records = query.apply(data.values());
        debug!("Matched {} of {} {} records", records.len(), data.len(), T::TABLE);
        Ok(records)
    }

    async fn insert(&self, id: &str, record: T) -> StoreResult<T> {
        let mut data = self.lock();
        if data.contains_key(id) {
            return Err(StoreError::AlreadyExists(format!("record {}", id)));
        }
        data.insert(id.to_string(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, fields: &Map<String, Value>) -> StoreResult<()> {
        let updates = T::resolve_updates(fields)?;

        let mut data = self.lock();
        let current = data
            .get(id)
            .ok_or_else(|| StoreError::NotFound(format!("record {}", id)))?;

        // Merge through JSON and swap the whole entry
        let mut merged = serde_json::to_value(current).map_err(internal("encoding record"))?;
        if let Value::Object(map) = &mut merged {
            for (field, value) in updates {
                map.insert(field.name.to_string(), value.to_json());
            }
        }
        let merged: T = serde_json::from_value(merged).map_err(internal("decoding record"))?;

        data.insert(id.to_string(), merged);
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("record {}", id)))
    }
}
