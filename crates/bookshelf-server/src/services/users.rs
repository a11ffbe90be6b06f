//! User registration service

use crate::error::StoreResult;
use crate::storage::Store;
use bookshelf_types::User;
use std::sync::Arc;
use tracing::info;

/// Placeholder entries holding ids 0 to 2, present from startup
pub fn seed_directory() -> Vec<(String, User)> {
    (0..3).map(|i| (i.to_string(), User::default())).collect()
}

pub struct UserService {
    store: Arc<dyn Store<User>>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store<User>>) -> Self {
        Self { store }
    }

    pub async fn init(&self) -> StoreResult<()> {
        self.store.initialize().await
    }

    pub async fn close(&self) {
        self.store.close().await;
    }

    /// Store a new user under a freshly generated id and return the id
    pub async fn register(&self, user: User) -> StoreResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.store.insert(&id, user).await?;
        info!("Registered user {}", id);
        Ok(id)
    }

    pub async fn get(&self, id: &str) -> StoreResult<User> {
        self.store.get(id).await
    }
}
