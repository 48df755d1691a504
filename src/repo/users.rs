//! User lookups and profile updates.

use std::sync::Arc;

use serde_json::json;

use super::{USERS, to_row};
use crate::store::{Filter, Select, Store, StoreError};

#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn Store>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        let query = Select::from(USERS).filter(Filter::eq("id", id)).limit(1);
        Ok(!self.store.select(&query).await?.is_empty())
    }

    /// Overwrites the bio. An unknown id updates nothing and still succeeds.
    pub async fn update_bio(&self, id: i64, bio: &str) -> Result<(), StoreError> {
        let patch = to_row(&json!({ "bio": bio }))?;
        self.store.update(USERS, patch, &[Filter::eq("id", id)]).await
    }

    /// Cheapest round trip that proves the store is reachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.select(&Select::from(USERS).limit(1)).await.map(drop)
    }
}
