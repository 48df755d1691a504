//! Follow edges between users.

use std::sync::Arc;

use super::{FOLLOWS, to_row};
use crate::model::Follow;
use crate::store::{Store, StoreError};

const CONFLICT_KEYS: &[&str] = &["user_id", "following_user_id"];

#[derive(Clone)]
pub struct FollowRepository {
    store: Arc<dyn Store>,
}

impl FollowRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Records that `user_id` follows `following_user_id`. Idempotent.
    /// Self-follows are not rejected here.
    pub async fn follow(&self, user_id: i64, following_user_id: i64) -> Result<(), StoreError> {
        let row = to_row(&Follow { user_id, following_user_id })?;
        self.store.insert(FOLLOWS, row, Some(CONFLICT_KEYS)).await.map(drop)
    }
}
