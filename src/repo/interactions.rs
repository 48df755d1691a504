//! Like / save / restack flags.
//!
//! A flag is either true or it is not: "never set" and "removed" look the
//! same in the store. Setting always goes through a key-set upsert and
//! clearing always goes through an update, whether or not a row exists yet.

use std::sync::Arc;

use serde_json::Value;

use super::INTERACTIONS;
use crate::store::{Filter, Row, Store, StoreError};

/// The uniqueness constraint the store enforces on interaction rows.
pub const CONFLICT_KEYS: &[&str] = &["user_id", "tweet_id", "comment_id"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Like,
    Save,
    Restack,
}

impl Interaction {
    pub fn column(self) -> &'static str {
        match self {
            Self::Like => "is_liked",
            Self::Save => "is_saved",
            Self::Restack => "is_restacked",
        }
    }
}

/// What an interaction points at. Exactly one, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Tweet(i64),
    Comment(i64),
}

impl Target {
    pub fn column(self) -> &'static str {
        match self {
            Self::Tweet(_) => "tweet_id",
            Self::Comment(_) => "comment_id",
        }
    }

    pub fn id(self) -> i64 {
        match self {
            Self::Tweet(id) | Self::Comment(id) => id,
        }
    }
}

#[derive(Clone)]
pub struct InteractionRepository {
    store: Arc<dyn Store>,
}

impl InteractionRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Sets the flag. Repeating it is a no-op.
    pub async fn set_flag(
        &self,
        user_id: i64,
        target: Target,
        interaction: Interaction,
    ) -> Result<(), StoreError> {
        let mut row = Row::new();
        row.insert("user_id".to_owned(), Value::from(user_id));
        row.insert(target.column().to_owned(), Value::from(target.id()));
        row.insert(interaction.column().to_owned(), Value::Bool(true));

        self.store.insert(INTERACTIONS, row, Some(CONFLICT_KEYS)).await.map(drop)
    }

    /// Clears the flag on every matching row. No row, no error.
    pub async fn clear_flag(
        &self,
        user_id: i64,
        target: Target,
        interaction: Interaction,
    ) -> Result<(), StoreError> {
        let mut patch = Row::new();
        patch.insert(interaction.column().to_owned(), Value::Bool(false));
        let filters = [
            Filter::eq("user_id", user_id),
            Filter::eq(target.column(), target.id()),
        ];
        self.store.update(INTERACTIONS, patch, &filters).await
    }
}
