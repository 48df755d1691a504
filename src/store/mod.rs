//! Store gateway: the data API as an opaque capability.
//!
//! Three primitives, parameterized by table, equality filters, ordering and
//! limit:
//!
//! | Primitive | Shape |
//! |---|---|
//! | [`Store::select`] | `select(table, filter, order, limit) -> rows` |
//! | [`Store::insert`] | `insert(table, row, on_conflict) -> row` |
//! | [`Store::update`] | `update(table, patch, filter) -> ()` |
//!
//! Handlers never talk to a `Store` directly; the typed repositories in
//! [`crate::repo`] own the table and column vocabulary.

mod memory;
mod postgrest;

use async_trait::async_trait;
use serde_json::Value;

pub use self::memory::MemoryStore;
pub use self::postgrest::PostgrestStore;

/// One row as the store returns it: column name → JSON value.
pub type Row = serde_json::Map<String, Value>;

/// Equality predicate on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self { column, value: value.into() }
    }
}

/// Sort on a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

impl Order {
    pub fn desc(column: &'static str) -> Self {
        Self { column, descending: true }
    }
}

/// A related table pulled into each selected row through a foreign key.
///
/// The related row (or `null`) lands under the relation's name, so selecting
/// tweets with [`Embed::AUTHOR`] yields `{ ..tweet, "users": { ..author } }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Embed {
    pub relation: &'static str,
    pub foreign_key: &'static str,
}

impl Embed {
    /// The `users` row referenced by `user_id`.
    pub const AUTHOR: Embed = Embed { relation: "users", foreign_key: "user_id" };
}

/// A read against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: &'static str,
    pub embed: Option<Embed>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Select {
    pub fn from(table: &'static str) -> Self {
        Self { table, embed: None, filters: Vec::new(), order: None, limit: None }
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embed = Some(embed);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A failed store call.
///
/// The handler layer does not distinguish these: all of them surface as a
/// `500` carrying this error's text.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport failure, including the per-call timeout.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The data API answered with a non-success status.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),

    /// A single-row read matched zero or several rows.
    #[error("JSON object requested, multiple (or no) rows returned ({0} rows)")]
    RowCount(usize),
}

/// The data API.
///
/// Implementations must be safe to share across concurrent requests; the
/// process builds one and hands out `Arc<dyn Store>` clones.
#[async_trait]
pub trait Store: Send + Sync {
    /// Rows matching every filter, optionally embedded, ordered and limited.
    async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError>;

    /// Inserts `row` and returns the stored representation, including
    /// store-assigned columns (`id`, `created_at`).
    ///
    /// With `on_conflict`, a row whose key columns all equal the new row's is
    /// merged into instead, making repeated inserts idempotent.
    async fn insert(
        &self,
        table: &'static str,
        row: Row,
        on_conflict: Option<&[&str]>,
    ) -> Result<Row, StoreError>;

    /// Applies `patch` to every row matching all filters. Matching nothing
    /// is not an error.
    async fn update(
        &self,
        table: &'static str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<(), StoreError>;
}
