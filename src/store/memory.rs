//! In-process store.
//!
//! Behaves like the data API closely enough for the handlers not to notice:
//! ids and `created_at` are assigned on insert, embedded relations are joined
//! by foreign key, and key-set upserts merge into the conflicting row.
//! Missing key columns compare equal to each other, like a
//! `NULLS NOT DISTINCT` unique constraint.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Filter, Row, Select, Store, StoreError};

#[derive(Default)]
struct Table {
    rows: Vec<Row>,
    last_id: i64,
}

#[derive(Default)]
struct Tables {
    by_name: HashMap<&'static str, Table>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing, so insertion order and `created_at` order agree.
    fn stamp(&mut self) -> String {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// A [`Store`] backed by in-memory tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads rows verbatim, keeping their ids. Later inserts continue after
    /// the highest id seen.
    pub async fn seed(&self, table: &'static str, rows: impl IntoIterator<Item = Row>) {
        let mut tables = self.tables.write().await;
        let table = tables.by_name.entry(table).or_default();
        for row in rows {
            if let Some(id) = row.get("id").and_then(Value::as_i64) {
                table.last_id = table.last_id.max(id);
            }
            table.rows.push(row);
        }
    }

    /// A snapshot of every row in `table`, in insertion order.
    pub async fn rows(&self, table: &'static str) -> Vec<Row> {
        let tables = self.tables.read().await;
        tables.by_name.get(table).map(|t| t.rows.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().await;
        let Some(table) = tables.by_name.get(query.table) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<Row> = table.rows.iter()
            .filter(|row| matches_all(row, &query.filters))
            .cloned()
            .collect();

        if let Some(order) = query.order {
            rows.sort_by(|a, b| {
                let ord = compare(a.get(order.column), b.get(order.column));
                if order.descending { ord.reverse() } else { ord }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        if let Some(embed) = query.embed {
            let related = tables.by_name.get(embed.relation);
            for row in &mut rows {
                let key = row.get(embed.foreign_key).cloned().unwrap_or(Value::Null);
                let joined = related
                    .and_then(|t| t.rows.iter().find(|r| r.get("id") == Some(&key)))
                    .map(|r| Value::Object(r.clone()))
                    .unwrap_or(Value::Null);
                row.insert(embed.relation.to_owned(), joined);
            }
        }

        Ok(rows)
    }

    async fn insert(
        &self,
        table: &'static str,
        row: Row,
        on_conflict: Option<&[&str]>,
    ) -> Result<Row, StoreError> {
        let mut tables = self.tables.write().await;

        if let Some(keys) = on_conflict {
            let existing = tables.by_name.get_mut(table).and_then(|t| {
                t.rows.iter_mut().find(|r| {
                    keys.iter().all(|k| r.get(*k).unwrap_or(&Value::Null) == row.get(*k).unwrap_or(&Value::Null))
                })
            });
            if let Some(existing) = existing {
                existing.extend(row);
                return Ok(existing.clone());
            }
        }

        let created_at = tables.stamp();
        let table = tables.by_name.entry(table).or_default();

        let mut row = row;
        match row.get("id").and_then(Value::as_i64) {
            Some(id) => table.last_id = table.last_id.max(id),
            None => {
                table.last_id += 1;
                row.insert("id".to_owned(), Value::from(table.last_id));
            }
        }
        row.entry("created_at").or_insert(Value::String(created_at));

        table.rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &'static str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(table) = tables.by_name.get_mut(table) {
            for row in table.rows.iter_mut().filter(|r| matches_all(r, filters)) {
                row.extend(patch.clone());
            }
        }
        Ok(())
    }
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| row.get(f.column).unwrap_or(&Value::Null) == &f.value)
}

/// Postgres ordering: NULL sorts above every value.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
