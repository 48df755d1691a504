//! PostgREST (Supabase) implementation of [`Store`].
//!
//! Wire format, for reference:
//!
//! ```text
//! GET   /rest/v1/tweets?select=*,users(*)&user_id=eq.10&order=created_at.desc&limit=10
//! POST  /rest/v1/user_tweet_interactions?on_conflict=user_id,tweet_id,comment_id
//!       Prefer: return=representation,resolution=merge-duplicates
//! PATCH /rest/v1/users?id=eq.3
//!       Prefer: return=minimal
//! ```

use std::time::Duration;

use async_trait::async_trait;
use http::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;

use super::{Filter, Row, Select, Store, StoreError};
use crate::error::Error;

/// A [`Store`] that speaks to a PostgREST endpoint over HTTP.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    rest: Url,
}

impl PostgrestStore {
    /// Builds the gateway for `url` (the project root, without `/rest/v1`).
    ///
    /// Every call made through it is bounded by `timeout`.
    pub fn new(url: &str, key: &str, timeout: Duration) -> Result<Self, Error> {
        let rest = Url::parse(&format!("{}/rest/v1/", url.trim_end_matches('/')))
            .map_err(|e| Error::Config(format!("invalid store url `{url}`: {e}")))?;

        let mut headers = HeaderMap::new();
        let apikey = HeaderValue::from_str(key)
            .map_err(|_| Error::Config("store key is not a valid header value".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| Error::Config("store key is not a valid header value".into()))?;
        headers.insert("apikey", apikey);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build store client: {e}")))?;

        Ok(Self { client, rest })
    }

    fn endpoint(&self, table: &str) -> Result<Url, StoreError> {
        self.rest.join(table).map_err(|e| StoreError::Upstream {
            status: 0,
            message: format!("invalid table `{table}`: {e}"),
        })
    }

    async fn send(&self, req: RequestBuilder) -> Result<String, StoreError> {
        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(StoreError::Upstream {
                status: status.as_u16(),
                message: upstream_message(status, &text),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl Store for PostgrestStore {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError> {
        let mut url = self.endpoint(query.table)?;
        {
            let mut pairs = url.query_pairs_mut();
            let columns = match query.embed {
                Some(embed) => format!("*,{}(*)", embed.relation),
                None => "*".to_owned(),
            };
            pairs.append_pair("select", &columns);
            append_filters(&mut pairs, &query.filters);
            if let Some(order) = query.order {
                let dir = if order.descending { "desc" } else { "asc" };
                pairs.append_pair("order", &format!("{}.{dir}", order.column));
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }

        let text = self.send(self.client.get(url)).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn insert(
        &self,
        table: &'static str,
        row: Row,
        on_conflict: Option<&[&str]>,
    ) -> Result<Row, StoreError> {
        let mut url = self.endpoint(table)?;
        let mut prefer = String::from("return=representation");
        if let Some(keys) = on_conflict {
            url.query_pairs_mut().append_pair("on_conflict", &keys.join(","));
            prefer.push_str(",resolution=merge-duplicates");
        }

        let req = self.client.post(url).header("Prefer", prefer).json(&row);
        let text = self.send(req).await?;
        single_row(&text)
    }

    async fn update(
        &self,
        table: &'static str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<(), StoreError> {
        let mut url = self.endpoint(table)?;
        append_filters(&mut url.query_pairs_mut(), filters);

        let req = self.client.patch(url).header("Prefer", "return=minimal").json(&patch);
        self.send(req).await.map(drop)
    }
}

type Pairs<'a> = url::form_urlencoded::Serializer<'a, url::UrlQuery<'a>>;

fn append_filters(pairs: &mut Pairs<'_>, filters: &[Filter]) {
    for filter in filters {
        pairs.append_pair(filter.column, &filter_value(&filter.value));
    }
}

/// `eq.<value>`, or `is.null` for a null value.
pub(crate) fn filter_value(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_owned(),
        Value::String(s) => format!("eq.{s}"),
        other => format!("eq.{other}"),
    }
}

/// Inserted rows come back as a one-element array. A bodiless success (some
/// proxies strip the representation) yields an empty row.
fn single_row(text: &str) -> Result<Row, StoreError> {
    if text.trim().is_empty() {
        return Ok(Row::new());
    }
    match serde_json::from_str::<Value>(text)? {
        Value::Array(rows) if rows.len() == 1 => match rows.into_iter().next() {
            Some(Value::Object(row)) => Ok(row),
            _ => Err(StoreError::RowCount(0)),
        },
        Value::Array(rows) => Err(StoreError::RowCount(rows.len())),
        Value::Object(row) => Ok(row),
        _ => Err(StoreError::RowCount(0)),
    }
}

/// `(code) message` from a PostgREST error body, else the raw text.
fn upstream_message(status: reqwest::StatusCode, text: &str) -> String {
    if let Ok(Value::Object(body)) = serde_json::from_str::<Value>(text) {
        let message = body.get("message").and_then(Value::as_str);
        let code = body.get("code").and_then(Value::as_str);
        match (code, message) {
            (Some(code), Some(message)) => return format!("({code}) {message}"),
            (None, Some(message)) => return message.to_owned(),
            _ => {}
        }
    }
    if text.trim().is_empty() {
        status.to_string()
    } else {
        text.to_owned()
    }
}
