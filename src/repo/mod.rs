//! Typed repositories, one per entity.
//!
//! Table names, column names, page sizes and conflict key sets live here and
//! nowhere else. Every repository shares the same `Arc<dyn Store>`.

mod follows;
mod interactions;
mod tweets;
mod users;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::store::{Row, Store, StoreError};

pub use self::follows::FollowRepository;
pub use self::interactions::{Interaction, InteractionRepository, Target};
pub use self::tweets::{CommentRepository, FEED_PAGE_SIZE, TweetRepository};
pub use self::users::UserRepository;

pub(crate) const USERS: &str = "users";
pub(crate) const TWEETS: &str = "tweets";
pub(crate) const COMMENTS: &str = "comments";
pub(crate) const INTERACTIONS: &str = "user_tweet_interactions";
pub(crate) const FOLLOWS: &str = "user_following";

/// All repositories over one store.
#[derive(Clone)]
pub struct Repositories {
    pub users: UserRepository,
    pub tweets: TweetRepository,
    pub comments: CommentRepository,
    pub interactions: InteractionRepository,
    pub follows: FollowRepository,
}

impl Repositories {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            users: UserRepository::new(Arc::clone(&store)),
            tweets: TweetRepository::new(Arc::clone(&store)),
            comments: CommentRepository::new(Arc::clone(&store)),
            interactions: InteractionRepository::new(Arc::clone(&store)),
            follows: FollowRepository::new(store),
        }
    }
}

fn to_row<T: Serialize>(value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        // Every caller passes a struct or a json! object.
        other => Err(StoreError::Decode(serde::ser::Error::custom(format!(
            "expected an object, got {other}"
        )))),
    }
}

fn decode<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

fn decode_all<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(decode).collect()
}

/// The one row a single-row read must produce.
fn exactly_one(rows: Vec<Row>) -> Result<Row, StoreError> {
    let count = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), count) {
        (Some(row), 1) => Ok(row),
        _ => Err(StoreError::RowCount(count)),
    }
}
