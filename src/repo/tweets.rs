//! Tweets and the comments under them.

use std::sync::Arc;

use serde_json::json;

use super::{COMMENTS, TWEETS, decode, decode_all, exactly_one, to_row};
use crate::model::{Comment, CommentWithUser, Tweet, TweetWithUser};
use crate::store::{Embed, Filter, Order, Select, Store, StoreError};

/// Rows per feed page, global or per user.
pub const FEED_PAGE_SIZE: usize = 10;

#[derive(Clone)]
pub struct TweetRepository {
    store: Arc<dyn Store>,
}

impl TweetRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn feed() -> Select {
        Select::from(TWEETS)
            .embed(Embed::AUTHOR)
            .order(Order::desc("created_at"))
            .limit(FEED_PAGE_SIZE)
    }

    /// Newest tweets from everyone.
    pub async fn recent(&self) -> Result<Vec<TweetWithUser>, StoreError> {
        decode_all(self.store.select(&Self::feed()).await?)
    }

    /// Newest tweets by one author.
    pub async fn recent_by_user(&self, user_id: i64) -> Result<Vec<TweetWithUser>, StoreError> {
        let query = Self::feed().filter(Filter::eq("user_id", user_id));
        decode_all(self.store.select(&query).await?)
    }

    /// One tweet with its author. A missing tweet is a [`StoreError::RowCount`].
    pub async fn get(&self, id: i64) -> Result<TweetWithUser, StoreError> {
        let query = Select::from(TWEETS)
            .embed(Embed::AUTHOR)
            .filter(Filter::eq("id", id));
        decode(exactly_one(self.store.select(&query).await?)?)
    }

    pub async fn create(&self, user_id: i64, body: &str) -> Result<Tweet, StoreError> {
        let row = to_row(&json!({ "user_id": user_id, "body": body }))?;
        decode(self.store.insert(TWEETS, row, None).await?)
    }
}

#[derive(Clone)]
pub struct CommentRepository {
    store: Arc<dyn Store>,
}

impl CommentRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Every comment on a tweet, newest first. Not paginated.
    pub async fn for_tweet(&self, tweet_id: i64) -> Result<Vec<CommentWithUser>, StoreError> {
        let query = Select::from(COMMENTS)
            .embed(Embed::AUTHOR)
            .filter(Filter::eq("tweet_id", tweet_id))
            .order(Order::desc("created_at"));
        decode_all(self.store.select(&query).await?)
    }

    pub async fn create(&self, user_id: i64, tweet_id: i64, body: &str) -> Result<Comment, StoreError> {
        let row = to_row(&json!({ "user_id": user_id, "tweet_id": tweet_id, "body": body }))?;
        decode(self.store.insert(COMMENTS, row, None).await?)
    }
}
