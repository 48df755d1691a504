//! Entities as the data API returns them.
//!
//! Rows are read leniently: the store owns the schema, and a column the
//! handler layer never looks at may be absent without failing the request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A reply to exactly one tweet. Comments do not nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub user_id: i64,
    pub tweet_id: i64,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replies: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A tweet with its author embedded under `users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweetWithUser {
    #[serde(flatten)]
    pub tweet: Tweet,
    #[serde(rename = "users")]
    pub user: Option<User>,
}

/// A comment with its author embedded under `users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentWithUser {
    #[serde(flatten)]
    pub comment: Comment,
    #[serde(rename = "users")]
    pub user: Option<User>,
}

/// Per-user interaction flags on one tweet or one comment.
///
/// Exactly one of `tweet_id` / `comment_id` is set; callers guarantee it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTweetInteraction {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub tweet_id: Option<i64>,
    #[serde(default)]
    pub comment_id: Option<i64>,
    #[serde(default)]
    pub is_saved: bool,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_restacked: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Directed follow edge: `user_id` follows `following_user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Follow {
    pub user_id: i64,
    pub following_user_id: i64,
}
