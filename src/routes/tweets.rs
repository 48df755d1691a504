//! Tweet and comment reads, and content creation.

use serde::Deserialize;

use crate::auth::AUTH_HEADER;
use crate::error::ApiError;
use crate::model::{CommentWithUser, TweetWithUser};
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::state::AppState;

use super::id_param;

/// Header naming the tweet a new comment replies to.
pub const PARENT_TWEET_HEADER: &str = "parent-tweet-id";

#[derive(Debug, Deserialize)]
struct NewContent {
    #[serde(default)]
    body: String,
    #[serde(default)]
    is_comment: bool,
}

/// `GET /tweet/{id}`. A missing tweet is a 500, like any other store failure.
pub async fn get(state: AppState, req: Request) -> Result<Json<TweetWithUser>, ApiError> {
    let id = id_param(&req, "id", "tweet")?;
    Ok(Json(state.repos.tweets.get(id).await?))
}

/// `GET /tweet/{id}/comments`
pub async fn comments(state: AppState, req: Request) -> Result<Json<Vec<CommentWithUser>>, ApiError> {
    let tweet_id = id_param(&req, "id", "tweet")?;
    Ok(Json(state.repos.comments.for_tweet(tweet_id).await?))
}

/// `POST /tweet`
///
/// The author is whoever the `Authorization` header names. A comment also
/// needs a `Parent-Tweet-ID` header and an author that exists in the store;
/// an author lookup that fails for any reason is a 401.
pub async fn create(state: AppState, req: Request) -> Result<Response, ApiError> {
    let identity = state
        .auth
        .identify(req.header(AUTH_HEADER))
        .ok_or_else(|| ApiError::unauthorized("missing authorization"))?;
    let user_id = identity
        .user_id()
        .ok_or_else(|| ApiError::unauthorized("invalid authorization"))?;

    let content: NewContent = req.json()?;

    if !content.is_comment {
        let tweet = state.repos.tweets.create(user_id, &content.body).await?;
        tracing::info!(tweet_id = tweet.id, user_id, "tweet created");
        return Ok(Json(tweet).into_response());
    }

    let parent = req
        .header(PARENT_TWEET_HEADER)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing parent tweet id"))?;
    let parent_id: i64 = parent
        .parse()
        .map_err(|_| ApiError::bad_request("invalid parent tweet id"))?;

    match state.repos.users.exists(user_id).await {
        Ok(true) => {}
        Ok(false) => return Err(ApiError::unauthorized("unauthorized")),
        Err(e) => {
            tracing::warn!(user_id, error = %e, "author lookup failed");
            return Err(ApiError::unauthorized("unauthorized"));
        }
    }

    let comment = state.repos.comments.create(user_id, parent_id, &content.body).await?;
    tracing::info!(comment_id = comment.id, tweet_id = parent_id, user_id, "comment created");
    Ok(Json(comment).into_response())
}
