//! Feed reads: newest tweets, globally or per author.

use crate::error::ApiError;
use crate::model::TweetWithUser;
use crate::request::Request;
use crate::response::Json;
use crate::state::AppState;

use super::id_param;

/// `GET /home`
pub async fn home(state: AppState, _req: Request) -> Result<Json<Vec<TweetWithUser>>, ApiError> {
    let tweets = state.repos.tweets.recent().await?;
    tracing::debug!(count = tweets.len(), "home feed");
    Ok(Json(tweets))
}

/// `GET /user/{id}`. Public, no identity check.
pub async fn by_user(state: AppState, req: Request) -> Result<Json<Vec<TweetWithUser>>, ApiError> {
    let user_id = id_param(&req, "id", "user")?;
    let tweets = state.repos.tweets.recent_by_user(user_id).await?;
    tracing::debug!(user_id, count = tweets.len(), "user feed");
    Ok(Json(tweets))
}
