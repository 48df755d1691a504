//! Like / save / restack / follow toggles.
//!
//! All four share one shape: `PUT /<kind>/{user}/{target}`, where the
//! caller must be `{user}`. The identity check runs before anything else is
//! validated, so a mismatch is always a 401.

use http::StatusCode;

use crate::auth::{AUTH_HEADER, Identity, Verdict};
use crate::error::ApiError;
use crate::repo::{Interaction, Target};
use crate::request::Request;
use crate::state::AppState;

use super::id_param;

/// Header telling a like whether `{target}` is a comment or a tweet.
pub const IS_COMMENT_HEADER: &str = "is-comment";

/// The caller, checked against the `{user}` segment.
fn authorize(state: &AppState, req: &Request) -> Result<Identity, ApiError> {
    let subject = req.param("user").unwrap_or_default();
    match state.auth.authorize(req.header(AUTH_HEADER), subject) {
        Verdict::Authorized(identity) => Ok(identity),
        Verdict::Unauthorized => Err(ApiError::unauthorized("unauthorized")),
    }
}

fn acting_user(identity: &Identity) -> Result<i64, ApiError> {
    identity.user_id().ok_or_else(|| ApiError::bad_request("invalid user id"))
}

/// `?remove=true` (any case) clears; anything else sets.
fn removing(req: &Request) -> bool {
    req.query("remove").is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

async fn toggle(
    state: &AppState,
    user_id: i64,
    target: Target,
    interaction: Interaction,
    remove: bool,
) -> Result<StatusCode, ApiError> {
    let ix = &state.repos.interactions;
    if remove {
        ix.clear_flag(user_id, target, interaction).await?;
    } else {
        ix.set_flag(user_id, target, interaction).await?;
    }
    tracing::debug!(user_id, ?target, ?interaction, remove, "interaction updated");
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /like/{user}/{target}` with `Is-Comment: true|false`.
pub async fn like(state: AppState, req: Request) -> Result<StatusCode, ApiError> {
    let identity = authorize(&state, &req)?;
    let is_comment = req
        .header(IS_COMMENT_HEADER)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing Is-Comment header"))?
        .eq_ignore_ascii_case("true");
    let user_id = acting_user(&identity)?;
    let target_id = id_param(&req, "target", "target")?;

    let target = if is_comment { Target::Comment(target_id) } else { Target::Tweet(target_id) };
    toggle(&state, user_id, target, Interaction::Like, removing(&req)).await
}

/// `PUT /save/{user}/{tweet}`. Saves always target a tweet.
pub async fn save(state: AppState, req: Request) -> Result<StatusCode, ApiError> {
    let identity = authorize(&state, &req)?;
    let user_id = acting_user(&identity)?;
    let tweet_id = id_param(&req, "target", "tweet")?;

    toggle(&state, user_id, Target::Tweet(tweet_id), Interaction::Save, removing(&req)).await
}

/// `PUT /restack/{user}/{tweet}`. Set only: there is no un-restack.
pub async fn restack(state: AppState, req: Request) -> Result<StatusCode, ApiError> {
    let identity = authorize(&state, &req)?;
    let user_id = acting_user(&identity)?;
    let tweet_id = id_param(&req, "target", "tweet")?;

    toggle(&state, user_id, Target::Tweet(tweet_id), Interaction::Restack, false).await
}

/// `PUT /follow/{user}/{followee}`. Set only: there is no unfollow.
pub async fn follow(state: AppState, req: Request) -> Result<StatusCode, ApiError> {
    let identity = authorize(&state, &req)?;
    let user_id = acting_user(&identity)?;
    let followee = id_param(&req, "target", "follow")?;

    state.repos.follows.follow(user_id, followee).await?;
    tracing::debug!(user_id, followee, "follow recorded");
    Ok(StatusCode::NO_CONTENT)
}
