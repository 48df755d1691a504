//! Profile edits.

use http::StatusCode;
use serde::Deserialize;

use crate::error::ApiError;
use crate::request::Request;
use crate::state::AppState;

use super::id_param;

#[derive(Debug, Deserialize)]
struct BioUpdate {
    #[serde(default)]
    bio: String,
}

/// `POST /user/{id}/bio`
///
/// Unlike every other mutating route this one does not check the caller's
/// identity.
// TODO: require `Authorization` to match `{id}` once clients send it here.
pub async fn update_bio(state: AppState, req: Request) -> Result<StatusCode, ApiError> {
    let user_id = id_param(&req, "id", "user")?;
    let update: BioUpdate = req.json()?;
    state.repos.users.update_bio(user_id, &update.bio).await?;
    Ok(StatusCode::NO_CONTENT)
}
