//! API route table.
//!
//! | Method | Path | Auth |
//! |---|---|---|
//! | GET  | `/home` | none |
//! | GET  | `/user/{id}` | none |
//! | POST | `/user/{id}/bio` | none |
//! | GET  | `/tweet/{id}` | none |
//! | GET  | `/tweet/{id}/comments` | none |
//! | POST | `/tweet` | `Authorization` = author id |
//! | PUT  | `/like/{user}/{target}` | `Authorization` = `{user}` |
//! | PUT  | `/save/{user}/{target}` | `Authorization` = `{user}` |
//! | PUT  | `/restack/{user}/{target}` | `Authorization` = `{user}` |
//! | PUT  | `/follow/{user}/{target}` | `Authorization` = `{user}` |
//!
//! Plus `/healthz` and `/readyz`. Anything else is a bodiless 404.

mod feed;
mod interactions;
mod tweets;
mod users;

use crate::error::ApiError;
use crate::health;
use crate::request::Request;
use crate::router::Router;
use crate::state::AppState;

/// Build the complete API router over `state`.
pub fn router(state: AppState) -> Router<AppState> {
    Router::with_state(state)
        // Probes
        .get("/healthz", health::liveness::<AppState>)
        .get("/readyz", health::readiness)
        // Content
        .get("/home", feed::home)
        .get("/user/{id}", feed::by_user)
        .post("/tweet", tweets::create)
        .get("/tweet/{id}", tweets::get)
        .get("/tweet/{id}/comments", tweets::comments)
        // Profile
        .post("/user/{id}/bio", users::update_bio)
        // Interactions
        .put("/like/{user}/{target}", interactions::like)
        .put("/save/{user}/{target}", interactions::save)
        .put("/restack/{user}/{target}", interactions::restack)
        .put("/follow/{user}/{target}", interactions::follow)
}

/// A numeric path parameter; `invalid <what> id` otherwise.
fn id_param(req: &Request, name: &str, what: &str) -> Result<i64, ApiError> {
    req.param(name)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| ApiError::bad_request(format!("invalid {what} id")))
}
