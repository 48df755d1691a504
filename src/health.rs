//! Health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can it reach the store? Failure → pulled from the load balancer. |

use http::StatusCode;

use crate::{AppState, Request, Response};

/// Liveness probe.
///
/// Always `200 OK` with body `"ok"`. If the process can answer HTTP at all,
/// it is alive, so this handler touches nothing.
pub async fn liveness<S>(_state: S, _req: Request) -> Response {
    Response::text("ok")
}

/// Readiness probe.
///
/// `200 OK` with body `"ready"` once a one-row read against the store
/// succeeds; `503` with the store's error text otherwise.
pub async fn readiness(state: AppState, _req: Request) -> Response {
    match state.repos.users.ping().await {
        Ok(()) => Response::text("ready"),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            Response::builder()
                .status(StatusCode::SERVICE_UNAVAILABLE)
                .text(e.to_string())
        }
    }
}
