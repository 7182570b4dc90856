use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tower_sessions::Session;

use super::session::current_user;
use super::state::AppState;
use crate::error::ServerError;

/// Reject requests without a logged-in session when authentication is on.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    if !state.config.is_auth_enabled() {
        return Ok(next.run(request).await);
    }

    match current_user(&session).await {
        Some(_) => Ok(next.run(request).await),
        None => Err(ServerError::Unauthorized),
    }
}
