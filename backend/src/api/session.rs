//! Login, logout and session status.
//!
//! The logged-in username lives in the session under [`SESSION_KEY_USER`];
//! handlers receive the session as an extractor.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::logs::{log_info, log_warning};
use super::state::AppState;
use crate::auth::authenticate;
use crate::error::{ServerError, ServerResult};

pub(crate) const SESSION_KEY_USER: &str = "username";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub authenticated: bool,
    pub auth_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Username of the session, if logged in.
pub async fn current_user(session: &Session) -> Option<String> {
    session.get::<String>(SESSION_KEY_USER).await.ok().flatten()
}

fn session_error(e: tower_sessions::session::Error) -> ServerError {
    ServerError::Internal(format!("session store: {}", e))
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> ServerResult<Json<AuthStatus>> {
    let credential = authenticate(
        state.credentials.as_ref(),
        &request.username,
        &request.password,
        Utc::now(),
    )
    .inspect_err(|e| log_warning(format!("Login failed for '{}': {}", request.username.trim(), e)))?;

    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(SESSION_KEY_USER, credential.username.clone())
        .await
        .map_err(session_error)?;

    log_info(format!("🔑 {} logged in", credential.username));
    Ok(Json(AuthStatus {
        authenticated: true,
        auth_enabled: state.config.is_auth_enabled(),
        username: Some(credential.username),
    }))
}

pub async fn logout(State(state): State<AppState>, session: Session) -> ServerResult<Json<AuthStatus>> {
    if let Some(user) = current_user(&session).await {
        log_info(format!("{} logged out", user));
    }
    session.flush().await.map_err(session_error)?;

    Ok(Json(AuthStatus {
        authenticated: false,
        auth_enabled: state.config.is_auth_enabled(),
        username: None,
    }))
}

pub async fn status(State(state): State<AppState>, session: Session) -> Json<AuthStatus> {
    let username = current_user(&session).await;
    Json(AuthStatus {
        authenticated: username.is_some(),
        auth_enabled: state.config.is_auth_enabled(),
        username,
    })
}
