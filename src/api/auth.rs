//! Sign-in endpoints.

use axum::{extract::State, http::header, response::IntoResponse, Extension, Json};
use serde::Serialize;

use super::{success, ApiResponse, ApiResult};
use crate::auth::{
    expired_session_cookie, new_session_id, session_cookie, CurrentSession, Session,
};
use crate::errors::AppError;
use crate::models::{LoginRequest, User};
use crate::query::Resource;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedIn {
    pub session_id: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOut {
    pub signed_out: bool,
}

/// Cached pages were fetched under another session.
async fn invalidate_tables(state: &AppState) {
    state.robots_cache.invalidate(Resource::Robots).await;
    state.users_cache.invalidate(Resource::Users).await;
}

/// POST /auth/login - Sign in against the backend and open a session.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let session = state.client.login(&request).await?;
    let id = new_session_id();
    state.credentials.set(id.clone(), session.clone());
    invalidate_tables(&state).await;
    tracing::info!(user = %session.user.email, "Signed in");

    Ok((
        [(header::SET_COOKIE, session_cookie(&id))],
        ApiResponse::new(SignedIn {
            session_id: id,
            user: session.user,
        }),
    ))
}

/// POST /auth/logout - Close the caller's session.
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> impl IntoResponse {
    state.credentials.clear(&current.id);
    invalidate_tables(&state).await;
    tracing::info!(user = %current.session.user.email, "Signed out");

    (
        [(header::SET_COOKIE, expired_session_cookie())],
        ApiResponse::new(SignedOut { signed_out: true }),
    )
}

/// GET /auth/session - The signed-in user.
pub async fn get_session(Extension(current): Extension<CurrentSession>) -> ApiResult<Session> {
    success(current.session)
}
