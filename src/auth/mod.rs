//! Session handling.
//!
//! The backend issues a bearer token on sign-in. The dashboard keeps it in a
//! [`CredentialStore`] under a session id of its own and hands only that id
//! to the client, as a cookie and in the sign-in response. Every table
//! request is authenticated from its own id; the query pipeline never sees
//! the backend token.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::User;

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "fleet_session";

/// A signed-in user and their backend token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    #[serde(skip_serializing)]
    pub token: String,
    pub user: User,
}

/// The session a request was authenticated with.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub id: String,
    pub session: Session,
}

impl CurrentSession {
    pub fn token(&self) -> &str {
        &self.session.token
    }
}

/// Sessions by id.
pub trait CredentialStore: Send + Sync {
    fn get(&self, id: &str) -> Option<Session>;
    fn set(&self, id: String, session: Session);
    fn clear(&self, id: &str);
}

/// In-memory sessions of this process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, id: &str) -> Option<Session> {
        let sessions = match self.sessions.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions
            .iter()
            .find(|(known, _)| constant_time_compare(known, id))
            .map(|(_, session)| session.clone())
    }

    fn set(&self, id: String, session: Session) {
        let mut sessions = match self.sessions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions.insert(id, session);
    }

    fn clear(&self, id: &str) {
        let mut sessions = match self.sessions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions.remove(id);
    }
}

/// Fresh, unguessable session id.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// `Set-Cookie` value carrying `id`.
pub fn session_cookie(id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

/// `Set-Cookie` value that drops the session cookie.
pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Session id sent with a request: bearer token first, then the cookie.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Session layer for the signed-in routes.
///
/// Resolves the request's own session id and makes the session available
/// as a [`CurrentSession`] extension. Without one the request never reaches
/// the handler.
pub async fn require_session(
    credentials: Arc<dyn CredentialStore>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(id) = session_id(request.headers()) else {
        tracing::debug!(path = %request.uri().path(), "Rejecting request without a session");
        return AppError::Unauthorized("Sign in to continue".to_string()).into_response();
    };

    let Some(session) = credentials.get(&id) else {
        tracing::debug!(path = %request.uri().path(), "Rejecting unknown session");
        return AppError::Unauthorized("Session expired, sign in again".to_string()).into_response();
    };

    request.extensions_mut().insert(CurrentSession { id, session });
    next.run(request).await
}
