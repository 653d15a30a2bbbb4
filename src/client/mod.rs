//! REST client for the fleet backend.

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::auth::{CredentialStore, CurrentSession, Session};
use crate::errors::AppError;
use crate::models::{BackendPagination, LoginRequest, LoginResponse, PaginationInfo, Robot, RobotStats, User};
use crate::query::{build_query_string, ResourceQuery, RobotQueryParams, UserQueryParams};

/// Backend list response: `{data, pagination?, count?}`.
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    pagination: Option<BackendPagination>,
}

/// One page of table rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage<T> {
    pub rows: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
}

/// Robots page plus the counters derived from it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotsPage {
    pub robots: Vec<Robot>,
    pub stats: RobotStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
}

/// Error body the backend sends with non-success statuses.
#[derive(Debug, Default, Deserialize)]
struct BackendErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the fleet REST backend.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Send with the session's backend token attached and map failure statuses.
    async fn send(
        &self,
        request: RequestBuilder,
        session: Option<&CurrentSession>,
    ) -> Result<Response, AppError> {
        let request = match session {
            Some(current) => request.bearer_auth(current.token()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: BackendErrorBody = response.json().await.unwrap_or_default();
        let message = body
            .message
            .or(body.error)
            .unwrap_or_else(|| format!("HTTP {}: {}", status.as_u16(), status.canonical_reason().unwrap_or("")));

        if status == StatusCode::UNAUTHORIZED {
            if let Some(current) = session {
                tracing::warn!(user = %current.session.user.email, "Backend rejected the session, signing out");
                self.credentials.clear(&current.id);
            }
            return Err(AppError::Unauthorized(message));
        }

        Err(AppError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    /// `GET <endpoint>?<translated params>` for any table resource.
    pub async fn list<Q, T>(&self, params: &Q, session: &CurrentSession) -> Result<ListPage<T>, AppError>
    where
        Q: ResourceQuery,
        T: DeserializeOwned,
    {
        let endpoint = Q::RESOURCE.endpoint();
        let query = build_query_string(&params.to_backend_query());
        let url = if query.is_empty() {
            self.url(endpoint)
        } else {
            format!("{}?{}", self.url(endpoint), query)
        };

        tracing::debug!(%url, "Fetching table page");

        let response = self.send(self.http.get(&url), Some(session)).await?;
        let body: ListResponse<T> = response.json().await?;

        Ok(ListPage {
            rows: body.data,
            pagination: body.pagination.map(PaginationInfo::from),
        })
    }

    pub async fn robots(
        &self,
        params: &RobotQueryParams,
        session: &CurrentSession,
    ) -> Result<RobotsPage, AppError> {
        let page: ListPage<Robot> = self.list(params, session).await?;
        let total = page.pagination.map(|p| p.total);

        Ok(RobotsPage {
            stats: RobotStats::from_robots(&page.rows, total),
            robots: page.rows,
            pagination: page.pagination,
        })
    }

    pub async fn users(
        &self,
        params: &UserQueryParams,
        session: &CurrentSession,
    ) -> Result<ListPage<User>, AppError> {
        self.list(params, session).await
    }

    /// Fleet-wide counters from an unfiltered robots listing.
    pub async fn robot_stats(&self, session: &CurrentSession) -> Result<RobotStats, AppError> {
        let response = self
            .send(self.http.get(self.url("/robots")), Some(session))
            .await?;
        let body: ListResponse<Robot> = response.json().await?;
        Ok(RobotStats::from_robots(&body.data, None))
    }

    /// Sign in against the backend.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Session, AppError> {
        let response = self
            .send(self.http.post(self.url("/users/auth")).json(credentials), None)
            .await?;
        let body: LoginResponse = response.json().await?;

        match body.data {
            Some(data) if body.success => Ok(Session {
                token: data.token,
                user: data.user,
            }),
            _ => Err(AppError::BadRequest(
                body.message
                    .or(body.error)
                    .unwrap_or_else(|| "Authentication failed".to_string()),
            )),
        }
    }
}
