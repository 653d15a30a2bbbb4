//! HTTP API module.
//!
//! Table routes render the view for the location in the request URL and
//! commit parameter changes by redirecting to the next location.

mod auth;
mod robots;
mod users;

pub use auth::*;
pub use robots::*;
pub use users::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::location::{LocationState, Navigator, ParamsChange, UrlStateSync};
use crate::query::{CacheKey, ResourceQuery};

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Location carried by the request URL.
fn current_location(query: Option<String>) -> LocationState {
    LocationState::parse(query.as_deref().unwrap_or(""))
}

/// Commit `change` onto `current` for the table of `Q`.
///
/// Navigates with `303 See Other`; if navigation fails the pre-navigation
/// location is returned as JSON instead.
fn commit_change<Q: ResourceQuery>(
    navigator: &dyn Navigator,
    current: &LocationState,
    change: &ParamsChange,
) -> Response {
    let sync = UrlStateSync::new(Q::RESOURCE, navigator);
    let commit = sync.commit(current, change, |next| {
        let params: Q = next.read_params();
        tracing::info!(
            resource = Q::RESOURCE.as_str(),
            key = %CacheKey::for_params(&params),
            filtered = params.has_active_filters(),
            "Table parameters changed"
        );
    });

    if commit.navigated {
        Redirect::to(&commit.href).into_response()
    } else {
        ApiResponse::new(commit).into_response()
    }
}
