//! Users table endpoints.

use axum::{
    extract::{RawQuery, State},
    response::{Redirect, Response},
    Extension, Json,
};
use serde::Serialize;

use super::{commit_change, current_location, success, ApiResult};
use crate::auth::CurrentSession;
use crate::errors::AppError;
use crate::location::{LocationState, ParamsChange};
use crate::models::User;
use crate::query::{CacheKey, Resource, ResourceQuery, UserQueryParams};
use crate::table::{DataTable, TablePhase, TableView, USER_COLUMNS};
use crate::AppState;

/// Users table as rendered for one location.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersView {
    pub location: LocationState,
    pub params: UserQueryParams,
    pub has_active_filters: bool,
    pub cache_key: CacheKey,
    pub phase: TablePhase,
    pub table: TableView<User>,
}

/// GET /configure/user - Users table for the location in the URL.
pub async fn get_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    RawQuery(query): RawQuery,
) -> ApiResult<UsersView> {
    let location = current_location(query);
    let params: UserQueryParams = location.read_params();
    let cache_key = CacheKey::for_params(&params);

    let client = &state.client;
    let request = &params;
    let session = &current;
    let result = state
        .users_cache
        .get_or_fetch(&cache_key, move || client.users(request, session))
        .await;

    let phase = TablePhase::Idle
        .mount()
        .resolve(result.as_ref().map(|p| p.rows.len()).map_err(AppError::message));

    let (rows, pagination, empty_message) = match result {
        Ok(page) => (page.rows, page.pagination, "No users found.".to_string()),
        Err(AppError::Unauthorized(message)) => return Err(AppError::Unauthorized(message)),
        Err(e) => {
            tracing::error!(key = %cache_key, "Failed to load users: {}", e);
            (Vec::new(), None, format!("Failed to load users: {}", e.message()))
        }
    };

    let table = DataTable::new(USER_COLUMNS, rows)
        .loading(phase.is_loading())
        .pagination(pagination)
        .sorting(params.sort_by(), params.sort_order())
        .empty_message(empty_message)
        .into_view();

    success(UsersView {
        has_active_filters: params.has_active_filters(),
        location,
        params,
        cache_key,
        phase,
        table,
    })
}

/// POST /configure/user/params - Commit a parameter change to the users location.
pub async fn update_user_params(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    Json(change): Json<ParamsChange>,
) -> Response {
    let current = current_location(query);
    commit_change::<UserQueryParams>(state.navigator.as_ref(), &current, &change)
}

/// POST /configure/user/clear - Drop every users filter, keeping paging and sort.
pub async fn clear_user_filters(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Response {
    let current = current_location(query);
    let change = ParamsChange::clear_filters(&current);
    commit_change::<UserQueryParams>(state.navigator.as_ref(), &current, &change)
}

/// POST /configure/user/retry - Drop the cached page and reload the same location.
pub async fn retry_users(State(state): State<AppState>, RawQuery(query): RawQuery) -> Redirect {
    let location = current_location(query);
    let params: UserQueryParams = location.read_params();
    let cache_key = CacheKey::for_params(&params);

    state.users_cache.remove(&cache_key).await;
    tracing::info!(key = %cache_key, "Retrying users table");

    Redirect::to(&location.href(Resource::Users.route()))
}
