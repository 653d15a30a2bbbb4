//! Robots table endpoints.

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
use crate::models::{Robot, RobotStats};
use crate::query::{CacheKey, Resource, ResourceQuery, RobotQueryParams};
use crate::table::{DataTable, TablePhase, TableView, ROBOT_COLUMNS};
use crate::AppState;

/// Robots table as rendered for one location.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotsView {
    pub location: LocationState,
    pub params: RobotQueryParams,
    pub has_active_filters: bool,
    pub cache_key: CacheKey,
    pub phase: TablePhase,
    pub stats: RobotStats,
    pub table: TableView<Robot>,
}

/// GET /configure - Robots table for the location in the URL.
pub async fn get_robots(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    RawQuery(query): RawQuery,
) -> ApiResult<RobotsView> {
    let location = current_location(query);
    let params: RobotQueryParams = location.read_params();
    let cache_key = CacheKey::for_params(&params);

    tracing::debug!(
        key = %cache_key,
        charge = ?params.charge_range(),
        "Rendering robots table"
    );

    let client = &state.client;
    let request = &params;
    let session = &current;
    let result = state
        .robots_cache
        .get_or_fetch(&cache_key, move || client.robots(request, session))
        .await;

    let phase = TablePhase::Idle
        .mount()
        .resolve(result.as_ref().map(|p| p.robots.len()).map_err(AppError::message));

    let (rows, pagination, stats, empty_message) = match result {
        Ok(page) => (
            page.robots,
            page.pagination,
            page.stats,
            "No robots found.".to_string(),
        ),
        Err(AppError::Unauthorized(message)) => return Err(AppError::Unauthorized(message)),
        Err(e) => {
            tracing::error!(key = %cache_key, "Failed to load robots: {}", e);
            (
                Vec::new(),
                None,
                RobotStats::default(),
                format!("Failed to load robots: {}", e.message()),
            )
        }
    };

    let table = DataTable::new(ROBOT_COLUMNS, rows)
        .loading(phase.is_loading())
        .pagination(pagination)
        .sorting(params.sort_by(), params.sort_order())
        .empty_message(empty_message)
        .into_view();

    success(RobotsView {
        has_active_filters: params.has_active_filters(),
        location,
        params,
        cache_key,
        phase,
        stats,
        table,
    })
}

/// POST /configure/params - Commit a parameter change to the robots location.
pub async fn update_robot_params(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    Json(change): Json<ParamsChange>,
) -> Response {
    let current = current_location(query);
    commit_change::<RobotQueryParams>(state.navigator.as_ref(), &current, &change)
}

/// POST /configure/clear - Drop every robots filter, keeping paging and sort.
pub async fn clear_robot_filters(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Response {
    let current = current_location(query);
    let change = ParamsChange::clear_filters(&current);
    commit_change::<RobotQueryParams>(state.navigator.as_ref(), &current, &change)
}

/// GET /configure/stats - Fleet-wide robot counters.
pub async fn get_robot_stats(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> ApiResult<RobotStats> {
    let stats = state.client.robot_stats(&current).await?;
    success(stats)
}

/// POST /configure/retry - Drop the cached page and reload the same location.
pub async fn retry_robots(State(state): State<AppState>, RawQuery(query): RawQuery) -> Redirect {
    let location = current_location(query);
    let params: RobotQueryParams = location.read_params();
    let cache_key = CacheKey::for_params(&params);

    state.robots_cache.remove(&cache_key).await;
    tracing::info!(key = %cache_key, "Retrying robots table");

    Redirect::to(&location.href(Resource::Robots.route()))
}
