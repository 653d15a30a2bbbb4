//! Fleet Dashboard Backend
//!
//! Backend-for-frontend for the robot fleet and user management tables. The
//! request URL is the table state; parameter changes are committed by
//! redirecting to the next location.

mod api;
mod auth;
mod cache;
mod client;
mod config;
mod errors;
mod location;
mod models;
mod query;
mod table;

use std::sync::Arc;

use axum::{
    http::Uri,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::{CredentialStore, MemoryCredentialStore};
use cache::{QueryCache, RetryPolicy};
use client::{BackendClient, ListPage, RobotsPage};
use config::Config;
use errors::AppError;
use location::{Navigator, RedirectNavigator};
use models::User;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: BackendClient,
    pub robots_cache: Arc<QueryCache<RobotsPage>>,
    pub users_cache: Arc<QueryCache<ListPage<User>>>,
    pub credentials: Arc<dyn CredentialStore>,
    pub navigator: Arc<dyn Navigator>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let credentials: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
        let client = BackendClient::new(&config.api_base_url, credentials.clone());

        let robots_cache = QueryCache::new(
            config.stale_time,
            config.gc_time,
            RetryPolicy::new(config.robot_retries),
        );
        let users_cache = QueryCache::new(
            config.stale_time,
            config.gc_time,
            RetryPolicy::new(config.user_retries),
        );

        Self {
            navigator: Arc::new(RedirectNavigator::new(config.max_url_len)),
            client,
            robots_cache: Arc::new(robots_cache),
            users_cache: Arc::new(users_cache),
            credentials,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Fleet Dashboard Backend");
    tracing::info!("Backend API: {}", config.api_base_url);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        "Cache: stale after {:?}, collected after {:?}",
        config.stale_time,
        config.gc_time
    );

    let state = AppState::new(&config);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let credentials = state.credentials.clone();

    // Signed-in routes
    let session_routes = Router::new()
        // Robots
        .route("/configure", get(api::get_robots))
        .route("/configure/params", post(api::update_robot_params))
        .route("/configure/clear", post(api::clear_robot_filters))
        .route("/configure/retry", post(api::retry_robots))
        .route("/configure/stats", get(api::get_robot_stats))
        // Users
        .route("/configure/user", get(api::get_users))
        .route("/configure/user/params", post(api::update_user_params))
        .route("/configure/user/clear", post(api::clear_user_filters))
        .route("/configure/user/retry", post(api::retry_users))
        // Session
        .route("/auth/logout", post(api::logout))
        .route("/auth/session", get(api::get_session))
        .layer(middleware::from_fn(move |req, next| {
            auth::require_session(credentials.clone(), req, next)
        }));

    let auth_routes = Router::new().route("/auth/login", post(api::login));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(session_routes)
        .merge(auth_routes)
        .merge(health_routes)
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
