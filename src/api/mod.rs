use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::{Config, ServerConfig};
use crate::services::image::IMAGES_ROUTE;
use crate::services::{AuthService, CommentService, PasswordResetService, RecipeService};
use crate::state::SharedState;

pub mod auth;
mod comments;
mod error;
mod observability;
mod password_reset;
pub mod rate_limit;
mod recipes;
mod types;
mod validation;

pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub reset_limiter: Arc<RateLimiter>,

    /// Persistent session backend; `None` keeps sessions in memory.
    pub session_store: Option<SqliteStore>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn reset_service(&self) -> &Arc<dyn PasswordResetService> {
        &self.shared.reset_service
    }

    #[must_use]
    pub fn recipe_service(&self) -> &Arc<dyn RecipeService> {
        &self.shared.recipe_service
    }

    #[must_use]
    pub fn comment_service(&self) -> &Arc<dyn CommentService> {
        &self.shared.comment_service
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let reset_limiter = Arc::new(RateLimiter::for_password_reset(&shared.config.security));

    let session_store = if shared.config.server.persistent_sessions {
        let pool = shared.store.conn.get_sqlite_connection_pool().clone();
        let store = SqliteStore::new(pool);
        store
            .migrate()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to prepare session table: {e}"))?;
        Some(store)
    } else {
        None
    };

    Ok(Arc::new(AppState {
        shared,
        reset_limiter,
        session_store,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

fn session_layer<S>(store: S, server: &ServerConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_secure(server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_inactivity_minutes,
        )))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let config = state.config();
    let uploads_path = config.general.uploads_path.clone();
    let cors_origins = config.server.cors_allowed_origins.clone();
    let metrics_enabled = config.observability.metrics_enabled;

    let api_routes = Router::new()
        .merge(create_protected_router())
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .merge(create_reset_router(state.clone()))
        .route(
            "/password-reset/{token}",
            get(password_reset::token_status).post(password_reset::consume_reset),
        )
        .route(
            "/recipes",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route("/recipes/search", get(recipes::search_recipes))
        .route(
            "/recipes/{id}",
            get(recipes::get_recipe)
                .put(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route("/recipes/{id}/ingredients", post(recipes::add_ingredient))
        .route(
            "/recipes/{id}/comments",
            get(comments::list_comments)
                .post(comments::post_comment)
                .delete(comments::delete_comments),
        )
        .route("/admin/latest-recipe", get(recipes::latest_recipe))
        .route("/health", get(observability::health));

    // Target of the mailed reset link.
    let link_routes = Router::new().route(
        "/reset/{token}",
        get(password_reset::token_status).post(password_reset::consume_reset),
    );

    let site_routes = Router::new().nest("/api", api_routes).merge(link_routes);

    let site_router = match state.session_store.clone() {
        Some(store) => site_routes.layer(session_layer(store, &config.server)),
        None => site_routes.layer(session_layer(MemoryStore::default(), &config.server)),
    }
    .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    let mut app = site_router.nest_service(
        IMAGES_ROUTE,
        tower_http::services::ServeDir::new(uploads_path),
    );

    if metrics_enabled {
        app = app.route(
            "/metrics",
            get(observability::get_metrics).with_state(state.clone()),
        );
    }

    app.layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route_layer(middleware::from_fn(auth::auth_middleware))
}

fn create_reset_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/password-reset", post(password_reset::request_reset))
        .route_layer(middleware::from_fn_with_state(
            state,
            rate_limit::reset_rate_limit_middleware,
        ))
}
