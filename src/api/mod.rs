mod handlers;
mod middleware;
pub mod views;

use axum::{
    extract::FromRef,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::db::Database;

pub use middleware::{AuthSession, RateLimiter};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub login_limiter: RateLimiter,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        let login_limiter = RateLimiter::new(config.login_rate_limit, config.login_rate_window())
            .trusting_proxy(config.trust_proxy);
        Self {
            db,
            config,
            login_limiter,
        }
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

/// Router with default configuration.
pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, Config::default())
}

pub fn create_router_with_config(db: Database, config: Config) -> Router {
    let state = AppState::new(db, config);

    let admin = Router::new()
        .route(
            "/admin/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/admin/users/{id}",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        .route_layer(from_fn(middleware::require_admin));

    let protected = Router::new()
        // Session
        .route("/auth/logout", post(handlers::logout))
        .route("/profile", get(handlers::get_profile).put(handlers::update_profile))
        .route("/members", get(handlers::list_members))
        // Dashboard
        .route("/dashboard", get(handlers::dashboard))
        // Challenges
        .route(
            "/challenges",
            get(handlers::list_challenges).post(handlers::create_challenge),
        )
        .route("/challenges/reorder", put(handlers::reorder_challenges))
        .route(
            "/challenges/{id}",
            get(handlers::get_challenge)
                .put(handlers::update_challenge)
                .delete(handlers::delete_challenge),
        )
        .route("/challenges/{id}/actions", post(handlers::create_action))
        .route(
            "/challenges/{id}/activities",
            get(handlers::list_activities).post(handlers::create_activity),
        )
        .route("/challenges/{id}/contacts", post(handlers::create_contact))
        // Actions
        .route("/actions", get(handlers::list_actions))
        .route(
            "/actions/{id}",
            put(handlers::update_action).delete(handlers::delete_action),
        )
        // Contacts
        .route(
            "/contacts/{id}",
            put(handlers::update_contact).delete(handlers::delete_contact),
        )
        .merge(admin)
        .route_layer(from_fn_with_state(state.db.clone(), middleware::require_auth));

    let login = Router::new()
        .route("/auth/login", post(handlers::login))
        .route_layer(from_fn_with_state(
            state.login_limiter.clone(),
            middleware::rate_limit_middleware,
        ));

    let api = Router::new()
        .route("/health", get(handlers::health))
        .merge(login)
        .merge(protected);

    let cors = cors_layer(&state.config);

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match o.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin: {}", o);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}
