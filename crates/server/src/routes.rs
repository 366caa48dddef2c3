use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::auth::domain::ROLE_ADMIN;

pub mod auth;
pub mod guard;
pub mod users;

use auth::ServerState;
use guard::{require_roles, RoleGuard};

pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// Build the full application router, including public, account and admin routes
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let signed_in = RoleGuard::authenticated(state.tokens.clone());
    let admin_only = RoleGuard::new(state.tokens.clone(), [ROLE_ADMIN]);

    // Public routes
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout));

    // Any signed-in user
    let account = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/profile", put(auth::update_profile))
        .route_layer(middleware::from_fn_with_state(signed_in, require_roles));

    // Admin routes
    let admin = Router::new()
        .route("/auth/users", get(users::list).post(users::create))
        .route("/auth/users/:id", put(users::update).delete(users::remove))
        .route_layer(middleware::from_fn_with_state(admin_only, require_roles));

    public
        .merge(account)
        .merge(admin)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
