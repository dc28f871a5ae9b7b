pub mod admin;
pub mod auth;
pub mod umkm;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::auth::{require_admin, require_session};
use crate::openapi::ApiDoc;
use self::auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router, including public, session, and admin routes
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    // Public routes (health + auth entry points)
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    // Session routes
    let session = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
        .route("/umkm", get(umkm::list).post(umkm::create))
        .route("/umkm/:id", get(umkm::get).put(umkm::update).delete(umkm::delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    // Admin routes: session first, then the role check
    let admin_routes = Router::new()
        .route("/admin/umkm", get(admin::list_umkm))
        .route("/admin/users", get(admin::list_users))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    // Compose
    public
        .merge(session)
        .merge(admin_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
