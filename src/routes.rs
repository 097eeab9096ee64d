use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::api::{blog, destinations, health, packages};
use crate::state::AppState;

/// Builds the axum router with all catalog routes and shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        .route(
            "/api/destinations",
            get(destinations::list_destinations_handler)
                .post(destinations::create_destination_handler),
        )
        .route(
            "/api/destinations/{id}",
            get(destinations::get_destination_handler),
        )
        .route(
            "/api/packages",
            get(packages::list_packages_handler).post(packages::create_package_handler),
        )
        .route("/api/packages/{id}", get(packages::get_package_handler))
        .route(
            "/api/blog",
            get(blog::list_posts_handler).post(blog::create_post_handler),
        )
        .route("/api/blog/{slug}", get(blog::get_post_handler))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
