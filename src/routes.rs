// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{ads, comments, favorites},
    state::AppState,
    utils::jwt::{auth_middleware, optional_auth_middleware},
};

/// Room for the text fields and multipart framing on top of the picture.
const FORM_OVERHEAD: usize = 1024 * 1024;

/// Request body cap for a given picture limit.
fn body_limit_for(max_upload_limit: usize) -> usize {
    max_upload_limit.saturating_add(FORM_OVERHEAD)
}

/// Assembles the main application router.
///
/// * Merges all sub-routers (ads, comments).
/// * Applies global middleware (Trace, CORS, body limit).
/// * Injects global state (services and config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // Oversized pictures must still reach the upload validator so the
    // client gets a field error rather than a bare 413.
    let body_limit = DefaultBodyLimit::max(body_limit_for(state.config.max_upload_limit));

    let ad_routes = Router::new()
        .route("/", get(ads::list_ads))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ))
        .route("/form", get(ads::form_scaffold))
        .route("/{id}", get(ads::get_ad))
        .route("/{id}/picture", get(ads::stream_picture))
        // Protected ad routes
        .merge(
            Router::new()
                .route("/", post(ads::create_ad))
                .route("/{id}", put(ads::update_ad).delete(ads::delete_ad))
                .route("/{id}/comments", post(comments::create_comment))
                .route(
                    "/{id}/favorite",
                    post(favorites::add_favorite).delete(favorites::remove_favorite),
                )
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let comment_routes = Router::new()
        .route("/{id}", delete(comments::delete_comment))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/ads", ad_routes)
        .nest("/api/comments", comment_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(body_limit),
        )
        .with_state(state)
}
