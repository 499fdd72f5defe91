use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{docs::ApiDoc, handlers, middleware, state::AppState};

pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route("/", get(handlers::pages::index))
        .route(
            "/new-request",
            get(handlers::pages::new_request_form).post(handlers::pages::submit_request),
        )
        .route("/my-requests", get(handlers::pages::my_requests))
        .route("/approve-requests", get(handlers::pages::approve_requests))
        .route("/approve/{id}", post(handlers::pages::approve))
        .route("/reject/{id}", post(handlers::pages::reject))
        .route("/dashboard", get(handlers::pages::dashboard));

    let api_routes = Router::new()
        .route("/api/requests", get(handlers::api::list_requests))
        .route("/api/stats", get(handlers::api::stats));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(page_routes)
        .merge(api_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(middleware::log_error_responses))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                        .allow_headers(Any)
                        .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
                ),
        )
        .with_state(state)
}
