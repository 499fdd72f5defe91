#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    handlers::api::ApiRequestSummary,
    models::request::{RequestStatus, RequestType},
    services::RequestStats,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Request Tracker API",
        description = "Leave and purchase requests: listing and aggregate counts"
    ),
    paths(list_requests_doc, stats_doc, health_doc),
    components(schemas(ApiRequestSummary, RequestStats, RequestStatus, RequestType)),
    tags(
        (name = "Requests", description = "Submitted requests"),
        (name = "System", description = "Liveness")
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/api/requests",
    responses((status = 200, description = "Every request in identifier order", body = [ApiRequestSummary])),
    tag = "Requests"
)]
fn list_requests_doc() {}

#[utoipa::path(
    get,
    path = "/api/stats",
    responses((status = 200, description = "Request counts by status", body = RequestStats)),
    tag = "Requests"
)]
fn stats_doc() {}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = serde_json::Value)),
    tag = "System"
)]
fn health_doc() {}
