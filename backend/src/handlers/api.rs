//! Read-only JSON API.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{
        employee_request::EmployeeRequest,
        request::{RequestStatus, RequestType},
    },
    services::RequestStats,
    state::AppState,
    types::RequestId,
    utils::time::format_local_date,
};

/// One row of `/api/requests`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ApiRequestSummary {
    #[schema(value_type = i64)]
    pub id: RequestId,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub employee: String,
    pub status: RequestStatus,
    /// Submission date, `YYYY-MM-DD`.
    pub date: String,
}

impl ApiRequestSummary {
    pub fn from_request(request: &EmployeeRequest, tz: &chrono_tz::Tz) -> Self {
        Self {
            id: request.id,
            request_type: request.request_type(),
            employee: request.employee_name.clone(),
            status: request.status,
            date: format_local_date(request.submitted_at, tz),
        }
    }
}

pub async fn list_requests(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApiRequestSummary>>, AppError> {
    let requests = state.queries().all().await?;
    let tz = state.config.time_zone;
    Ok(Json(
        requests
            .iter()
            .map(|request| ApiRequestSummary::from_request(request, &tz))
            .collect(),
    ))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<RequestStats>, AppError> {
    Ok(Json(state.queries().stats().await?))
}
