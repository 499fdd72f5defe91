//! Browser-facing routes. Each GET returns the view data its page renders;
//! form posts redirect back to a listing.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::{
        department::Department,
        employee_request::{DecisionForm, EmployeeRequest, NewRequestForm},
        request::{Priority, RequestStatus, RequestType},
    },
    repositories::{DepartmentRepository, Filter, RequestFilters},
    services::{DashboardBreakdowns, RequestStats},
    state::AppState,
    types::RequestId,
};

pub const MY_REQUESTS_PATH: &str = "/my-requests";
pub const APPROVE_REQUESTS_PATH: &str = "/approve-requests";

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub stats: RequestStats,
    pub recent_requests: Vec<EmployeeRequest>,
}

#[derive(Debug, Serialize)]
pub struct NewRequestView {
    pub departments: Vec<Department>,
    pub request_types: Vec<RequestType>,
    pub priorities: Vec<Priority>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestListQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub request_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RequestListView {
    pub requests: Vec<EmployeeRequest>,
    pub status_filter: String,
    pub type_filter: String,
}

#[derive(Debug, Serialize)]
pub struct ApprovalQueueView {
    pub requests: Vec<EmployeeRequest>,
}

fn filter_label<T: ToString>(filter: &Filter<T>) -> String {
    match filter.value() {
        Some(value) => value.to_string(),
        None => crate::repositories::FILTER_ALL.to_string(),
    }
}

pub async fn index(State(state): State<AppState>) -> Result<Json<HomeView>, AppError> {
    let queries = state.queries();
    let stats = queries.stats().await?;
    let recent_requests = queries.recent(state.config.recent_requests_limit).await?;
    Ok(Json(HomeView {
        stats,
        recent_requests,
    }))
}

pub async fn new_request_form(
    State(state): State<AppState>,
) -> Result<Json<NewRequestView>, AppError> {
    let departments = DepartmentRepository::new().list_all(&state.pool).await?;
    Ok(Json(NewRequestView {
        departments,
        request_types: RequestType::ALL.to_vec(),
        priorities: Priority::ALL.to_vec(),
    }))
}

pub async fn submit_request(
    State(state): State<AppState>,
    Form(form): Form<NewRequestForm>,
) -> Result<Redirect, AppError> {
    state.lifecycle().submit(form).await?;
    Ok(Redirect::to(MY_REQUESTS_PATH))
}

pub async fn my_requests(
    State(state): State<AppState>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<RequestListView>, AppError> {
    let filters = RequestFilters {
        status: Filter::<RequestStatus>::parse(query.status.as_deref())
            .map_err(|err| AppError::BadRequest(err.to_string()))?,
        request_type: Filter::<RequestType>::parse(query.request_type.as_deref())
            .map_err(|err| AppError::BadRequest(err.to_string()))?,
    };
    let requests = state.queries().list(&filters).await?;
    Ok(Json(RequestListView {
        requests,
        status_filter: filter_label(&filters.status),
        type_filter: filter_label(&filters.request_type),
    }))
}

pub async fn approve_requests(
    State(state): State<AppState>,
) -> Result<Json<ApprovalQueueView>, AppError> {
    let requests = state.queries().pending().await?;
    Ok(Json(ApprovalQueueView { requests }))
}

pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<RequestId>,
    Form(form): Form<DecisionForm>,
) -> Result<Redirect, AppError> {
    state.lifecycle().approve(id, form).await?;
    Ok(Redirect::to(APPROVE_REQUESTS_PATH))
}

pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<RequestId>,
    Form(form): Form<DecisionForm>,
) -> Result<Redirect, AppError> {
    state.lifecycle().reject(id, form).await?;
    Ok(Redirect::to(APPROVE_REQUESTS_PATH))
}

pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardBreakdowns>, AppError> {
    let breakdowns = state.queries().breakdowns().await?;
    Ok(Json(breakdowns))
}
