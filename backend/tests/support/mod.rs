#![allow(dead_code)]
use axum::{body::Body, http::Request, response::Response, Router};
use request_tracker_backend::{
    config::{Config, Environment},
    db::connection::{create_pool, run_migrations},
    models::employee_request::{EmployeeRequest, NewRequestForm},
    repositories::DepartmentRepository,
    routes::build_router,
    state::AppState,
};
use serde_json::Value;
use sqlx::SqlitePool;

pub fn test_config() -> Config {
    Config::for_environment(Environment::Testing)
}

/// Fresh in-memory database with the schema and the department registry.
pub async fn test_pool() -> SqlitePool {
    let pool = create_pool("sqlite::memory:", false)
        .await
        .expect("create in-memory pool");
    run_migrations(&pool).await.expect("run migrations");
    DepartmentRepository::new()
        .seed_defaults(&pool)
        .await
        .expect("seed departments");
    pool
}

pub fn test_state(pool: SqlitePool) -> AppState {
    AppState::new(pool, test_config(), None)
}

pub fn test_router(pool: SqlitePool) -> Router {
    build_router(test_state(pool))
}

pub fn leave_form(employee: &str, department: Option<&str>, start: &str, end: &str) -> NewRequestForm {
    NewRequestForm {
        request_type: Some("leave".into()),
        employee_name: Some(employee.into()),
        employee_email: Some(format!(
            "{}@company.local",
            employee.to_lowercase().replace(' ', ".")
        )),
        department: department.map(str::to_string),
        leave_start_date: Some(start.into()),
        leave_end_date: Some(end.into()),
        leave_reason: Some("Time off".into()),
        ..Default::default()
    }
}

pub fn purchase_form(employee: &str, department: Option<&str>, item: &str) -> NewRequestForm {
    NewRequestForm {
        request_type: Some("purchase".into()),
        employee_name: Some(employee.into()),
        employee_email: Some(format!(
            "{}@company.local",
            employee.to_lowercase().replace(' ', ".")
        )),
        department: department.map(str::to_string),
        item_description: Some(item.into()),
        quantity: Some("2".into()),
        estimated_cost: Some("250.50".into()),
        justification: Some("Needed for work".into()),
        ..Default::default()
    }
}

pub async fn submit(pool: &SqlitePool, form: NewRequestForm) -> EmployeeRequest {
    test_state(pool.clone())
        .lifecycle()
        .submit(form)
        .await
        .expect("submit request")
}

pub fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
