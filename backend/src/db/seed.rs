//! Reference and sample data loaded at startup.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    models::{
        employee_request::{LeaveDetails, NewRequest, PurchaseDetails, RequestDetails},
        request::Priority,
    },
    repositories::{DepartmentRepository, RequestRepository, RequestRepositoryTrait},
    utils::time::today_local,
};

/// Seeds the department registry and, when enabled, the sample requests.
pub async fn seed(pool: &SqlitePool, config: &Config) -> Result<(), AppError> {
    let departments = DepartmentRepository::new().seed_defaults(pool).await?;
    if departments > 0 {
        tracing::info!(count = departments, "Seeded department registry");
    }

    if config.seed_sample_requests {
        let inserted = seed_sample_requests(pool, config).await?;
        if inserted > 0 {
            tracing::info!(count = inserted, "Seeded sample requests");
        }
    }
    Ok(())
}

/// Inserts one pending leave and one pending purchase request into an empty store.
pub async fn seed_sample_requests(pool: &SqlitePool, config: &Config) -> Result<usize, AppError> {
    let repo = RequestRepository::new();
    if repo.count(pool, None).await? > 0 {
        return Ok(0);
    }

    let today = today_local(&config.time_zone);
    let samples = [
        NewRequest {
            employee_name: "Jan Kowalski".to_string(),
            employee_email: "jan.kowalski@company.local".to_string(),
            department: Some("IT".to_string()),
            priority: Priority::Medium,
            details: RequestDetails::Leave(LeaveDetails::new(
                today + Duration::days(7),
                today + Duration::days(14),
                Some("Annual leave".to_string()),
            )),
        },
        NewRequest {
            employee_name: "Anna Nowak".to_string(),
            employee_email: "anna.nowak@company.local".to_string(),
            department: Some("HR".to_string()),
            priority: Priority::High,
            details: RequestDetails::Purchase(PurchaseDetails {
                item_description: "Laptop Dell XPS 15".to_string(),
                quantity: 1,
                estimated_cost: 5999.00,
                justification: Some("Replacing worn-out equipment".to_string()),
            }),
        },
    ];

    for sample in &samples {
        repo.insert(pool, sample, Utc::now()).await?;
    }
    Ok(samples.len())
}
