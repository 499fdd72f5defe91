//! Read paths behind the listings, the dashboard and the JSON API.

use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{employee_request::EmployeeRequest, request::RequestStatus},
    repositories::{Grouping, RequestFilters, RequestRepositoryTrait},
};

/// Label used for requests submitted without a department.
pub const NO_DEPARTMENT_LABEL: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct RequestStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DashboardBreakdowns {
    pub by_status: BTreeMap<String, i64>,
    pub by_type: BTreeMap<String, i64>,
    pub by_department: BTreeMap<String, i64>,
}

#[derive(Clone)]
pub struct RequestQueryService {
    pool: SqlitePool,
    repo: Arc<dyn RequestRepositoryTrait>,
}

impl RequestQueryService {
    pub fn new(pool: SqlitePool, repo: Arc<dyn RequestRepositoryTrait>) -> Self {
        Self { pool, repo }
    }

    pub async fn list(&self, filters: &RequestFilters) -> Result<Vec<EmployeeRequest>, AppError> {
        self.repo.list(&self.pool, filters).await
    }

    pub async fn pending(&self) -> Result<Vec<EmployeeRequest>, AppError> {
        self.repo.list(&self.pool, &RequestFilters::pending()).await
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<EmployeeRequest>, AppError> {
        self.repo.recent(&self.pool, limit).await
    }

    /// Every request in identifier order.
    pub async fn all(&self) -> Result<Vec<EmployeeRequest>, AppError> {
        self.repo.list_all(&self.pool).await
    }

    pub async fn stats(&self) -> Result<RequestStats, AppError> {
        Ok(RequestStats {
            total: self.repo.count(&self.pool, None).await?,
            pending: self
                .repo
                .count(&self.pool, Some(RequestStatus::Pending))
                .await?,
            approved: self
                .repo
                .count(&self.pool, Some(RequestStatus::Approved))
                .await?,
            rejected: self
                .repo
                .count(&self.pool, Some(RequestStatus::Rejected))
                .await?,
        })
    }

    pub async fn breakdowns(&self) -> Result<DashboardBreakdowns, AppError> {
        Ok(DashboardBreakdowns {
            by_status: self.grouped(Grouping::Status).await?,
            by_type: self.grouped(Grouping::RequestType).await?,
            by_department: self.grouped(Grouping::Department).await?,
        })
    }

    async fn grouped(&self, grouping: Grouping) -> Result<BTreeMap<String, i64>, AppError> {
        let rows = self.repo.count_grouped(&self.pool, grouping).await?;
        Ok(into_breakdown(grouping, rows))
    }
}

/// Folds grouped counts into a map. For the department grouping, NULL and
/// blank labels merge under `"none"`; status and type are never NULL.
fn into_breakdown(grouping: Grouping, rows: Vec<(Option<String>, i64)>) -> BTreeMap<String, i64> {
    let mut breakdown = BTreeMap::new();
    for (label, count) in rows {
        let label = match grouping {
            Grouping::Department => label
                .filter(|label| !label.trim().is_empty())
                .unwrap_or_else(|| NO_DEPARTMENT_LABEL.to_string()),
            Grouping::Status | Grouping::RequestType => label.unwrap_or_default(),
        };
        *breakdown.entry(label).or_insert(0) += count;
    }
    breakdown
}
