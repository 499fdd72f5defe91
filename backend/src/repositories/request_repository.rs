//! Request repository trait for dependency injection and testing.
//!
//! Writes run inside a single transaction each: a failure rolls the whole
//! operation back and nothing partial becomes visible.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::models::employee_request::{
    Decision, EmployeeRequest, NewRequest, RequestDetails, RequestRow, REQUEST_COLUMNS,
};
use crate::models::request::RequestStatus;
use crate::repositories::{
    common::push_clause,
    request::{DecisionGuard, Grouping, RequestFilters},
    transaction::{begin_transaction, commit_transaction, rollback_transaction},
};
use crate::types::RequestId;

/// Repository trait for request persistence and read paths.
///
/// Mocked with mockall in lifecycle tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestRepositoryTrait: Send + Sync {
    /// Persist a new pending request and return it as stored.
    async fn insert(
        &self,
        db: &SqlitePool,
        request: &NewRequest,
        submitted_at: DateTime<Utc>,
    ) -> Result<EmployeeRequest, AppError>;

    /// Find a request by ID; `NotFound` when it does not exist.
    async fn find_by_id(&self, db: &SqlitePool, id: RequestId)
        -> Result<EmployeeRequest, AppError>;

    /// Stamp a decision onto a request. `None` when no row matched the id and guard.
    async fn apply_decision(
        &self,
        db: &SqlitePool,
        id: RequestId,
        decision: &Decision,
        guard: DecisionGuard,
    ) -> Result<Option<EmployeeRequest>, AppError>;

    /// Requests matching the filters, newest submission first.
    async fn list(
        &self,
        db: &SqlitePool,
        filters: &RequestFilters,
    ) -> Result<Vec<EmployeeRequest>, AppError>;

    /// Every request in identifier order.
    async fn list_all(&self, db: &SqlitePool) -> Result<Vec<EmployeeRequest>, AppError>;

    /// The `limit` most recently submitted requests.
    async fn recent(&self, db: &SqlitePool, limit: i64) -> Result<Vec<EmployeeRequest>, AppError>;

    /// Number of requests, optionally restricted to one status.
    async fn count(&self, db: &SqlitePool, status: Option<RequestStatus>)
        -> Result<i64, AppError>;

    /// Request counts grouped by a column; NULL groups carry a `None` label.
    async fn count_grouped(
        &self,
        db: &SqlitePool,
        grouping: Grouping,
    ) -> Result<Vec<(Option<String>, i64)>, AppError>;
}

/// Concrete implementation of RequestRepositoryTrait
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestRepository;

impl RequestRepository {
    pub fn new() -> Self {
        Self
    }
}

fn into_requests(rows: Vec<RequestRow>) -> Result<Vec<EmployeeRequest>, AppError> {
    rows.into_iter()
        .map(|row| EmployeeRequest::try_from(row).map_err(AppError::InternalServerError))
        .collect()
}

async fn fetch_request<'e, E>(executor: E, id: RequestId) -> Result<Option<EmployeeRequest>, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = format!("SELECT {} FROM requests WHERE id = ?", REQUEST_COLUMNS);
    let row = sqlx::query_as::<_, RequestRow>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    row.map(EmployeeRequest::try_from)
        .transpose()
        .map_err(AppError::InternalServerError)
}

async fn insert_row(
    conn: &mut SqliteConnection,
    request: &NewRequest,
    submitted_at: DateTime<Utc>,
) -> Result<RequestId, AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "INSERT INTO requests (request_type, employee_name, employee_email, department, \
         submission_date, status, priority, leave_start_date, leave_end_date, leave_days, \
         leave_reason, item_description, quantity, estimated_cost, justification) ",
    );
    builder.push_values(std::iter::once(request), |mut row, request| {
        row.push_bind(request.details.request_type())
            .push_bind(&request.employee_name)
            .push_bind(&request.employee_email)
            .push_bind(&request.department)
            .push_bind(submitted_at)
            .push_bind(RequestStatus::Pending)
            .push_bind(request.priority);
        match &request.details {
            RequestDetails::Leave(leave) => {
                row.push_bind(Some(leave.start_date))
                    .push_bind(Some(leave.end_date))
                    .push_bind(Some(leave.leave_days))
                    .push_bind(&leave.reason)
                    .push_bind(None::<String>)
                    .push_bind(None::<i64>)
                    .push_bind(None::<f64>)
                    .push_bind(None::<String>);
            }
            RequestDetails::Purchase(purchase) => {
                row.push_bind(None::<chrono::NaiveDate>)
                    .push_bind(None::<chrono::NaiveDate>)
                    .push_bind(None::<i64>)
                    .push_bind(None::<String>)
                    .push_bind(&purchase.item_description)
                    .push_bind(Some(purchase.quantity))
                    .push_bind(Some(purchase.estimated_cost))
                    .push_bind(&purchase.justification);
            }
        }
    });
    builder.push(" RETURNING id");

    let id: RequestId = builder.build_query_scalar().fetch_one(conn).await?;
    Ok(id)
}

#[async_trait]
impl RequestRepositoryTrait for RequestRepository {
    async fn insert(
        &self,
        db: &SqlitePool,
        request: &NewRequest,
        submitted_at: DateTime<Utc>,
    ) -> Result<EmployeeRequest, AppError> {
        let mut tx = begin_transaction(db).await?;

        let id = match insert_row(&mut *tx, request, submitted_at).await {
            Ok(id) => id,
            Err(err) => {
                rollback_transaction(tx).await?;
                return Err(err);
            }
        };
        let stored = match fetch_request(&mut *tx, id).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                rollback_transaction(tx).await?;
                return Err(AppError::InternalServerError(anyhow::anyhow!(
                    "request {} vanished after insert",
                    id
                )));
            }
            Err(err) => {
                rollback_transaction(tx).await?;
                return Err(err);
            }
        };

        commit_transaction(tx).await?;
        Ok(stored)
    }

    async fn find_by_id(
        &self,
        db: &SqlitePool,
        id: RequestId,
    ) -> Result<EmployeeRequest, AppError> {
        fetch_request(db, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))
    }

    async fn apply_decision(
        &self,
        db: &SqlitePool,
        id: RequestId,
        decision: &Decision,
        guard: DecisionGuard,
    ) -> Result<Option<EmployeeRequest>, AppError> {
        let mut tx = begin_transaction(db).await?;

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE requests SET status = ");
        builder
            .push_bind(decision.outcome.status())
            .push(", approver_name = ")
            .push_bind(&decision.approver_name)
            .push(", approver_email = ")
            .push_bind(&decision.approver_email)
            .push(", approver_comments = ")
            .push_bind(&decision.comments)
            .push(", approval_date = ")
            .push_bind(decision.decided_at)
            .push(" WHERE id = ")
            .push_bind(id);
        if guard == DecisionGuard::PendingOnly {
            builder
                .push(" AND status = ")
                .push_bind(RequestStatus::Pending);
        }

        let affected = match builder.build().execute(&mut *tx).await {
            Ok(result) => result.rows_affected(),
            Err(err) => {
                rollback_transaction(tx).await?;
                return Err(err.into());
            }
        };
        if affected == 0 {
            rollback_transaction(tx).await?;
            return Ok(None);
        }

        let updated = match fetch_request(&mut *tx, id).await {
            Ok(updated) => updated,
            Err(err) => {
                rollback_transaction(tx).await?;
                return Err(err);
            }
        };
        commit_transaction(tx).await?;
        Ok(updated)
    }

    async fn list(
        &self,
        db: &SqlitePool,
        filters: &RequestFilters,
    ) -> Result<Vec<EmployeeRequest>, AppError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM requests", REQUEST_COLUMNS));
        let mut has_clause = false;
        if let Some(status) = filters.status.value() {
            push_clause(&mut builder, &mut has_clause);
            builder.push("status = ").push_bind(*status);
        }
        if let Some(request_type) = filters.request_type.value() {
            push_clause(&mut builder, &mut has_clause);
            builder.push("request_type = ").push_bind(*request_type);
        }
        builder.push(" ORDER BY submission_date DESC, id DESC");

        let rows = builder
            .build_query_as::<RequestRow>()
            .fetch_all(db)
            .await?;
        into_requests(rows)
    }

    async fn list_all(&self, db: &SqlitePool) -> Result<Vec<EmployeeRequest>, AppError> {
        let query = format!("SELECT {} FROM requests ORDER BY id", REQUEST_COLUMNS);
        let rows = sqlx::query_as::<_, RequestRow>(&query).fetch_all(db).await?;
        into_requests(rows)
    }

    async fn recent(&self, db: &SqlitePool, limit: i64) -> Result<Vec<EmployeeRequest>, AppError> {
        let query = format!(
            "SELECT {} FROM requests ORDER BY submission_date DESC, id DESC LIMIT ?",
            REQUEST_COLUMNS
        );
        let rows = sqlx::query_as::<_, RequestRow>(&query)
            .bind(limit.max(0))
            .fetch_all(db)
            .await?;
        into_requests(rows)
    }

    async fn count(
        &self,
        db: &SqlitePool,
        status: Option<RequestStatus>,
    ) -> Result<i64, AppError> {
        let count = match status {
            Some(status) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM requests WHERE status = ?")
                    .bind(status)
                    .fetch_one(db)
                    .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM requests")
                    .fetch_one(db)
                    .await?
            }
        };
        Ok(count)
    }

    async fn count_grouped(
        &self,
        db: &SqlitePool,
        grouping: Grouping,
    ) -> Result<Vec<(Option<String>, i64)>, AppError> {
        let column = grouping.column();
        let query = format!(
            "SELECT {column}, COUNT(id) FROM requests GROUP BY {column} ORDER BY {column}"
        );
        let rows = sqlx::query_as::<_, (Option<String>, i64)>(&query)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }
}
