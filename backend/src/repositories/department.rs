//! Department registry repository.
//!
//! Departments are reference data: seeded once, read-only afterwards.

use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::department::{Department, DEFAULT_DEPARTMENTS};
use crate::repositories::transaction::{begin_transaction, commit_transaction};

#[derive(Debug, Default, Clone, Copy)]
pub struct DepartmentRepository;

impl DepartmentRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list_all(&self, db: &SqlitePool) -> Result<Vec<Department>, AppError> {
        let rows = sqlx::query_as::<_, Department>(
            "SELECT id, name, manager_email FROM departments ORDER BY name",
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_name(
        &self,
        db: &SqlitePool,
        name: &str,
    ) -> Result<Option<Department>, AppError> {
        let row = sqlx::query_as::<_, Department>(
            "SELECT id, name, manager_email FROM departments WHERE name = ? LIMIT 1",
        )
        .bind(name)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn count(&self, db: &SqlitePool) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM departments")
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    /// Inserts the default departments when the registry is empty.
    ///
    /// Returns the number of rows inserted; zero when departments already exist.
    pub async fn seed_defaults(&self, db: &SqlitePool) -> Result<u64, AppError> {
        let mut tx = begin_transaction(db).await?;

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM departments")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            return Ok(0);
        }

        let mut inserted = 0;
        for (name, manager_email) in DEFAULT_DEPARTMENTS {
            inserted += sqlx::query("INSERT INTO departments (name, manager_email) VALUES (?, ?)")
                .bind(name)
                .bind(manager_email)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        commit_transaction(tx).await?;
        Ok(inserted)
    }
}
