//! Transaction management utilities for repositories.

use crate::error::AppError;
use sqlx::{Sqlite, SqlitePool, Transaction};

pub type DbTransaction<'c> = Transaction<'c, Sqlite>;

/// Begin a new database transaction.
///
/// On success the transaction is committed via [`commit_transaction`]; on
/// failure it is rolled back via [`rollback_transaction`]. Dropping an
/// uncommitted transaction also rolls it back.
pub async fn begin_transaction(db: &SqlitePool) -> Result<DbTransaction<'static>, AppError> {
    db.begin()
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))
}

pub async fn commit_transaction(tx: DbTransaction<'_>) -> Result<(), AppError> {
    tx.commit()
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))
}

pub async fn rollback_transaction(tx: DbTransaction<'_>) -> Result<(), AppError> {
    tx.rollback()
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))
}
