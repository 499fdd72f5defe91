use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    ConnectOptions, SqlitePool,
};
use std::str::FromStr;

pub type DbPool = SqlitePool;

/// Opens the SQLite pool, creating the database file when it does not exist.
///
/// In-memory databases live as long as their connection, so they get a single
/// connection that is never recycled.
pub async fn create_pool(database_url: &str, sql_echo: bool) -> anyhow::Result<DbPool> {
    let mut options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    if !sql_echo {
        options = options.disable_statement_logging();
    }

    let pool = if is_in_memory(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:shared?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite:./requests.db"));
    }

    #[tokio::test]
    async fn in_memory_pool_keeps_schema_between_queries() {
        let pool = create_pool("sqlite::memory:", false).await.expect("pool");
        run_migrations(&pool).await.expect("migrate");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM requests")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn file_database_is_created_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("requests.db");
        let url = format!("sqlite:{}", path.display());
        let pool = create_pool(&url, false).await.expect("pool");
        run_migrations(&pool).await.expect("migrate");
        assert!(path.exists());
        pool.close().await;
    }
}
