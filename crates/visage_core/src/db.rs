//! Database connection and lifecycle for the gateway store.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::{debug, info};

use crate::error::CoreResult;

/// Gateway database handle.
///
/// Manages the SQLite connection pool for the gateway store, which holds:
/// - accounts (username + password hash)
/// - face credentials (reference image blob + materialized path)
/// - active sessions
#[derive(Debug, Clone)]
pub struct GatewayDb {
    pool: SqlitePool,
}

impl GatewayDb {
    /// Open or create the gateway database at the given path.
    ///
    /// This will:
    /// 1. Create the database file if it doesn't exist
    /// 2. Run any pending migrations
    /// 3. Configure SQLite for safe concurrent access (WAL mode, etc.)
    pub async fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.exists()) {
            std::fs::create_dir_all(parent)?;
        }

        let path_str = path.to_string_lossy();
        info!("Opening gateway database: {}", path_str);

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            // Recommended SQLite pragmas for performance
            .pragma("cache_size", "-16000") // 16MB cache
            .pragma("synchronous", "NORMAL") // Safe with WAL
            .pragma("temp_store", "MEMORY")
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            // SQLite is single-writer; readers (lookups) can parallelize
            .max_connections(5)
            .connect_with(options)
            .await?;

        debug!("Gateway database connection established");

        // Run migrations
        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Open an in-memory database (for testing).
    pub async fn open_in_memory() -> CoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .journal_mode(SqliteJournalMode::Wal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(1) // In-memory must be single connection to share state
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Run database migrations.
    async fn run_migrations(pool: &SqlitePool) -> CoreResult<()> {
        debug!("Running gateway database migrations");
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Gateway database migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Check if the database is healthy.
    pub async fn health_check(&self) -> CoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = GatewayDb::open_in_memory().await.unwrap();
        db.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_on_disk_creates_parent_dirs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("nested").join("gateway.db");
        let db = GatewayDb::open(&db_path).await.unwrap();
        db.health_check().await.unwrap();
        assert!(db_path.exists());
        db.close().await;
    }
}
