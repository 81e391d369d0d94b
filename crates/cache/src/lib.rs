//! Cache layer for Stock Advisor
//!
//! Provides SQLite storage for provider payloads (history, fundamentals, news)
//! with time-to-live lookups, so repeated analyses do not hit the upstream
//! quote services.

pub mod repository;
pub mod schema;

pub use repository::{cache_key, CacheEntry, CacheRepository, CacheStats};
pub use sqlx::sqlite::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache query error: {0}")]
    Query(String),

    #[error("Cache migration error: {0}")]
    Migration(String),

    #[error("Cache payload error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Cache database connection pool
#[derive(Clone)]
pub struct CacheDb {
    pool: SqlitePool,
}

impl CacheDb {
    /// Open (or create) a cache database file
    pub async fn new(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.run_migrations().await?;
        db.configure_pragmas().await?;

        debug!(path = %path.display(), "Cache database ready");
        Ok(db)
    }

    /// Create an in-memory cache (for testing and one-shot runs)
    pub async fn in_memory() -> CacheResult<Self> {
        // A single connection keeps every query on the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Create tables and indexes, one statement at a time
    async fn run_migrations(&self) -> CacheResult<()> {
        for statement in schema::CREATE_TABLES.split(';') {
            let sql: String = statement
                .lines()
                .filter(|line| !line.trim().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n");
            let sql = sql.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| CacheError::Migration(format!("{e}: {sql}")))?;
        }

        Ok(())
    }

    async fn configure_pragmas(&self) -> CacheResult<()> {
        // WAL lets batch analyses read while another task refreshes an entry
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::Connection(format!("WAL pragma failed: {e}")))?;

        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::Connection(format!("synchronous pragma failed: {e}")))?;

        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Clone the pool for use in spawned tasks
    pub fn pool_clone(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Repository view over this database
    pub fn repository(&self) -> CacheRepository<'_> {
        CacheRepository::new(&self.pool)
    }
}
