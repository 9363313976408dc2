//! Database lifecycle and schema migrations.

use crate::error::DatabaseError;
use crate::{Error, Result};
use sqlx::SqliteConnection;
use sqlx::sqlite::SqlitePool;
use std::path::Path;

use super::Database;

impl Database {
    /// Create a new database connection
    ///
    /// Creates the database file if it doesn't exist and runs migrations.
    pub async fn new(path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to create database directory: {}",
                    e
                )))
            })?;
        }

        // Connect to database with foreign key enforcement and WAL mode
        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to parse database path: {}",
                    e
                )))
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to connect to database: {}",
                e
            )))
        })?;

        let db = Self { pool };

        db.run_migrations().await?;

        Ok(db)
    }

    /// Current schema version (0 before any migration)
    pub async fn schema_version(&self) -> Result<i64> {
        let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to query schema version: {}",
                    e
                )))
            })?;

        Ok(version.unwrap_or(0))
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to acquire connection: {}",
                e
            )))
        })?;

        ddl(
            &mut conn,
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )
            "#,
            "create schema_version table",
        )
        .await?;

        let current_version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to query schema version: {}",
                        e
                    )))
                })?;

        let current_version = current_version.unwrap_or(0);

        if current_version < 1 {
            Self::migrate_v1(&mut conn).await?;
        }

        Ok(())
    }

    /// Migration v1: users, jobs and sessions
    async fn migrate_v1(conn: &mut SqliteConnection) -> Result<()> {
        tracing::info!("Applying database migration v1");

        begin(conn).await?;

        let result = async {
            Self::create_users_table(conn).await?;
            Self::create_jobs_schema(conn).await?;
            Self::create_sessions_schema(conn).await?;
            Self::record_migration(conn, 1).await?;
            Ok::<(), Error>(())
        }
        .await;

        finish(conn, 1, result).await?;

        tracing::info!("Database migration v1 complete");
        Ok(())
    }

    async fn create_users_table(conn: &mut SqliteConnection) -> Result<()> {
        ddl(
            conn,
            r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            "create users table",
        )
        .await
    }

    /// Create jobs table and its indexes
    ///
    /// `idx_jobs_active_locator` only covers non-failed rows (status 3), so a
    /// locator can be resubmitted once its previous job has failed.
    async fn create_jobs_schema(conn: &mut SqliteConnection) -> Result<()> {
        ddl(
            conn,
            r#"
            CREATE TABLE jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                source_locator TEXT NOT NULL,
                display_name TEXT NOT NULL,
                status INTEGER NOT NULL DEFAULT 0,
                progress INTEGER NOT NULL DEFAULT 0
                    CHECK (progress BETWEEN 0 AND 100),
                result_location TEXT,
                diagnostic TEXT,
                created_at INTEGER NOT NULL,
                started_at INTEGER,
                completed_at INTEGER
            )
            "#,
            "create jobs table",
        )
        .await?;

        ddl(
            conn,
            "CREATE INDEX idx_jobs_user_status ON jobs(user_id, status)",
            "create index",
        )
        .await?;

        ddl(
            conn,
            "CREATE INDEX idx_jobs_created ON jobs(created_at DESC)",
            "create index",
        )
        .await?;

        ddl(
            conn,
            r#"
            CREATE UNIQUE INDEX idx_jobs_active_locator
            ON jobs(user_id, source_locator)
            WHERE status != 3
            "#,
            "create index",
        )
        .await
    }

    async fn create_sessions_schema(conn: &mut SqliteConnection) -> Result<()> {
        ddl(
            conn,
            r#"
            CREATE TABLE sessions (
                token_hash TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
            "create sessions table",
        )
        .await?;

        ddl(
            conn,
            "CREATE INDEX idx_sessions_expires ON sessions(expires_at)",
            "create index",
        )
        .await
    }

    /// Record a migration version
    async fn record_migration(conn: &mut SqliteConnection, version: i32) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, ?)")
            .bind(version)
            .bind(now)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "Failed to record migration: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Execute one schema statement, labelling failures with `what`
async fn ddl(conn: &mut SqliteConnection, sql: &str, what: &str) -> Result<()> {
    sqlx::query(sql).execute(&mut *conn).await.map_err(|e| {
        Error::Database(DatabaseError::MigrationFailed(format!(
            "Failed to {}: {}",
            what, e
        )))
    })?;
    Ok(())
}

// Each migration runs in its own transaction so a partial failure leaves the
// previous schema intact.
async fn begin(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query("BEGIN")
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;
    Ok(())
}

async fn finish(conn: &mut SqliteConnection, version: i32, result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => {
            sqlx::query("COMMIT")
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::MigrationFailed(format!(
                        "Failed to commit migration v{}: {}",
                        version, e
                    )))
                })?;
            Ok(())
        }
        Err(e) => {
            let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
            Err(e)
        }
    }
}
