//! Bearer session tokens.
//!
//! Only SHA-256 hashes of tokens are stored; callers hash before every call.

use crate::error::DatabaseError;
use crate::types::UserId;
use crate::{Error, Result};

use super::{Database, SessionRow};

impl Database {
    /// Store a new session for `user`
    pub async fn insert_session(
        &self,
        token_hash: &str,
        user: UserId,
        expires_at: i64,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(token_hash)
        .bind(user)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert session: {}",
                e
            )))
        })?;

        Ok(())
    }

    /// Find the user behind a session that has not expired at `now`
    pub async fn find_session(&self, token_hash: &str, now: i64) -> Result<Option<SessionRow>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT s.user_id, u.name, u.email, s.expires_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = ? AND s.expires_at > ?
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to find session: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Delete a session, returning whether it existed
    pub async fn delete_session(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to delete session: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove sessions that expired at or before `now`, returning how many were removed
    pub async fn purge_expired_sessions(&self, now: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to purge sessions: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected())
    }
}
