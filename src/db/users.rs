//! Registered accounts.

use crate::error::{AuthError, DatabaseError};
use crate::types::UserId;
use crate::{Error, Result};

use super::{Database, NewUser, UserRow};

impl Database {
    /// Insert a new user
    ///
    /// Fails with [`AuthError::EmailTaken`] if the email is already registered.
    pub async fn insert_user(&self, user: &NewUser) -> Result<UserId> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Error::Auth(AuthError::EmailTaken)
            }
            _ => Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert user: {}",
                e
            ))),
        })?;

        Ok(UserId(result.last_insert_rowid()))
    }

    /// Look up a user by normalized email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get user: {}",
                e
            )))
        })?;

        Ok(row)
    }

    /// Look up a user by ID
    pub async fn get_user(&self, id: UserId) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get user: {}",
                e
            )))
        })?;

        Ok(row)
    }
}
