//! Registration, login and session verification.

use chrono::Utc;

use super::JobTracker;
use crate::auth;
use crate::db::NewUser;
use crate::error::{AuthError, Result};
use crate::types::{Session, UserInfo};

impl JobTracker {
    /// Register a new account
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Validation`] naming the offending field
    /// - [`AuthError::EmailTaken`] if the email is already registered
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<UserInfo> {
        let registration = auth::validate_registration(name, email, password, &self.config.auth)?;

        let id = self
            .db
            .insert_user(&NewUser {
                name: registration.name.clone(),
                email: registration.email.clone(),
                password_hash: auth::hash_password(password, self.config.auth.bcrypt_cost).await?,
            })
            .await?;

        tracing::info!(user_id = id.0, "User registered");

        Ok(UserInfo {
            id,
            name: registration.name,
            email: registration.email,
        })
    }

    /// Exchange credentials for a bearer session
    ///
    /// Unknown emails and wrong passwords both yield
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = auth::normalize_email(email);

        let Some(user) = self.db.get_user_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials.into());
        };
        if !auth::verify_password(password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = auth::generate_token();
        let ttl = chrono::Duration::from_std(self.config.auth.session_ttl)
            .unwrap_or_else(|_| chrono::Duration::days(7));
        let expires_at = Utc::now() + ttl;

        self.db
            .insert_session(&auth::hash_token(&token), user.id.into(), expires_at.timestamp())
            .await?;

        tracing::debug!(user_id = user.id, "Session issued");

        Ok(Session {
            token,
            expires_at,
            user: user.into(),
        })
    }

    /// Resolve a bearer token to its user
    ///
    /// Unknown and expired tokens yield [`AuthError::InvalidToken`].
    pub async fn authenticate(&self, token: &str) -> Result<UserInfo> {
        let now = Utc::now().timestamp();
        self.db
            .find_session(&auth::hash_token(token), now)
            .await?
            .map(UserInfo::from)
            .ok_or_else(|| AuthError::InvalidToken.into())
    }

    /// Revoke a bearer token
    pub async fn logout(&self, token: &str) -> Result<()> {
        if !self.db.delete_session(&auth::hash_token(token)).await? {
            return Err(AuthError::InvalidToken.into());
        }
        Ok(())
    }
}
