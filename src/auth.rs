//! Credential helpers for accounts and sessions
//!
//! Passwords are stored as bcrypt hashes. Session tokens are random 32-byte
//! values handed to the client once; only their SHA-256 is persisted.

use crate::config::AuthConfig;
use crate::error::{AuthError, Error, Result};
use rand::RngCore;
use sha2::{Digest, Sha256};

const TOKEN_LEN: usize = 32;

/// Validated and normalized registration input
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    /// Trimmed display name
    pub name: String,
    /// Trimmed, lower-cased email
    pub email: String,
}

/// Check registration input against the account rules
///
/// Names must be 2 to 100 characters after trimming, emails must look like
/// `local@domain.tld`, and passwords must fall within the configured length
/// bounds, counted in bytes.
pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
    config: &AuthConfig,
) -> Result<Registration> {
    let name = name.trim();
    let name_len = name.chars().count();
    if !(2..=100).contains(&name_len) {
        return Err(Error::validation(
            "name",
            "Name must be between 2 and 100 characters",
        ));
    }

    let email = normalize_email(email);
    if !looks_like_email(&email) {
        return Err(Error::validation("email", "Please provide a valid email"));
    }

    let password_len = password.len();
    if password_len < config.min_password_len || password_len > config.max_password_len {
        return Err(Error::validation(
            "password",
            format!(
                "Password must be between {} and {} characters",
                config.min_password_len, config.max_password_len
            ),
        ));
    }

    Ok(Registration {
        name: name.to_string(),
        email,
    })
}

/// Canonical form of an email used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty())
        && !domain.ends_with('.')
}

/// Hash a password with bcrypt at the given work factor
///
/// Runs on the blocking pool since bcrypt is deliberately slow.
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        bcrypt::hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("task join error: {e}")))?
    .map_err(Error::from)
}

/// Check a password against a stored bcrypt hash
///
/// Stored values that are not bcrypt hashes never verify.
pub async fn verify_password(password: &str, stored: &str) -> Result<bool> {
    let password = password.to_string();
    let stored = stored.to_string();
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &stored))
        .await
        .map_err(|e| AuthError::Hashing(format!("task join error: {e}")))?;

    match outcome {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is unreadable");
            Ok(false)
        }
    }
}

/// Generate a new opaque session token
pub fn generate_token() -> String {
    let mut token = [0u8; TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut token);
    to_hex(&token)
}

/// Hash of a session token as stored in the database
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
