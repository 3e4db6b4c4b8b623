use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenError};
use super::password::{hash_password, verify_password};
use super::repo::UserStore;
use super::repo_types::{ProfileChanges, User};
use crate::db::StoreError;
use crate::state::AppState;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("inactive account")]
    InactiveAccount,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate(_) => AuthError::DuplicateEmail,
            other => AuthError::Store(other),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Registration, login and session resolution over a [`UserStore`].
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        AuthService::new(state.users.clone(), JwtKeys::from_ref(state))
    }
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<User, AuthError> {
        if !is_valid_email(email) {
            return Err(AuthError::Validation("Invalid email".into()));
        }
        validate_password(password)?;

        if self.users.find_by_email(email).await?.is_some() {
            warn!(email, "email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let hash = hash_password(password)?;
        // A concurrent registration can still win the race; the unique
        // constraint turns that into DuplicateEmail via From<StoreError>.
        let user = self.users.create(email, &hash, full_name).await?;
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AuthError> {
        let user = match self.users.find_by_email(email).await? {
            Some(u) => u,
            None => {
                warn!(email, "login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(email, user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_session(&user)?;
        info!(user_id = %user.id, "user logged in");
        Ok((token, user))
    }

    /// Mints a session token for an already authenticated user.
    pub fn issue_session(&self, user: &User) -> Result<String, AuthError> {
        if !user.is_active {
            warn!(user_id = %user.id, "inactive account refused");
            return Err(AuthError::InactiveAccount);
        }
        self.keys
            .issue(user.id, &user.email)
            .map_err(|e| AuthError::Internal(e.into()))
    }

    pub async fn resolve_session(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.keys.verify(token).map_err(|e| {
            if let TokenError::Signing(inner) = &e {
                warn!(error = %inner, "unexpected token error");
            } else {
                warn!(reason = %e, "session token rejected");
            }
            AuthError::Unauthorized(e.to_string())
        })?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "session for unknown user");
                AuthError::Unauthorized("user not found".into())
            })?;

        if !user.is_active {
            warn!(user_id = %user.id, "session for inactive user");
            return Err(AuthError::Unauthorized("inactive user".into()));
        }
        Ok(user)
    }

    #[instrument(skip(self, password, full_name))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        email: Option<String>,
        full_name: Option<Option<String>>,
        password: Option<String>,
    ) -> Result<User, AuthError> {
        if let Some(email) = &email {
            if !is_valid_email(email) {
                return Err(AuthError::Validation("Invalid email".into()));
            }
            if let Some(existing) = self.users.find_by_email(email).await? {
                if existing.id != user_id {
                    return Err(AuthError::DuplicateEmail);
                }
            }
        }
        let password_hash = match password {
            Some(p) => {
                validate_password(&p)?;
                Some(hash_password(&p)?)
            }
            None => None,
        };

        let changes = ProfileChanges {
            email,
            full_name,
            password_hash,
        };
        let user = self
            .users
            .update_profile(user_id, changes)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("user not found".into()))?;
        info!(user_id = %user.id, "profile updated");
        Ok(user)
    }
}
