use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use super::google::IdentityProvider;
use super::password::{hash_password, random_unusable_password};
use super::repo_types::User;
use super::services::{AuthError, AuthService};
use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("identity provider error: {0}")]
    Upstream(String),

    #[error("identity provider returned no email")]
    MissingEmail,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Turns an external identity into a local account and session.
pub struct OAuthBridge {
    provider: Arc<dyn IdentityProvider>,
    auth: AuthService,
}

impl OAuthBridge {
    pub fn new(provider: Arc<dyn IdentityProvider>, auth: AuthService) -> Self {
        Self { provider, auth }
    }

    /// Full callback flow: code → provider token → identity → local session.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, code: &str) -> Result<(String, User), OAuthError> {
        let provider_token = self.provider.exchange_code(code).await?;
        let identity = self.provider.fetch_identity(&provider_token).await?;
        self.login_or_register(&identity.email, identity.display_name.as_deref())
            .await
    }

    /// Reuses the account with this exact email or provisions one with a
    /// random password nobody knows, then issues a session like `login`.
    #[instrument(skip(self))]
    pub async fn login_or_register(
        &self,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<(String, User), OAuthError> {
        let users = self.auth.users();
        let user = match users.find_by_email(email).await? {
            Some(existing) => existing,
            None => {
                let hash = hash_password(&random_unusable_password())
                    .map_err(|e| OAuthError::Auth(AuthError::Internal(e)))?;
                match users.create(email, &hash, display_name).await {
                    Ok(created) => {
                        info!(user_id = %created.id, "account provisioned from external identity");
                        created
                    }
                    Err(StoreError::Duplicate(_)) => {
                        warn!(email, "concurrent provisioning; using existing account");
                        users.find_by_email(email).await?.ok_or_else(|| {
                            StoreError::Corrupt("user vanished after duplicate insert".into())
                        })?
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let token = self.auth.issue_session(&user)?;
        info!(user_id = %user.id, "external identity logged in");
        Ok((token, user))
    }
}
