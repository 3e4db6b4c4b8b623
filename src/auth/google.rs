use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use super::oauth::OAuthError;
use crate::config::GoogleConfig;

/// Identity asserted by the external provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub email: String,
    pub display_name: Option<String>,
}

/// Server-to-server half of an OAuth authorization-code flow.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Consent screen URL the browser is sent to.
    fn authorization_url(&self) -> String;

    /// Exchanges an authorization code for a provider access token.
    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError>;

    /// Reads the user's identity with a provider access token.
    async fn fetch_identity(&self, provider_token: &str) -> Result<ExternalIdentity, OAuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
    name: Option<String>,
}

/// Google OAuth 2.0 client. Every call has a hard timeout and is never retried.
pub struct GoogleProvider {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: Url,
    token_url: Url,
    userinfo_url: Url,
}

impl GoogleProvider {
    pub fn new(config: &GoogleConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build identity provider http client")?;
        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            auth_url: Url::parse(&config.auth_url).context("invalid GOOGLE_AUTH_URL")?,
            token_url: Url::parse(&config.token_url).context("invalid GOOGLE_TOKEN_URL")?,
            userinfo_url: Url::parse(&config.userinfo_url)
                .context("invalid GOOGLE_USERINFO_URL")?,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self) -> String {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let response = self
            .client
            .post(self.token_url.clone())
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::Upstream(format!("token exchange request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "token exchange rejected");
            return Err(OAuthError::Upstream(format!(
                "token exchange returned {status}"
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::Upstream(format!("token exchange body: {e}")))?;
        debug!("provider token received");
        body.access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| OAuthError::Upstream("no access token in token response".into()))
    }

    async fn fetch_identity(&self, provider_token: &str) -> Result<ExternalIdentity, OAuthError> {
        let response = self
            .client
            .get(self.userinfo_url.clone())
            .bearer_auth(provider_token)
            .send()
            .await
            .map_err(|e| OAuthError::Upstream(format!("userinfo request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "userinfo rejected");
            return Err(OAuthError::Upstream(format!("userinfo returned {status}")));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| OAuthError::Upstream(format!("userinfo body: {e}")))?;
        identity_from(info)
    }
}

fn identity_from(info: UserInfo) -> Result<ExternalIdentity, OAuthError> {
    let email = info
        .email
        .filter(|e| !e.is_empty())
        .ok_or(OAuthError::MissingEmail)?;
    Ok(ExternalIdentity {
        email,
        display_name: info.name,
    })
}
