use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::applications::repo::{ApplicationStore, PgApplicationStore};
use crate::auth::google::{GoogleProvider, IdentityProvider};
use crate::auth::repo::{PgUserStore, UserStore};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub applications: Arc<dyn ApplicationStore>,
    /// `None` when Google sign-in is not configured.
    pub identity: Option<Arc<dyn IdentityProvider>>,
}

impl AppState {
    pub fn from_pool(config: AppConfig, pool: PgPool) -> anyhow::Result<Self> {
        let identity = match &config.google {
            Some(google) => {
                info!("google sign-in enabled");
                Some(Arc::new(GoogleProvider::new(google)?) as Arc<dyn IdentityProvider>)
            }
            None => {
                info!("google sign-in disabled; GOOGLE_CLIENT_ID not set");
                None
            }
        };

        Ok(Self {
            config: Arc::new(config),
            users: Arc::new(PgUserStore::new(pool.clone())),
            applications: Arc::new(PgApplicationStore::new(pool)),
            identity,
        })
    }

    /// State over in-memory stores and no identity provider.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::testing::{test_config, MemoryApplicationStore, MemoryUserStore};

        Self {
            config: Arc::new(test_config()),
            users: Arc::new(MemoryUserStore::default()),
            applications: Arc::new(MemoryApplicationStore::default()),
            identity: None,
        }
    }

    #[cfg(test)]
    pub fn fake_with_identity(provider: crate::testing::FakeIdentityProvider) -> Self {
        Self {
            identity: Some(Arc::new(provider)),
            ..Self::fake()
        }
    }
}
