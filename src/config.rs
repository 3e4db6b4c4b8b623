use anyhow::Context;
use serde::Deserialize;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:8000";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Google OAuth client settings. Absent when `GOOGLE_CLIENT_ID` is unset or empty.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub google: Option<GoogleConfig>,
    pub cors_origins: Vec<String>,
    pub frontend_url: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .with_context(|| format!("required environment variable '{key}' is not set"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());

        let database_url = require("DATABASE_URL")?;
        let db_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        let jwt = JwtConfig {
            secret: require("JWT_SECRET")?,
            issuer: or_default("JWT_ISSUER", "jobtrack"),
            audience: or_default("JWT_AUDIENCE", "jobtrack-users"),
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", 60 * 24 * 7)?,
        };

        let google = match lookup("GOOGLE_CLIENT_ID").filter(|v| !v.is_empty()) {
            Some(client_id) => Some(GoogleConfig {
                client_id,
                client_secret: or_default("GOOGLE_CLIENT_SECRET", ""),
                redirect_uri: or_default(
                    "GOOGLE_REDIRECT_URI",
                    "http://localhost:8000/api/auth/google/callback",
                ),
                auth_url: or_default(
                    "GOOGLE_AUTH_URL",
                    "https://accounts.google.com/o/oauth2/v2/auth",
                ),
                token_url: or_default("GOOGLE_TOKEN_URL", "https://oauth2.googleapis.com/token"),
                userinfo_url: or_default(
                    "GOOGLE_USERINFO_URL",
                    "https://www.googleapis.com/oauth2/v2/userinfo",
                ),
                timeout_secs: parse_or(&lookup, "OAUTH_TIMEOUT_SECS", 10)?,
            }),
            None => None,
        };

        let cors_origins: Vec<String> = or_default("CORS_ORIGINS", DEFAULT_CORS_ORIGINS)
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let frontend_url = lookup("FRONTEND_URL")
            .filter(|v| !v.is_empty())
            .or_else(|| cors_origins.first().cloned())
            .unwrap_or_else(|| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        let host = or_default("APP_HOST", "0.0.0.0");
        let port = match lookup("APP_PORT").or_else(|| lookup("PORT")) {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("APP_PORT must be a valid port number, got '{v}'"))?,
            None => 8000,
        };

        Ok(Self {
            database_url,
            db_max_connections,
            jwt,
            google,
            cors_origins,
            frontend_url,
            host,
            port,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(v) => v
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: '{v}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/jobs"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config");

        assert_eq!(cfg.jwt.ttl_minutes, 60 * 24 * 7);
        assert_eq!(cfg.jwt.issuer, "jobtrack");
        assert_eq!(cfg.db_max_connections, 10);
        assert_eq!(cfg.port, 8000);
        assert!(cfg.google.is_none());
        assert_eq!(
            cfg.cors_origins,
            vec!["http://localhost:3000", "http://localhost:8000"]
        );
        assert_eq!(cfg.frontend_url, "http://localhost:3000");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]))
            .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn google_is_enabled_by_client_id() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("GOOGLE_CLIENT_ID", "cid"),
            ("GOOGLE_CLIENT_SECRET", "csecret"),
        ]))
        .expect("config");
        let google = cfg.google.expect("google configured");
        assert_eq!(google.client_id, "cid");
        assert_eq!(google.timeout_secs, 10);
        assert!(google.redirect_uri.ends_with("/api/auth/google/callback"));
    }

    #[test]
    fn empty_google_client_id_disables_provider() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("GOOGLE_CLIENT_ID", ""),
        ]))
        .expect("config");
        assert!(cfg.google.is_none());
    }

    #[test]
    fn cors_list_is_split_and_frontend_falls_back_to_first_origin() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("CORS_ORIGINS", " https://jobs.example.com/ , http://localhost:5173"),
            ("PORT", "9000"),
        ]))
        .expect("config");
        assert_eq!(cfg.cors_origins.len(), 2);
        assert_eq!(cfg.frontend_url, "https://jobs.example.com");
        assert_eq!(cfg.port, 9000);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("APP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }
}
