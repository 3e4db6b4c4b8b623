use std::sync::Arc;

use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthUrlResponse, LoginRequest, LoginResponse, OAuthCallbackParams, PublicUser,
            RegisterRequest, UpdateProfileRequest,
        },
        extractors::CurrentUser,
        oauth::{OAuthBridge, OAuthError},
        services::AuthService,
    },
    error::AppError,
    extract::JsonBody,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/google/login", get(google_login))
        .route("/auth/google/callback", get(google_callback))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me).patch(update_me))
}

#[instrument(skip(auth, payload), fields(email = %payload.email))]
pub async fn register(
    State(auth): State<AuthService>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let user = auth
        .register(&payload.email, &payload.password, payload.full_name.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(auth, payload), fields(email = %payload.email))]
pub async fn login(
    State(auth): State<AuthService>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, user) = auth.login(&payload.email, &payload.password).await?;
    Ok(Json(LoginResponse::bearer(token, user)))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_me(
    State(auth): State<AuthService>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let updated = auth
        .update_profile(user.id, payload.email, payload.full_name, payload.password)
        .await?;
    Ok(Json(updated.into()))
}

#[instrument(skip(state))]
pub async fn google_login(State(state): State<AppState>) -> Result<Json<AuthUrlResponse>, AppError> {
    let provider = state.identity.as_ref().ok_or(AppError::OAuthNotConfigured)?;
    Ok(Json(AuthUrlResponse {
        auth_url: provider.authorization_url(),
    }))
}

/// Always answers with a redirect to the frontend; failures are logged here
/// and reported to the browser only as `google_auth_failed`.
#[instrument(skip(state, params))]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<OAuthCallbackParams>,
) -> Result<Redirect, AppError> {
    let provider = state
        .identity
        .as_ref()
        .map(Arc::clone)
        .ok_or(AppError::OAuthNotConfigured)?;
    let frontend = &state.config.frontend_url;
    let failure = || Redirect::temporary(&format!("{frontend}/login?error=google_auth_failed"));

    let code = match (params.code, params.error) {
        (Some(code), _) if !code.is_empty() => code,
        (_, provider_error) => {
            warn!(error = ?provider_error, "oauth callback without code");
            return Ok(failure());
        }
    };

    let bridge = OAuthBridge::new(provider, AuthService::from_ref(&state));
    match bridge.authenticate(&code).await {
        Ok((token, user)) => {
            info!(user_id = %user.id, "google login succeeded");
            Ok(Redirect::temporary(&format!(
                "{frontend}/auth/google/callback?token={token}"
            )))
        }
        Err(e) => {
            match &e {
                OAuthError::Upstream(msg) => warn!(error = %msg, "google upstream failure"),
                OAuthError::MissingEmail => warn!("google identity without email"),
                OAuthError::Store(err) => error!(error = %err, "store failure during google login"),
                OAuthError::Auth(err) => warn!(error = %err, "google login refused"),
            }
            Ok(failure())
        }
    }
}
