use axum::{extract::State, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::instrument;

use super::{dto::AnalyticsResponse, services};
use crate::{auth::extractors::CurrentUser, error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/analytics", get(get_analytics))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_analytics(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let summary =
        services::summary(state.applications.as_ref(), user.id, OffsetDateTime::now_utc()).await?;
    Ok(Json(summary))
}
