use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    CreateApplicationRequest, ListParams, MoveApplicationRequest, UpdateApplicationRequest,
};
use super::repo_types::JobApplication;
use crate::{auth::extractors::CurrentUser, error::AppError, extract::JsonBody, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/applications", get(list_applications).post(create_application))
        .route(
            "/applications/:id",
            get(get_application)
                .put(update_application)
                .delete(delete_application),
        )
        .route("/applications/:id/move", patch(move_application))
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Application {id} not found"))
}

#[instrument(skip_all, fields(user_id = %user.id, status = ?params.status))]
pub async fn list_applications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<JobApplication>>, AppError> {
    let apps = match params.status {
        Some(status) => state.applications.list_lane(user.id, status).await?,
        None => state.applications.list_for_user(user.id).await?,
    };
    Ok(Json(apps))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<JobApplication>), AppError> {
    let new = payload.validate()?;
    let app = state.applications.create(user.id, new).await?;
    info!(
        application_id = %app.id,
        status = %app.status,
        order_index = app.order_index,
        "application created"
    );
    Ok((StatusCode::CREATED, Json(app)))
}

#[instrument(skip_all, fields(user_id = %user.id, application_id = %id))]
pub async fn get_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<JobApplication>, AppError> {
    state
        .applications
        .get(id, user.id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

#[instrument(skip_all, fields(user_id = %user.id, application_id = %id))]
pub async fn update_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateApplicationRequest>,
) -> Result<Json<JobApplication>, AppError> {
    let patch = payload.validate()?;
    let app = state
        .applications
        .update(id, user.id, patch)
        .await?
        .ok_or_else(|| not_found(id))?;
    info!("application updated");
    Ok(Json(app))
}

#[instrument(skip_all, fields(user_id = %user.id, application_id = %id))]
pub async fn delete_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.applications.delete(id, user.id).await? {
        return Err(not_found(id));
    }
    info!("application deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(user_id = %user.id, application_id = %id))]
pub async fn move_application(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<MoveApplicationRequest>,
) -> Result<Json<JobApplication>, AppError> {
    let target = payload.validate()?;
    let app = state
        .applications
        .move_to(id, user.id, target)
        .await?
        .ok_or_else(|| not_found(id))?;
    info!(status = %app.status, order_index = app.order_index, "application moved");
    Ok(Json(app))
}
