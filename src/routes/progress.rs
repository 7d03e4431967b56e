use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::progress_dto::SubmitProgressPayload,
    error::{Error, Result},
    middleware::auth::AuthUser,
    models::user::Role,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/progress",
    request_body = SubmitProgressPayload,
    responses(
        (status = 200, description = "Submission recorded; one attempt consumed while uncompleted"),
        (status = 404, description = "Task not found")
    )
)]
#[axum::debug_handler]
pub async fn submit_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<SubmitProgressPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let student = state.user_service.student_for_user(auth.user_id).await?;
    let progress = state.progress_service.submit(student.id, payload).await?;
    Ok(Json(progress))
}

#[utoipa::path(
    get,
    path = "/api/progress/{student_id}",
    params(("student_id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "All progress rows with task and grade context"),
        (status = 403, description = "Students may only read their own progress")
    )
)]
#[axum::debug_handler]
pub async fn show_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(student_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    if auth.role == Role::Student {
        let own = state.user_service.student_for_user(auth.user_id).await?;
        if own.id != student_id {
            return Err(Error::Forbidden(
                "Students may only view their own progress".into(),
            ));
        }
    }
    let progress = state.progress_service.list_for_student(student_id).await?;
    Ok(Json(progress))
}

#[utoipa::path(
    post,
    path = "/api/progress/reset/{student_id}/{task_id}",
    params(
        ("student_id" = Uuid, Path, description = "Student ID"),
        ("task_id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Attempts restored to the task's max_attempts"),
        (status = 404, description = "No progress row for the pair")
    )
)]
#[axum::debug_handler]
pub async fn reset_attempts(
    State(state): State<AppState>,
    Path((student_id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let progress = state
        .progress_service
        .reset_attempts(student_id, task_id)
        .await?;
    Ok(Json(progress))
}
