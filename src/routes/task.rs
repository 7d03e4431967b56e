use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{error::Result, middleware::auth::AuthUser, AppState};

#[axum::debug_handler]
pub async fn list_grades(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let grades = state.task_service.list_grades().await?;
    Ok(Json(grades))
}

#[utoipa::path(
    get,
    path = "/api/grades/{grade_id}/tasks",
    params(("grade_id" = Uuid, Path, description = "Grade ID")),
    responses((status = 200, description = "Tasks with per-student lock and completion state"))
)]
#[axum::debug_handler]
pub async fn grade_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(grade_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let student = state.user_service.student_for_user(auth.user_id).await?;
    let tasks = state
        .task_service
        .tasks_for_grade(student.id, grade_id)
        .await?;
    Ok(Json(tasks))
}
