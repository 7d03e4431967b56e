use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::user_dto::UpdateUserPayload, error::Result, middleware::auth::AuthUser, AppState,
};

#[utoipa::path(
    get,
    path = "/api/teachers",
    responses((status = 200, description = "All teacher profiles"))
)]
#[axum::debug_handler]
pub async fn get_all_teachers(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let teachers = state.user_service.list_teachers().await?;
    Ok(Json(json!({"teachers": teachers})))
}

#[utoipa::path(
    get,
    path = "/api/teachers/students",
    responses((status = 200, description = "All student profiles"))
)]
#[axum::debug_handler]
pub async fn get_all_students(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let students = state.user_service.list_students().await?;
    Ok(Json(json!({"students": students})))
}

#[axum::debug_handler]
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let student = state.user_service.get_student(id).await?;
    Ok(Json(student))
}

#[utoipa::path(
    put,
    path = "/api/teachers/users/{id}",
    params(("id" = Uuid, Path, description = "Target user ID")),
    request_body = UpdateUserPayload,
    responses(
        (status = 200, description = "User updated"),
        (status = 403, description = "Role matrix forbids editing this user"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.user_service.update_user(auth.role, id, payload).await?;
    Ok(Json(json!({"message": "User updated successfully"})))
}

#[utoipa::path(
    delete,
    path = "/api/teachers/users/{id}",
    params(("id" = Uuid, Path, description = "Target user ID")),
    responses(
        (status = 200, description = "User deleted; role profile cascades"),
        (status = 403, description = "Role matrix forbids deleting this user"),
        (status = 404, description = "User not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.user_service.delete_user(auth.role, id).await?;
    Ok(Json(json!({"message": "User deleted successfully"})))
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses((status = 200, description = "All user accounts"))
)]
#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users))
}
