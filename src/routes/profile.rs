use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Json},
    Extension,
};
use bytes::Bytes;
use serde_json::json;

use crate::{
    error::{Error, Result},
    middleware::auth::AuthUser,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/profile/me",
    responses((status = 200, description = "Caller's account with role profile"))
)]
#[axum::debug_handler]
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let profile = state.profile_service.me(auth.user_id).await?;
    Ok(Json(profile))
}

async fn picture_from_multipart(mut multipart: Multipart) -> Result<(String, Bytes)> {
    let mut file: Option<(String, Bytes)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("profile_picture") {
            let name = field.file_name().unwrap_or("avatar").to_string();
            let data = field.bytes().await?;
            file = Some((name, data));
        }
    }
    file.ok_or_else(|| Error::Unprocessable("The profile_picture file is required".into()))
}

#[utoipa::path(
    post,
    path = "/api/profile/teacher/upload",
    responses(
        (status = 200, description = "Avatar replaced; URL returned"),
        (status = 422, description = "Missing file, bad extension or over the size cap")
    )
)]
#[axum::debug_handler]
pub async fn upload_teacher_picture(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let teacher = state.user_service.teacher_for_user(auth.user_id).await?;
    let (file_name, data) = picture_from_multipart(multipart).await?;
    let url = state
        .profile_service
        .upload_teacher_picture(teacher.id, &file_name, data)
        .await?;
    Ok(Json(json!({
        "message": "Profile picture updated successfully",
        "profile_picture_url": url,
    })))
}

#[utoipa::path(
    post,
    path = "/api/profile/student/upload",
    responses(
        (status = 200, description = "Avatar replaced; URL returned"),
        (status = 422, description = "Missing file, bad extension or over the size cap")
    )
)]
#[axum::debug_handler]
pub async fn upload_student_picture(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let student = state.user_service.student_for_user(auth.user_id).await?;
    let (file_name, data) = picture_from_multipart(multipart).await?;
    let url = state
        .profile_service
        .upload_student_picture(student.id, &file_name, data)
        .await?;
    Ok(Json(json!({
        "message": "Profile picture updated successfully",
        "profile_picture_url": url,
    })))
}
