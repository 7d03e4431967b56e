use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use bytes::Bytes;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::classroom_dto::{
        AssignStudentPayload, CreateClassroomPayload, JoinClassPayload, UnassignStudentPayload,
        UpdateClassroomPayload,
    },
    error::{Error, Result},
    middleware::auth::AuthUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/classrooms",
    request_body = CreateClassroomPayload,
    responses(
        (status = 201, description = "Classroom created with a generated enrollment code"),
        (status = 422, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_classroom(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateClassroomPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let teacher = state.user_service.teacher_for_user(auth.user_id).await?;
    let classroom = state.classroom_service.create(teacher.id, payload).await?;
    Ok((StatusCode::CREATED, Json(classroom)))
}

#[utoipa::path(
    get,
    path = "/api/classrooms",
    responses((status = 200, description = "Caller's classrooms"))
)]
#[axum::debug_handler]
pub async fn list_classrooms(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let teacher = state.user_service.teacher_for_user(auth.user_id).await?;
    let classrooms = state.classroom_service.list_for_teacher(teacher.id).await?;
    Ok(Json(classrooms))
}

#[utoipa::path(
    get,
    path = "/api/classrooms/{id}",
    params(("id" = Uuid, Path, description = "Classroom ID")),
    responses(
        (status = 200, description = "Classroom with roster"),
        (status = 404, description = "Classroom not found or not owned")
    )
)]
#[axum::debug_handler]
pub async fn get_classroom(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let teacher = state.user_service.teacher_for_user(auth.user_id).await?;
    let detail = state.classroom_service.get_detail(id, teacher.id).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    put,
    path = "/api/classrooms/{id}",
    params(("id" = Uuid, Path, description = "Classroom ID")),
    request_body = UpdateClassroomPayload,
    responses(
        (status = 200, description = "Classroom updated"),
        (status = 404, description = "Classroom not found or not owned")
    )
)]
#[axum::debug_handler]
pub async fn update_classroom(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClassroomPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let teacher = state.user_service.teacher_for_user(auth.user_id).await?;
    let classroom = state
        .classroom_service
        .update(id, teacher.id, payload)
        .await?;
    Ok(Json(classroom))
}

#[utoipa::path(
    delete,
    path = "/api/classrooms/{id}",
    params(("id" = Uuid, Path, description = "Classroom ID")),
    responses(
        (status = 200, description = "Classroom deleted; students unassigned"),
        (status = 404, description = "Classroom not found or not owned")
    )
)]
#[axum::debug_handler]
pub async fn delete_classroom(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let teacher = state.user_service.teacher_for_user(auth.user_id).await?;
    state.classroom_service.delete(id, teacher.id).await?;
    Ok(Json(json!({"message": "Class deleted successfully"})))
}

#[utoipa::path(
    post,
    path = "/api/classrooms/assign-student",
    request_body = AssignStudentPayload,
    responses(
        (status = 200, description = "Student assigned"),
        (status = 404, description = "Classroom not owned or student unknown"),
        (status = 409, description = "Student already assigned to a class")
    )
)]
#[axum::debug_handler]
pub async fn assign_student(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<AssignStudentPayload>,
) -> Result<impl IntoResponse> {
    let teacher = state.user_service.teacher_for_user(auth.user_id).await?;
    state
        .enrollment_service
        .assign_student(teacher.id, payload)
        .await?;
    Ok(Json(
        json!({"message": "Student assigned to class successfully"}),
    ))
}

#[utoipa::path(
    post,
    path = "/api/classrooms/unassign-student",
    responses(
        (status = 200, description = "Student unassigned"),
        (status = 404, description = "Student not enrolled in a caller-owned class")
    )
)]
#[axum::debug_handler]
pub async fn unassign_student(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UnassignStudentPayload>,
) -> Result<impl IntoResponse> {
    let teacher = state.user_service.teacher_for_user(auth.user_id).await?;
    state
        .enrollment_service
        .unassign_student(teacher.id, payload.student_id)
        .await?;
    Ok(Json(
        json!({"message": "Student unassigned from class successfully"}),
    ))
}

#[axum::debug_handler]
pub async fn get_assigned_students(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let teacher = state.user_service.teacher_for_user(auth.user_id).await?;
    let students = state.classroom_service.roster(id, teacher.id).await?;
    Ok(Json(json!({"class_id": id, "students": students})))
}

#[axum::debug_handler]
pub async fn get_unassigned_students(
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let students = state.classroom_service.unassigned_students().await?;
    Ok(Json(json!({"unassigned_students": students})))
}

#[axum::debug_handler]
pub async fn upload_background(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let teacher = state.user_service.teacher_for_user(auth.user_id).await?;

    let mut file: Option<(String, Bytes)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("background_image") {
            let name = field.file_name().unwrap_or("background").to_string();
            let data = field.bytes().await?;
            file = Some((name, data));
        }
    }
    let (file_name, data) = file.ok_or_else(|| {
        Error::Unprocessable("The background_image file is required".into())
    })?;

    let url = state
        .classroom_service
        .upload_background(id, teacher.id, &file_name, data)
        .await?;
    Ok(Json(json!({
        "message": "Background updated successfully",
        "background_image_url": url,
    })))
}

#[utoipa::path(
    post,
    path = "/api/classrooms/join",
    request_body = JoinClassPayload,
    responses(
        (status = 200, description = "Joined; classroom and teacher summary returned"),
        (status = 404, description = "No classroom with that code"),
        (status = 409, description = "Already enrolled in a classroom"),
        (status = 422, description = "Grade or section mismatch")
    )
)]
#[axum::debug_handler]
pub async fn join_class(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<JoinClassPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let student = state.user_service.student_for_user(auth.user_id).await?;
    let summary = state
        .enrollment_service
        .join_class(&state.classroom_service, student.id, payload)
        .await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/students/my-classes",
    responses(
        (status = 200, description = "Caller's current classroom"),
        (status = 404, description = "Not assigned to any class")
    )
)]
#[axum::debug_handler]
pub async fn my_classes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let student = state.user_service.student_for_user(auth.user_id).await?;
    let summary = state
        .classroom_service
        .student_class_summary(student.id)
        .await?
        .ok_or_else(|| Error::NotFound("Student is not assigned to any class".into()))?;
    Ok(Json(json!({"data": [summary]})))
}
