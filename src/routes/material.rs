use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    middleware::auth::AuthUser,
    models::material::MaterialType,
    services::material_service::UploadMaterial,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/teachers/materials",
    responses(
        (status = 201, description = "Material stored and metadata recorded"),
        (status = 415, description = "Unsupported file type"),
        (status = 422, description = "Missing field, size cap exceeded, or bad MIME type")
    )
)]
#[axum::debug_handler]
pub async fn upload_material(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let teacher = state.user_service.teacher_for_user(auth.user_id).await?;

    let mut class_room_id: Option<Uuid> = None;
    let mut material_title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut explicit_type: Option<MaterialType> = None;
    let mut file: Option<(String, Option<String>, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("class_room_id") => {
                let raw = field.text().await?;
                class_room_id = Some(raw.parse().map_err(|_| {
                    Error::Unprocessable("class_room_id must be a valid UUID".into())
                })?);
            }
            Some("material_title") => material_title = Some(field.text().await?),
            Some("description") => description = Some(field.text().await?),
            Some("material_type") => {
                let raw = field.text().await?;
                explicit_type = Some(raw.parse().map_err(|_| {
                    Error::Unprocessable(format!("Unknown material_type: {}", raw))
                })?);
            }
            Some("material_file") => {
                let file_name = field
                    .file_name()
                    .ok_or_else(|| {
                        Error::Unprocessable("material_file must have a filename".into())
                    })?
                    .to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                file = Some((file_name, content_type, data));
            }
            _ => {}
        }
    }

    let class_room_id = class_room_id
        .ok_or_else(|| Error::Unprocessable("The class_room_id field is required".into()))?;
    let material_title = material_title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::Unprocessable("The material_title field is required".into()))?;
    let (file_name, content_type, data) =
        file.ok_or_else(|| Error::Unprocessable("The material_file field is required".into()))?;

    let material = state
        .material_service
        .upload(
            teacher.id,
            UploadMaterial {
                class_room_id,
                material_title,
                description,
                explicit_type,
                file_name,
                content_type,
                data,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(material)))
}

#[utoipa::path(
    get,
    path = "/api/teachers/materials/{id}",
    params(("id" = Uuid, Path, description = "Classroom ID")),
    responses((status = 200, description = "Materials for the classroom, newest first"))
)]
#[axum::debug_handler]
pub async fn get_by_classroom(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let materials = state.material_service.list_by_classroom(id).await?;
    Ok(Json(materials))
}

#[axum::debug_handler]
pub async fn get_by_type(
    State(state): State<AppState>,
    Path((id, material_type)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse> {
    let material_type: MaterialType = material_type
        .parse()
        .map_err(|_| Error::BadRequest("Invalid material type".into()))?;
    let materials = state
        .material_service
        .list_by_type(id, material_type)
        .await?;
    Ok(Json(materials))
}

#[utoipa::path(
    get,
    path = "/api/students/materials",
    responses((status = 200, description = "Materials of the caller's classroom"))
)]
#[axum::debug_handler]
pub async fn my_classroom_materials(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let student = state.user_service.student_for_user(auth.user_id).await?;
    let materials = state.material_service.list_for_student(student.id).await?;
    Ok(Json(materials))
}

#[utoipa::path(
    delete,
    path = "/api/teachers/materials/{id}",
    params(("id" = Uuid, Path, description = "Material ID")),
    responses(
        (status = 200, description = "Material deleted"),
        (status = 404, description = "Material not found or not uploaded by the caller")
    )
)]
#[axum::debug_handler]
pub async fn delete_material(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let teacher = state.user_service.teacher_for_user(auth.user_id).await?;
    state.material_service.delete(teacher.id, id).await?;
    Ok(Json(
        serde_json::json!({"message": "Material deleted successfully"}),
    ))
}
