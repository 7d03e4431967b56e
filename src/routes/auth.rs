use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::auth_dto::{
        AdminLoginPayload, LoginPayload, RegisterAdminPayload, RegisterStudentPayload,
        RegisterTeacherPayload,
    },
    error::Result,
    middleware::auth::AuthUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/register/admin",
    request_body = RegisterAdminPayload,
    responses(
        (status = 201, description = "Admin registered"),
        (status = 422, description = "Validation failed or identifier taken")
    )
)]
#[axum::debug_handler]
pub async fn register_admin(
    State(state): State<AppState>,
    Json(payload): Json<RegisterAdminPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.auth_service.register_admin(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Admin registered"})),
    ))
}

#[utoipa::path(
    post,
    path = "/api/register/teacher",
    request_body = RegisterTeacherPayload,
    responses(
        (status = 201, description = "Teacher registered"),
        (status = 422, description = "Validation failed or identifier taken")
    )
)]
#[axum::debug_handler]
pub async fn register_teacher(
    State(state): State<AppState>,
    Json(payload): Json<RegisterTeacherPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.auth_service.register_teacher(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Teacher registered"})),
    ))
}

#[utoipa::path(
    post,
    path = "/api/register/student",
    request_body = RegisterStudentPayload,
    responses(
        (status = 201, description = "Student registered"),
        (status = 422, description = "Validation failed or identifier taken")
    )
)]
#[axum::debug_handler]
pub async fn register_student(
    State(state): State<AppState>,
    Json(payload): Json<RegisterStudentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.auth_service.register_student(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Student registered"})),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token issued"),
        (status = 401, description = "Invalid credentials")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state
        .auth_service
        .login(&state.classroom_service, payload)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/admin/login",
    request_body = AdminLoginPayload,
    responses(
        (status = 200, description = "Token issued"),
        (status = 401, description = "Invalid credentials, or step-2 challenge when the security code is missing")
    )
)]
#[axum::debug_handler]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let response = state.auth_service.admin_login(payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Current token revoked"))
)]
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    state.auth_service.revoke_token(&auth.token_hash).await?;
    Ok(Json(json!({"message": "Logged out"})))
}
