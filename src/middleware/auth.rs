use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::Role;
use crate::utils::token::hash_token;
use crate::AppState;

/// Resolved once per request and attached as an extension; handlers never
/// re-query the role.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    /// Digest of the presented token, kept so logout can revoke exactly this session.
    pub token_hash: String,
}

#[derive(Debug, FromRow)]
struct TokenRow {
    user_id: Uuid,
    username: String,
    role: Role,
}

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": code}))).into_response()
}

async fn authenticate(
    state: &AppState,
    headers: &axum::http::HeaderMap,
) -> Result<AuthUser, Response> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(unauthorized("missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(unauthorized("bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(unauthorized("unsupported_scheme"));
    };

    let token_hash = hash_token(token);
    let row = sqlx::query_as::<_, TokenRow>(
        r#"
        SELECT u.id AS user_id, u.username, u.role
        FROM access_tokens t
        JOIN users u ON u.id = t.user_id
        WHERE t.token_hash = $1 AND t.expires_at > NOW()
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(&state.pool)
    .await;

    match row {
        Ok(Some(row)) => Ok(AuthUser {
            user_id: row.user_id,
            username: row.username,
            role: row.role,
            token_hash,
        }),
        Ok(None) => Err(unauthorized("invalid_token")),
        Err(e) => {
            tracing::error!(error = ?e, "token lookup failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal_error"})),
            )
                .into_response())
        }
    }
}

async fn gate(state: AppState, allowed: &[Role], mut req: Request, next: Next) -> Response {
    match authenticate(&state, req.headers()).await {
        Ok(user) => {
            if !allowed.is_empty() && !allowed.contains(&user.role) {
                return (StatusCode::FORBIDDEN, Json(json!({"error": "forbidden"})))
                    .into_response();
            }
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}

pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    gate(state, &[], req, next).await
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    gate(state, &[Role::Admin], req, next).await
}

pub async fn require_teacher(State(state): State<AppState>, req: Request, next: Next) -> Response {
    gate(state, &[Role::Teacher], req, next).await
}

pub async fn require_student(State(state): State<AppState>, req: Request, next: Next) -> Response {
    gate(state, &[Role::Student], req, next).await
}

/// Teacher or admin.
pub async fn require_staff(State(state): State<AppState>, req: Request, next: Next) -> Response {
    gate(state, &[Role::Teacher, Role::Admin], req, next).await
}
