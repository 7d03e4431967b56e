use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn admin_two_phase_login_and_logout() {
    dotenvy::dotenv().ok();
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("TOKEN_TTL_SECS", "3600");
    env::set_var("AUTH_RPS", "100");
    env::set_var("UPLOADS_DIR", "target/test-uploads");

    classroom_backend::config::init_config().expect("init config");

    let pool = classroom_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let app = classroom_backend::build_router(classroom_backend::AppState::new(pool.clone()));

    let suffix = Uuid::new_v4().simple().to_string();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/register/admin")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "username": format!("admin_{suffix}"),
                        "admin_email": format!("admin_{suffix}@example.com"),
                        "admin_password": "password123",
                        "admin_security_code": "sesame-42"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Step 1: correct password, no security code. The response is a 401
    // challenge carrying "step": 2, not a terminal rejection.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/admin/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "login": format!("admin_{suffix}"),
                        "password": "password123"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let challenge: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(challenge["step"], 2);

    // A wrong security code is a plain 401 with no challenge marker.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/admin/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "login": format!("admin_{suffix}"),
                        "password": "password123",
                        "admin_security_code": "wrong-code"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let rejected: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert!(rejected.get("step").is_none());

    // Step 2: both factors correct.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/admin/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "login": format!("admin_{suffix}"),
                        "password": "password123",
                        "admin_security_code": "sesame-42"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let login: JsonValue = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(login["role"], "admin");
    let admin_auth = format!("Bearer {}", login["token"].as_str().unwrap());
    let admin_user_id = Uuid::parse_str(login["user"]["id"].as_str().unwrap()).unwrap();

    // Expired rows are swept whenever a new token is issued.
    let stale_hash = format!("stale_{suffix}");
    sqlx::query(
        r#"
        INSERT INTO access_tokens (user_id, token_hash, expires_at)
        VALUES ($1, $2, NOW() - INTERVAL '1 hour')
        "#,
    )
    .bind(admin_user_id)
    .bind(&stale_hash)
    .execute(&pool)
    .await
    .unwrap();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/admin/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "login": format!("admin_{suffix}"),
                        "password": "password123",
                        "admin_security_code": "sesame-42"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let stale_remains: bool =
        sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM access_tokens WHERE token_hash = $1)"#)
            .bind(&stale_hash)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(!stale_remains);

    // The token works against an admin-only route.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/users")
                .header("authorization", admin_auth.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Logout revokes exactly this token.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header("authorization", admin_auth.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/users")
                .header("authorization", admin_auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Wrong password and unknown identifier both come back 401, never 404.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "login": format!("admin_{suffix}"),
                        "password": "not-the-password"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "login": format!("nobody_{suffix}"),
                        "password": "password123"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Missing bearer token on a protected route.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/grades")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Health stays open.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
