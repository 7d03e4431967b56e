use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "test-profile-boundary";

fn picture_request(uri: &str, auth: &str, filename: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"profile_picture\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("authorization", auth)
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 4 * 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn profile_read_and_picture_upload() {
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

    // /api/profile/me requires a bearer token.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/profile/me")
                .body(Body::empty())
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
                .uri("/api/register/teacher")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "teacher_username": format!("prof_{suffix}"),
                        "teacher_email": format!("prof_{suffix}@example.com"),
                        "teacher_password": "password123",
                        "teacher_name": "Profile Teacher",
                        "teacher_position": "Adviser"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"login": format!("prof_{suffix}"), "password": "password123"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let login = json_body(resp).await;
    let teacher_auth = format!("Bearer {}", login["token"].as_str().unwrap());

    // A fresh account has no avatar.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/profile/me")
                .header("authorization", teacher_auth.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let me = json_body(resp).await;
    assert_eq!(me["role"], "teacher");
    assert_eq!(me["details"]["teacher_name"], "Profile Teacher");
    assert!(me["details"]["profile_picture"].is_null());

    // Only image extensions are accepted, and only up to 2 MB.
    let resp = app
        .clone()
        .oneshot(picture_request(
            "/api/profile/teacher/upload",
            &teacher_auth,
            "notes.txt",
            b"plain text",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let oversized = vec![0u8; 2 * 1024 * 1024 + 1];
    let resp = app
        .clone()
        .oneshot(picture_request(
            "/api/profile/teacher/upload",
            &teacher_auth,
            "big.png",
            &oversized,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app
        .clone()
        .oneshot(picture_request(
            "/api/profile/teacher/upload",
            &teacher_auth,
            "avatar.png",
            b"fake png bytes",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let uploaded = json_body(resp).await;
    let url = uploaded["profile_picture_url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/profile_images/"));

    // The stored avatar is rendered as a URL on subsequent reads.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/profile/me")
                .header("authorization", teacher_auth.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let me = json_body(resp).await;
    assert_eq!(me["details"]["profile_picture"].as_str().unwrap(), url);

    // The teacher upload route is closed to students, and vice versa the
    // student route stores under the student's profile.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/register/student")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "student_username": format!("pstud_{suffix}"),
                        "student_password": "password123",
                        "student_name": "Profile Student",
                        "student_lrn": format!("plrn{suffix}"),
                        "student_grade": "Grade 3",
                        "student_section": "A"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"login": format!("pstud_{suffix}"), "password": "password123"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let login = json_body(resp).await;
    let student_auth = format!("Bearer {}", login["token"].as_str().unwrap());

    let resp = app
        .clone()
        .oneshot(picture_request(
            "/api/profile/teacher/upload",
            &student_auth,
            "avatar.png",
            b"fake png bytes",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .clone()
        .oneshot(picture_request(
            "/api/profile/student/upload",
            &student_auth,
            "avatar.jpg",
            b"fake jpg bytes",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let uploaded = json_body(resp).await;
    assert!(uploaded["profile_picture_url"]
        .as_str()
        .unwrap()
        .starts_with("/uploads/profile_images/"));

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/profile/me")
                .header("authorization", student_auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let me = json_body(resp).await;
    assert_eq!(me["role"], "student");
    assert!(me["details"]["profile_picture"]
        .as_str()
        .unwrap()
        .starts_with("/uploads/profile_images/"));
}
