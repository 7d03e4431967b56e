use std::env;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "test-material-boundary";

fn text_part(body: &mut Vec<u8>, name: &str, value: &str) {
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
        .as_bytes(),
    );
}

fn file_part(body: &mut Vec<u8>, filename: &str, content_type: &str, data: &[u8]) {
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"material_file\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
}

fn close_multipart(body: &mut Vec<u8>) {
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
}

fn upload_request(class_id: Uuid, title: &str, auth: &str, file: (&str, &str, &[u8])) -> Request<Body> {
    let mut body = Vec::new();
    text_part(&mut body, "class_room_id", &class_id.to_string());
    text_part(&mut body, "material_title", title);
    let (filename, content_type, data) = file;
    file_part(&mut body, filename, content_type, data);
    close_multipart(&mut body);

    Request::builder()
        .method("POST")
        .uri("/api/teachers/materials")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("authorization", auth)
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), 16 * 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn material_store_end_to_end() {
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

    // Teacher with a classroom.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/register/teacher")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "teacher_username": format!("mat_{suffix}"),
                        "teacher_email": format!("mat_{suffix}@example.com"),
                        "teacher_password": "password123",
                        "teacher_name": "Material Teacher",
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
                    json!({"login": format!("mat_{suffix}"), "password": "password123"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let login = json_body(resp).await;
    let teacher_auth = format!("Bearer {}", login["token"].as_str().unwrap());

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/classrooms")
                .header("content-type", "application/json")
                .header("authorization", teacher_auth.clone())
                .body(Body::from(
                    json!({
                        "class_name": "Media Class",
                        "grade_level": "Grade 5",
                        "section": "C",
                        "school_year": "2025-2026"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let classroom = json_body(resp).await;
    let class_id = Uuid::parse_str(classroom["id"].as_str().unwrap()).unwrap();
    let code = classroom["classroom_code"].as_str().unwrap().to_string();

    // A pdf upload with no explicit type hint is detected by extension.
    let resp = app
        .clone()
        .oneshot(upload_request(
            class_id,
            "Reading Worksheet",
            &teacher_auth,
            ("worksheet.pdf", "application/pdf", b"%PDF-1.4 test"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let material = json_body(resp).await;
    let material_id = Uuid::parse_str(material["id"].as_str().unwrap()).unwrap();
    assert_eq!(material["material_type"], "pdf");
    assert_eq!(material["file_icon"], "description");
    assert!(material["material_file_url"]
        .as_str()
        .unwrap()
        .starts_with("/uploads/task_materials/pdf/"));
    assert_eq!(material["teacher_name"], "Material Teacher");

    // Unknown extension with no hint is unsupported media.
    let resp = app
        .clone()
        .oneshot(upload_request(
            class_id,
            "Installer",
            &teacher_auth,
            ("setup.exe", "application/octet-stream", b"MZ"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    // Audio must also carry an allow-listed MIME type.
    let resp = app
        .clone()
        .oneshot(upload_request(
            class_id,
            "Listening Drill",
            &teacher_auth,
            ("drill.mp3", "text/plain", b"not really audio"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app
        .clone()
        .oneshot(upload_request(
            class_id,
            "Listening Drill",
            &teacher_auth,
            ("drill.mp3", "audio/mpeg", b"ID3 fake mp3"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // The per-type size cap rejects an oversized image (10 MB limit).
    let oversized = vec![0u8; 10 * 1024 * 1024 + 1];
    let resp = app
        .clone()
        .oneshot(upload_request(
            class_id,
            "Huge Poster",
            &teacher_auth,
            ("poster.png", "image/png", &oversized),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Classroom listing and the type filter.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/teachers/materials/{}", class_id))
                .header("authorization", teacher_auth.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let listed = json_body(resp).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/api/teachers/materials/{}/type/pdf", class_id))
                .header("authorization", teacher_auth.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let pdfs = json_body(resp).await;
    assert_eq!(pdfs.as_array().unwrap().len(), 1);

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!(
                    "/api/teachers/materials/{}/type/spreadsheet",
                    class_id
                ))
                .header("authorization", teacher_auth.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Student sees nothing until enrolled, then the classroom's materials.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/register/student")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "student_username": format!("mstud_{suffix}"),
                        "student_password": "password123",
                        "student_name": "Material Student",
                        "student_lrn": format!("mlrn{suffix}"),
                        "student_grade": "Grade 5",
                        "student_section": "C"
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
                    json!({"login": format!("mstud_{suffix}"), "password": "password123"})
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
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/students/materials")
                .header("authorization", student_auth.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let before_join = json_body(resp).await;
    assert!(before_join.as_array().unwrap().is_empty());

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/classrooms/join")
                .header("content-type", "application/json")
                .header("authorization", student_auth.clone())
                .body(Body::from(json!({"classroom_code": code}).to_string()))
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
                .uri("/api/students/materials")
                .header("authorization", student_auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let after_join = json_body(resp).await;
    assert_eq!(after_join.as_array().unwrap().len(), 2);

    // Another teacher cannot delete someone else's upload.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/register/teacher")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "teacher_username": format!("mat2_{suffix}"),
                        "teacher_email": format!("mat2_{suffix}@example.com"),
                        "teacher_password": "password123",
                        "teacher_name": "Other Teacher",
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
                    json!({"login": format!("mat2_{suffix}"), "password": "password123"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let login = json_body(resp).await;
    let other_auth = format!("Bearer {}", login["token"].as_str().unwrap());

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/teachers/materials/{}", material_id))
                .header("authorization", other_auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // The uploader can.
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/teachers/materials/{}", material_id))
                .header("authorization", teacher_auth.clone())
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
                .uri(format!("/api/teachers/materials/{}/type/pdf", class_id))
                .header("authorization", teacher_auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let remaining = json_body(resp).await;
    assert!(remaining.as_array().unwrap().is_empty());
}
