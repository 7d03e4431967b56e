use crate::config::get_config;
use crate::dto::profile_dto::ProfileMeResponse;
use crate::error::{Error, Result};
use crate::models::profile::{AdminProfile, StudentProfile, TeacherProfile};
use crate::models::user::{Role, User};
use crate::utils::files::sanitize_filename;
use bytes::Bytes;
use sqlx::PgPool;
use uuid::Uuid;

const PICTURE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
const PICTURE_MAX_BYTES: usize = 2 * 1024 * 1024;
const PICTURE_DIR: &str = "profile_images";

pub fn profile_picture_url(file_name: String) -> String {
    format!("/uploads/{}/{}", PICTURE_DIR, file_name)
}

/// Avatar uploads and the caller's own composed profile view.
#[derive(Clone)]
pub struct ProfileService {
    pool: PgPool,
}

impl ProfileService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The caller's account plus role profile, with picture filenames already
    /// rendered as servable URLs.
    pub async fn me(&self, user_id: Uuid) -> Result<ProfileMeResponse> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let response = match user.role {
            Role::Admin => {
                let admin = sqlx::query_as::<_, AdminProfile>(
                    r#"SELECT * FROM admins WHERE user_id = $1"#,
                )
                .bind(user.id)
                .fetch_optional(&self.pool)
                .await?;
                ProfileMeResponse::admin(user, admin)
            }
            Role::Teacher => {
                let teacher = sqlx::query_as::<_, TeacherProfile>(
                    r#"SELECT * FROM teachers WHERE user_id = $1"#,
                )
                .bind(user.id)
                .fetch_optional(&self.pool)
                .await?
                .map(|mut t| {
                    t.profile_picture = t.profile_picture.take().map(profile_picture_url);
                    t
                });
                ProfileMeResponse::teacher(user, teacher)
            }
            Role::Student => {
                let student = sqlx::query_as::<_, StudentProfile>(
                    r#"SELECT * FROM students WHERE user_id = $1"#,
                )
                .bind(user.id)
                .fetch_optional(&self.pool)
                .await?
                .map(|mut s| {
                    s.profile_picture = s.profile_picture.take().map(profile_picture_url);
                    s
                });
                ProfileMeResponse::student(user, student)
            }
        };
        Ok(response)
    }

    pub async fn upload_teacher_picture(
        &self,
        teacher_id: Uuid,
        file_name: &str,
        data: Bytes,
    ) -> Result<String> {
        let previous: Option<String> =
            sqlx::query_scalar(r#"SELECT profile_picture FROM teachers WHERE id = $1"#)
                .bind(teacher_id)
                .fetch_one(&self.pool)
                .await?;

        let stored_name = self.store_picture(file_name, data).await?;

        sqlx::query(
            r#"UPDATE teachers SET profile_picture = $2, updated_at = NOW() WHERE id = $1"#,
        )
        .bind(teacher_id)
        .bind(&stored_name)
        .execute(&self.pool)
        .await?;

        self.remove_old(previous).await;
        Ok(profile_picture_url(stored_name))
    }

    pub async fn upload_student_picture(
        &self,
        student_id: Uuid,
        file_name: &str,
        data: Bytes,
    ) -> Result<String> {
        let previous: Option<String> =
            sqlx::query_scalar(r#"SELECT profile_picture FROM students WHERE id = $1"#)
                .bind(student_id)
                .fetch_one(&self.pool)
                .await?;

        let stored_name = self.store_picture(file_name, data).await?;

        sqlx::query(
            r#"UPDATE students SET profile_picture = $2, updated_at = NOW() WHERE id = $1"#,
        )
        .bind(student_id)
        .bind(&stored_name)
        .execute(&self.pool)
        .await?;

        self.remove_old(previous).await;
        Ok(profile_picture_url(stored_name))
    }

    async fn store_picture(&self, file_name: &str, data: Bytes) -> Result<String> {
        let extension = file_name
            .rsplit('.')
            .next()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !PICTURE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(Error::Unprocessable(
                "Profile picture must be jpg, jpeg, png or webp".into(),
            ));
        }
        if data.len() > PICTURE_MAX_BYTES {
            return Err(Error::Unprocessable(
                "Profile picture exceeds the 2 MB limit".into(),
            ));
        }

        let stored_name = format!("{}_{}", Uuid::new_v4(), sanitize_filename(file_name));
        let dir = std::path::Path::new(&get_config().uploads_dir).join(PICTURE_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&stored_name), &data).await?;
        Ok(stored_name)
    }

    async fn remove_old(&self, previous: Option<String>) {
        if let Some(old) = previous {
            let dir = std::path::Path::new(&get_config().uploads_dir).join(PICTURE_DIR);
            let _ = tokio::fs::remove_file(dir.join(old)).await;
        }
    }
}
