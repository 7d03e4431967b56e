use crate::config::get_config;
use crate::dto::material_dto::MaterialResponse;
use crate::error::{Error, Result};
use crate::models::material::MaterialType;
use crate::utils::files::{format_file_size, sanitize_filename};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const MATERIALS_DIR: &str = "task_materials";

/// Per-type validation rules: accepted extensions, size cap, client icon.
struct TypeRule {
    extensions: &'static [&'static str],
    max_bytes: i64,
    icon: &'static str,
}

const fn rule(material_type: MaterialType) -> TypeRule {
    match material_type {
        MaterialType::Pdf => TypeRule {
            extensions: &["pdf"],
            max_bytes: 30 * 1024 * 1024,
            icon: "description",
        },
        MaterialType::Image => TypeRule {
            extensions: &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"],
            max_bytes: 10 * 1024 * 1024,
            icon: "image",
        },
        MaterialType::Video => TypeRule {
            extensions: &["mp4", "avi", "mov", "wmv", "flv", "mkv", "webm"],
            max_bytes: 100 * 1024 * 1024,
            icon: "videocam",
        },
        MaterialType::Audio => TypeRule {
            extensions: &["mp3", "wav", "ogg", "m4a", "aac"],
            max_bytes: 30 * 1024 * 1024,
            icon: "audiotrack",
        },
        MaterialType::Document => TypeRule {
            extensions: &["doc", "docx", "ppt", "pptx", "xls", "xlsx", "txt", "rtf"],
            max_bytes: 30 * 1024 * 1024,
            icon: "article",
        },
        MaterialType::Archive => TypeRule {
            extensions: &["zip", "rar", "7z"],
            max_bytes: 20 * 1024 * 1024,
            icon: "folder",
        },
    }
}

const AUDIO_MIME_TYPES: [&str; 6] = [
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "audio/x-m4a",
    "audio/mp4",
    "audio/aac",
];

/// Explicit hint wins; otherwise the extension is matched against each type's
/// table. None means the file is unsupported.
pub fn determine_type(explicit: Option<MaterialType>, file_name: &str) -> Option<MaterialType> {
    if let Some(hinted) = explicit {
        return Some(hinted);
    }
    let extension = file_name.rsplit('.').next()?.to_ascii_lowercase();
    MaterialType::ALL
        .iter()
        .copied()
        .find(|t| rule(*t).extensions.contains(&extension.as_str()))
}

pub struct UploadMaterial {
    pub class_room_id: Uuid,
    pub material_title: String,
    pub description: Option<String>,
    pub explicit_type: Option<MaterialType>,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, FromRow)]
struct MaterialRow {
    id: Uuid,
    class_room_id: Uuid,
    teacher_id: Uuid,
    teacher_name: String,
    material_title: String,
    material_file_path: String,
    material_type: MaterialType,
    file_size: i64,
    description: Option<String>,
    uploaded_at: DateTime<Utc>,
}

impl From<MaterialRow> for MaterialResponse {
    fn from(row: MaterialRow) -> Self {
        MaterialResponse {
            id: row.id,
            class_room_id: row.class_room_id,
            teacher_id: row.teacher_id,
            teacher_name: row.teacher_name,
            material_title: row.material_title,
            material_file_url: format!("/uploads/{}", row.material_file_path),
            material_type: row.material_type,
            file_icon: rule(row.material_type).icon,
            file_size: format_file_size(row.file_size),
            description: row.description,
            uploaded_at: row.uploaded_at,
        }
    }
}

#[derive(Clone)]
pub struct MaterialService {
    pool: PgPool,
}

impl MaterialService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn upload(
        &self,
        teacher_id: Uuid,
        upload: UploadMaterial,
    ) -> Result<MaterialResponse> {
        let classroom_exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM class_rooms WHERE id = $1)"#)
                .bind(upload.class_room_id)
                .fetch_one(&self.pool)
                .await?;
        if !classroom_exists {
            return Err(Error::NotFound("Classroom not found".into()));
        }

        let material_type = determine_type(upload.explicit_type, &upload.file_name)
            .ok_or_else(|| Error::UnsupportedMedia(upload.file_name.clone()))?;
        let rule = rule(material_type);

        let extension = upload
            .file_name
            .rsplit('.')
            .next()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !rule.extensions.contains(&extension.as_str()) {
            return Err(Error::Unprocessable(format!(
                "The file must be of type: {}",
                rule.extensions.join(",")
            )));
        }
        if upload.data.len() as i64 > rule.max_bytes {
            return Err(Error::Unprocessable(format!(
                "File exceeds the {} limit for {} files",
                format_file_size(rule.max_bytes),
                material_type
            )));
        }
        // Audio is sniffed stricter than the rest: extension and MIME type.
        if material_type == MaterialType::Audio {
            let mime_ok = upload
                .content_type
                .as_deref()
                .map(|m| AUDIO_MIME_TYPES.contains(&m))
                .unwrap_or(false);
            if !mime_ok {
                return Err(Error::Unprocessable(format!(
                    "Invalid MIME type for an audio file: {}",
                    upload.content_type.as_deref().unwrap_or("unknown")
                )));
            }
        }

        let relative_path = format!(
            "{}/{}/{}_{}",
            MATERIALS_DIR,
            material_type,
            Uuid::new_v4(),
            sanitize_filename(&upload.file_name)
        );
        let full_path = std::path::Path::new(&get_config().uploads_dir).join(&relative_path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, &upload.data).await?;

        let row = sqlx::query_as::<_, MaterialRow>(
            r#"
            WITH inserted AS (
                INSERT INTO task_materials (
                    class_room_id, teacher_id, material_title, material_file_path,
                    material_type, file_size, description
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT i.id, i.class_room_id, i.teacher_id, t.teacher_name, i.material_title,
                   i.material_file_path, i.material_type, i.file_size, i.description, i.uploaded_at
            FROM inserted i
            JOIN teachers t ON t.id = i.teacher_id
            "#,
        )
        .bind(upload.class_room_id)
        .bind(teacher_id)
        .bind(&upload.material_title)
        .bind(&relative_path)
        .bind(material_type)
        .bind(upload.data.len() as i64)
        .bind(&upload.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    pub async fn list_by_classroom(&self, class_room_id: Uuid) -> Result<Vec<MaterialResponse>> {
        let rows = sqlx::query_as::<_, MaterialRow>(
            r#"
            SELECT m.id, m.class_room_id, m.teacher_id, t.teacher_name, m.material_title,
                   m.material_file_path, m.material_type, m.file_size, m.description, m.uploaded_at
            FROM task_materials m
            JOIN teachers t ON t.id = m.teacher_id
            WHERE m.class_room_id = $1
            ORDER BY m.uploaded_at DESC
            "#,
        )
        .bind(class_room_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_by_type(
        &self,
        class_room_id: Uuid,
        material_type: MaterialType,
    ) -> Result<Vec<MaterialResponse>> {
        let rows = sqlx::query_as::<_, MaterialRow>(
            r#"
            SELECT m.id, m.class_room_id, m.teacher_id, t.teacher_name, m.material_title,
                   m.material_file_path, m.material_type, m.file_size, m.description, m.uploaded_at
            FROM task_materials m
            JOIN teachers t ON t.id = m.teacher_id
            WHERE m.class_room_id = $1 AND m.material_type = $2
            ORDER BY m.uploaded_at DESC
            "#,
        )
        .bind(class_room_id)
        .bind(material_type)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Materials of the caller's current classroom; empty when unenrolled.
    pub async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<MaterialResponse>> {
        let class_room_id: Option<Uuid> =
            sqlx::query_scalar(r#"SELECT class_room_id FROM students WHERE id = $1"#)
                .bind(student_id)
                .fetch_one(&self.pool)
                .await?;

        match class_room_id {
            Some(id) => self.list_by_classroom(id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Uploader-scoped delete: removes the blob, then the metadata row.
    pub async fn delete(&self, teacher_id: Uuid, material_id: Uuid) -> Result<()> {
        let path: Option<String> = sqlx::query_scalar(
            r#"SELECT material_file_path FROM task_materials WHERE id = $1 AND teacher_id = $2"#,
        )
        .bind(material_id)
        .bind(teacher_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(path) = path else {
            return Err(Error::NotFound("Material not found".into()));
        };

        let full_path = std::path::Path::new(&get_config().uploads_dir).join(&path);
        let _ = tokio::fs::remove_file(full_path).await;

        sqlx::query(r#"DELETE FROM task_materials WHERE id = $1"#)
            .bind(material_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_type_hint_wins() {
        assert_eq!(
            determine_type(Some(MaterialType::Document), "notes.pdf"),
            Some(MaterialType::Document)
        );
    }

    #[test]
    fn type_detected_from_extension() {
        assert_eq!(determine_type(None, "lesson.PDF"), Some(MaterialType::Pdf));
        assert_eq!(determine_type(None, "song.M4A"), Some(MaterialType::Audio));
        assert_eq!(determine_type(None, "clip.webm"), Some(MaterialType::Video));
        assert_eq!(
            determine_type(None, "slides.pptx"),
            Some(MaterialType::Document)
        );
        assert_eq!(
            determine_type(None, "bundle.7z"),
            Some(MaterialType::Archive)
        );
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert_eq!(determine_type(None, "setup.exe"), None);
        assert_eq!(determine_type(None, "no_extension"), None);
    }
}
