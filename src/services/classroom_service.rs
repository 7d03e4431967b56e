use crate::config::get_config;
use crate::dto::classroom_dto::{
    ClassroomDetailResponse, ClassroomSummary, CreateClassroomPayload, StudentClassSummary,
    StudentSummary, UpdateClassroomPayload,
};
use crate::error::{Error, Result};
use crate::models::classroom::Classroom;
use crate::services::profile_service::profile_picture_url;
use crate::utils::files::sanitize_filename;
use crate::utils::token::generate_classroom_code;
use bytes::Bytes;
use sqlx::PgPool;
use uuid::Uuid;

const BACKGROUND_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
const BACKGROUND_MAX_BYTES: usize = 5 * 1024 * 1024;
const BACKGROUND_DIR: &str = "class_backgrounds";

#[derive(Clone)]
pub struct ClassroomService {
    pool: PgPool,
}

impl ClassroomService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a classroom with a fresh 8-character code. The unique
    /// constraint is the reservation; on a collision the insert is retried
    /// with a new code, so concurrent creates can never share one.
    pub async fn create(
        &self,
        teacher_id: Uuid,
        payload: CreateClassroomPayload,
    ) -> Result<Classroom> {
        loop {
            let code = generate_classroom_code();
            let inserted = sqlx::query_as::<_, Classroom>(
                r#"
                INSERT INTO class_rooms (teacher_id, class_name, grade_level, section, school_year, classroom_code)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(teacher_id)
            .bind(&payload.class_name)
            .bind(&payload.grade_level)
            .bind(&payload.section)
            .bind(&payload.school_year)
            .bind(&code)
            .fetch_one(&self.pool)
            .await;

            match inserted {
                Ok(classroom) => return Ok(classroom),
                Err(sqlx::Error::Database(db))
                    if db.constraint() == Some("class_rooms_classroom_code_key") =>
                {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn list_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<ClassroomSummary>> {
        let mut rows = sqlx::query_as::<_, ClassroomSummary>(
            r#"
            SELECT
                c.id, c.class_name, c.grade_level, c.section, c.school_year,
                (SELECT COUNT(*) FROM students s WHERE s.class_room_id = c.id) AS student_count,
                t.teacher_name, c.classroom_code, c.background_image
            FROM class_rooms c
            JOIN teachers t ON t.id = c.teacher_id
            WHERE c.teacher_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        for row in &mut rows {
            row.background_image = row.background_image.take().map(background_url);
        }
        Ok(rows)
    }

    /// Owner-scoped detail with the enrolled roster. Non-owned classrooms look
    /// absent rather than forbidden.
    pub async fn get_detail(
        &self,
        id: Uuid,
        teacher_id: Uuid,
    ) -> Result<ClassroomDetailResponse> {
        let mut summary = sqlx::query_as::<_, ClassroomSummary>(
            r#"
            SELECT
                c.id, c.class_name, c.grade_level, c.section, c.school_year,
                (SELECT COUNT(*) FROM students s WHERE s.class_room_id = c.id) AS student_count,
                t.teacher_name, c.classroom_code, c.background_image
            FROM class_rooms c
            JOIN teachers t ON t.id = c.teacher_id
            WHERE c.id = $1 AND c.teacher_id = $2
            "#,
        )
        .bind(id)
        .bind(teacher_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Classroom not found".into()))?;
        summary.background_image = summary.background_image.take().map(background_url);

        let students = self.roster_unchecked(id).await?;
        Ok(ClassroomDetailResponse { summary, students })
    }

    pub async fn update(
        &self,
        id: Uuid,
        teacher_id: Uuid,
        payload: UpdateClassroomPayload,
    ) -> Result<Classroom> {
        let updated = sqlx::query_as::<_, Classroom>(
            r#"
            UPDATE class_rooms
            SET
                class_name = COALESCE($3, class_name),
                grade_level = COALESCE($4, grade_level),
                section = COALESCE($5, section),
                school_year = COALESCE($6, school_year),
                updated_at = NOW()
            WHERE id = $1 AND teacher_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(teacher_id)
        .bind(&payload.class_name)
        .bind(&payload.grade_level)
        .bind(&payload.section)
        .bind(&payload.school_year)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| Error::NotFound("Classroom not found".into()))
    }

    /// Unassigns every enrolled student before removal; student records are
    /// never deleted with their classroom.
    pub async fn delete(&self, id: Uuid, teacher_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<Uuid> =
            sqlx::query_scalar(r#"SELECT id FROM class_rooms WHERE id = $1 AND teacher_id = $2"#)
                .bind(id)
                .bind(teacher_id)
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            return Err(Error::NotFound("Classroom not found".into()));
        }

        sqlx::query(
            r#"UPDATE students SET class_room_id = NULL, updated_at = NOW() WHERE class_room_id = $1"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(r#"DELETE FROM class_rooms WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn roster(&self, classroom_id: Uuid, teacher_id: Uuid) -> Result<Vec<StudentSummary>> {
        let owned: Option<Uuid> = sqlx::query_scalar(
            r#"SELECT id FROM class_rooms WHERE id = $1 AND teacher_id = $2"#,
        )
        .bind(classroom_id)
        .bind(teacher_id)
        .fetch_optional(&self.pool)
        .await?;
        if owned.is_none() {
            return Err(Error::NotFound("Classroom not found".into()));
        }
        self.roster_unchecked(classroom_id).await
    }

    pub async fn unassigned_students(&self) -> Result<Vec<StudentSummary>> {
        let mut students = sqlx::query_as::<_, StudentSummary>(
            r#"
            SELECT s.id, s.student_name, s.student_grade, s.student_section, s.student_lrn,
                   u.username, s.profile_picture, s.class_room_id
            FROM students s
            JOIN users u ON u.id = s.user_id
            WHERE s.class_room_id IS NULL
            ORDER BY s.student_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        for student in &mut students {
            student.profile_picture = student.profile_picture.take().map(profile_picture_url);
        }
        Ok(students)
    }

    /// Current classroom of a student, with the owning teacher's details.
    /// None when the student is not enrolled anywhere.
    pub async fn student_class_summary(
        &self,
        student_id: Uuid,
    ) -> Result<Option<StudentClassSummary>> {
        let summary = sqlx::query_as::<_, StudentClassSummary>(
            r#"
            SELECT
                c.id, c.class_name, c.grade_level, c.section, c.classroom_code,
                t.teacher_name, t.teacher_email, t.teacher_position,
                t.profile_picture AS teacher_avatar,
                c.background_image
            FROM students s
            JOIN class_rooms c ON c.id = s.class_room_id
            JOIN teachers t ON t.id = c.teacher_id
            WHERE s.id = $1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(summary.map(|mut s| {
            s.teacher_avatar = s.teacher_avatar.take().map(profile_picture_url);
            s.background_image = s.background_image.take().map(background_url);
            s
        }))
    }

    pub async fn class_summary(&self, classroom_id: Uuid) -> Result<StudentClassSummary> {
        let mut summary = sqlx::query_as::<_, StudentClassSummary>(
            r#"
            SELECT
                c.id, c.class_name, c.grade_level, c.section, c.classroom_code,
                t.teacher_name, t.teacher_email, t.teacher_position,
                t.profile_picture AS teacher_avatar,
                c.background_image
            FROM class_rooms c
            JOIN teachers t ON t.id = c.teacher_id
            WHERE c.id = $1
            "#,
        )
        .bind(classroom_id)
        .fetch_one(&self.pool)
        .await?;
        summary.teacher_avatar = summary.teacher_avatar.take().map(profile_picture_url);
        summary.background_image = summary.background_image.take().map(background_url);
        Ok(summary)
    }

    /// Replaces the classroom's background image. Owner-scoped; the previous
    /// blob is removed once the new one is stored.
    pub async fn upload_background(
        &self,
        classroom_id: Uuid,
        teacher_id: Uuid,
        file_name: &str,
        data: Bytes,
    ) -> Result<String> {
        let extension = file_name
            .rsplit('.')
            .next()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !BACKGROUND_EXTENSIONS.contains(&extension.as_str()) {
            return Err(Error::Unprocessable(
                "Background image must be jpg, jpeg, png or webp".into(),
            ));
        }
        if data.len() > BACKGROUND_MAX_BYTES {
            return Err(Error::Unprocessable(
                "Background image exceeds the 5 MB limit".into(),
            ));
        }

        let previous: Option<String> = sqlx::query_scalar(
            r#"SELECT background_image FROM class_rooms WHERE id = $1 AND teacher_id = $2"#,
        )
        .bind(classroom_id)
        .bind(teacher_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Classroom not found".into()))?;

        let uploads_dir = &get_config().uploads_dir;
        let stored_name = format!("{}_{}", Uuid::new_v4(), sanitize_filename(file_name));
        let dir = std::path::Path::new(uploads_dir).join(BACKGROUND_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&stored_name), &data).await?;

        sqlx::query(
            r#"UPDATE class_rooms SET background_image = $2, updated_at = NOW() WHERE id = $1"#,
        )
        .bind(classroom_id)
        .bind(&stored_name)
        .execute(&self.pool)
        .await?;

        if let Some(old) = previous {
            let _ = tokio::fs::remove_file(dir.join(old)).await;
        }

        Ok(background_url(stored_name))
    }

    async fn roster_unchecked(&self, classroom_id: Uuid) -> Result<Vec<StudentSummary>> {
        let mut students = sqlx::query_as::<_, StudentSummary>(
            r#"
            SELECT s.id, s.student_name, s.student_grade, s.student_section, s.student_lrn,
                   u.username, s.profile_picture, s.class_room_id
            FROM students s
            JOIN users u ON u.id = s.user_id
            WHERE s.class_room_id = $1
            ORDER BY s.student_name ASC
            "#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;

        for student in &mut students {
            student.profile_picture = student.profile_picture.take().map(profile_picture_url);
        }
        Ok(students)
    }
}

fn background_url(file_name: String) -> String {
    format!("/uploads/{}/{}", BACKGROUND_DIR, file_name)
}
