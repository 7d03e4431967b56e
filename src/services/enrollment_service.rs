use crate::dto::classroom_dto::{AssignStudentPayload, JoinClassPayload, StudentClassSummary};
use crate::error::{Error, Result};
use crate::models::classroom::Classroom;
use crate::models::profile::StudentProfile;
use crate::services::classroom_service::ClassroomService;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// All enrollment mutations go through this service so the cached
/// `number_of_students` is refreshed inside the same transaction as the FK
/// change, and the student slot itself is claimed with a compare-and-swap.
#[derive(Clone)]
pub struct EnrollmentService {
    pool: PgPool,
}

impl EnrollmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn assign_student(
        &self,
        teacher_id: Uuid,
        payload: AssignStudentPayload,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<Uuid> =
            sqlx::query_scalar(r#"SELECT id FROM class_rooms WHERE id = $1 AND teacher_id = $2"#)
                .bind(payload.class_room_id)
                .bind(teacher_id)
                .fetch_optional(&mut *tx)
                .await?;
        if owned.is_none() {
            return Err(Error::NotFound("Classroom not found".into()));
        }

        Self::claim_student(&mut tx, payload.student_id, payload.class_room_id).await?;
        Self::refresh_student_count(&mut tx, payload.class_room_id).await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn unassign_student(&self, teacher_id: Uuid, student_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        #[derive(sqlx::FromRow)]
        struct EnrollmentRow {
            class_room_id: Option<Uuid>,
            owner_id: Option<Uuid>,
        }

        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT s.class_room_id, c.teacher_id AS owner_id
            FROM students s
            LEFT JOIN class_rooms c ON c.id = s.class_room_id
            WHERE s.id = $1
            FOR UPDATE OF s
            "#,
        )
        .bind(student_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Student not found".into()))?;

        let classroom_id = match (row.class_room_id, row.owner_id) {
            (Some(classroom_id), Some(owner)) if owner == teacher_id => classroom_id,
            _ => {
                return Err(Error::NotFound(
                    "Student is not enrolled in one of your classes".into(),
                ))
            }
        };

        sqlx::query(
            r#"UPDATE students SET class_room_id = NULL, updated_at = NOW() WHERE id = $1"#,
        )
        .bind(student_id)
        .execute(&mut *tx)
        .await?;
        Self::refresh_student_count(&mut tx, classroom_id).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Self-service enrollment by classroom code. The only path where a
    /// student mutates their own membership.
    pub async fn join_class(
        &self,
        classrooms: &ClassroomService,
        student_id: Uuid,
        payload: JoinClassPayload,
    ) -> Result<StudentClassSummary> {
        let mut tx = self.pool.begin().await?;

        let classroom = sqlx::query_as::<_, Classroom>(
            r#"SELECT * FROM class_rooms WHERE classroom_code = $1"#,
        )
        .bind(&payload.classroom_code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Classroom not found".into()))?;

        let student = sqlx::query_as::<_, StudentProfile>(
            r#"SELECT * FROM students WHERE id = $1 FOR UPDATE"#,
        )
        .bind(student_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Student not found".into()))?;

        // Exact string equality; a classroom without a section accepts any.
        let grade_matches = student.student_grade == classroom.grade_level;
        let section_matches = classroom
            .section
            .as_deref()
            .map_or(true, |section| section == student.student_section);
        if !grade_matches || !section_matches {
            return Err(Error::Unprocessable(
                "Your grade or section does not match this classroom".into(),
            ));
        }

        if student.class_room_id.is_some() {
            return Err(Error::Conflict(
                "Student already assigned to a class".into(),
            ));
        }

        Self::claim_student(&mut tx, student.id, classroom.id).await?;
        Self::refresh_student_count(&mut tx, classroom.id).await?;

        tx.commit().await?;
        classrooms.class_summary(classroom.id).await
    }

    /// Compare-and-swap on the student's single enrollment slot: the update
    /// only wins if the FK is still NULL, so concurrent assigns cannot both
    /// succeed.
    async fn claim_student(
        tx: &mut Transaction<'_, Postgres>,
        student_id: Uuid,
        classroom_id: Uuid,
    ) -> Result<()> {
        let claimed = sqlx::query(
            r#"
            UPDATE students
            SET class_room_id = $1, updated_at = NOW()
            WHERE id = $2 AND class_room_id IS NULL
            "#,
        )
        .bind(classroom_id)
        .bind(student_id)
        .execute(&mut **tx)
        .await?;

        if claimed.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)"#)
                    .bind(student_id)
                    .fetch_one(&mut **tx)
                    .await?;
            if exists {
                return Err(Error::Conflict(
                    "Student already assigned to a class".into(),
                ));
            }
            return Err(Error::NotFound("Student not found".into()));
        }
        Ok(())
    }

    async fn refresh_student_count(
        tx: &mut Transaction<'_, Postgres>,
        classroom_id: Uuid,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE class_rooms
            SET number_of_students = (SELECT COUNT(*) FROM students WHERE class_room_id = $1),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(classroom_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
