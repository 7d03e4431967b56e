use crate::dto::progress_dto::TaskStatus;
use crate::error::Result;
use crate::models::task::Grade;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct TaskService {
    pool: PgPool,
}

impl TaskService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_grades(&self) -> Result<Vec<Grade>> {
        let grades =
            sqlx::query_as::<_, Grade>(r#"SELECT id, name, level FROM grades ORDER BY level ASC"#)
                .fetch_all(&self.pool)
                .await?;
        Ok(grades)
    }

    /// Static tasks for a grade merged with the student's dynamic state.
    /// `is_locked` is derived from the remaining attempts at read time; no
    /// persisted lock flag exists.
    pub async fn tasks_for_grade(
        &self,
        student_id: Uuid,
        grade_id: Uuid,
    ) -> Result<Vec<TaskStatus>> {
        let tasks = sqlx::query_as::<_, TaskStatus>(
            r#"
            SELECT
                t.id, t.title, t.description, t.max_attempts,
                COALESCE(p.attempts_left, t.max_attempts) AS attempts_left,
                COALESCE(p.completed, FALSE) AS is_completed,
                COALESCE(p.attempts_left, t.max_attempts) <= 0 AS is_locked
            FROM tasks t
            LEFT JOIN student_task_progress p
                ON p.task_id = t.id AND p.student_id = $1
            WHERE t.grade_id = $2
            ORDER BY t.created_at ASC
            "#,
        )
        .bind(student_id)
        .bind(grade_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }
}
