use crate::dto::progress_dto::{ProgressWithTask, SubmitProgressPayload};
use crate::error::{Error, Result};
use crate::models::progress::StudentTaskProgress;
use crate::models::task::Task;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ProgressService {
    pool: PgPool,
}

impl ProgressService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records a submission for the (student, task) pair. Every submission
    /// while the task is uncompleted consumes one attempt; the counter stops
    /// at 0 and freezes once a completed submission has been stored.
    /// Submissions at 0 attempts are still recorded: the lock is advisory and
    /// surfaced to callers via `is_locked` at read time.
    pub async fn submit(
        &self,
        student_id: Uuid,
        payload: SubmitProgressPayload,
    ) -> Result<StudentTaskProgress> {
        let mut tx = self.pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(r#"SELECT * FROM tasks WHERE id = $1"#)
            .bind(payload.task_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound("Task not found".into()))?;

        let existing = sqlx::query_as::<_, StudentTaskProgress>(
            r#"
            SELECT * FROM student_task_progress
            WHERE student_id = $1 AND task_id = $2
            FOR UPDATE
            "#,
        )
        .bind(student_id)
        .bind(payload.task_id)
        .fetch_optional(&mut *tx)
        .await?;

        let progress = match existing {
            Some(prior) => {
                // Decrement against the stored state, before the new fields land.
                let attempts_left = if !prior.completed && prior.attempts_left > 0 {
                    prior.attempts_left - 1
                } else {
                    prior.attempts_left
                };

                sqlx::query_as::<_, StudentTaskProgress>(
                    r#"
                    UPDATE student_task_progress
                    SET attempts_left = $3,
                        correct_answers = $4,
                        wrong_answers = $5,
                        score = $6,
                        max_score = $7,
                        completed = $8,
                        audio_submitted = $9,
                        activity_details = COALESCE($10, activity_details),
                        updated_at = NOW()
                    WHERE student_id = $1 AND task_id = $2
                    RETURNING *
                    "#,
                )
                .bind(student_id)
                .bind(payload.task_id)
                .bind(attempts_left)
                .bind(payload.correct_answers)
                .bind(payload.wrong_answers)
                .bind(payload.score)
                .bind(payload.max_score)
                .bind(payload.completed)
                .bind(payload.audio_submitted)
                .bind(&payload.activity_details)
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                // Seeded from max_attempts, then this submission consumes one.
                let attempts_left = (task.max_attempts - 1).max(0);

                sqlx::query_as::<_, StudentTaskProgress>(
                    r#"
                    INSERT INTO student_task_progress (
                        student_id, task_id, attempts_left, correct_answers, wrong_answers,
                        score, max_score, completed, audio_submitted, activity_details
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    RETURNING *
                    "#,
                )
                .bind(student_id)
                .bind(payload.task_id)
                .bind(attempts_left)
                .bind(payload.correct_answers)
                .bind(payload.wrong_answers)
                .bind(payload.score)
                .bind(payload.max_score)
                .bind(payload.completed)
                .bind(payload.audio_submitted)
                .bind(&payload.activity_details)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(progress)
    }

    pub async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<ProgressWithTask>> {
        let rows = sqlx::query_as::<_, ProgressWithTask>(
            r#"
            SELECT
                p.id, p.student_id, p.task_id, p.attempts_left, p.score, p.max_score,
                p.correct_answers, p.wrong_answers, p.completed, p.audio_submitted,
                p.activity_details,
                t.title AS task_title, t.max_attempts,
                g.name AS grade_name
            FROM student_task_progress p
            JOIN tasks t ON t.id = p.task_id
            JOIN grades g ON g.id = t.grade_id
            WHERE p.student_id = $1
            ORDER BY p.updated_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Administrative override: restores the attempt budget to exactly the
    /// task's `max_attempts`, whatever the prior state.
    pub async fn reset_attempts(
        &self,
        student_id: Uuid,
        task_id: Uuid,
    ) -> Result<StudentTaskProgress> {
        let progress = sqlx::query_as::<_, StudentTaskProgress>(
            r#"
            UPDATE student_task_progress p
            SET attempts_left = t.max_attempts, updated_at = NOW()
            FROM tasks t
            WHERE t.id = p.task_id AND p.student_id = $1 AND p.task_id = $2
            RETURNING p.*
            "#,
        )
        .bind(student_id)
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        progress.ok_or_else(|| Error::NotFound("Progress not found".into()))
    }
}
