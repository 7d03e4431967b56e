use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitProgressPayload {
    pub task_id: Uuid,
    #[validate(range(min = 0))]
    pub correct_answers: i32,
    #[validate(range(min = 0))]
    pub wrong_answers: i32,
    #[validate(range(min = 0, max = 100))]
    pub score: i32,
    #[validate(range(min = 0))]
    pub max_score: i32,
    pub completed: bool,
    pub audio_submitted: bool,
    pub activity_details: Option<JsonValue>,
}

/// Progress row joined with its task and grade context.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProgressWithTask {
    pub id: Uuid,
    pub student_id: Uuid,
    pub task_id: Uuid,
    pub attempts_left: i32,
    pub score: i32,
    pub max_score: i32,
    pub correct_answers: i32,
    pub wrong_answers: i32,
    pub completed: bool,
    pub audio_submitted: bool,
    pub activity_details: Option<JsonValue>,
    pub task_title: String,
    pub max_attempts: i32,
    pub grade_name: String,
}

/// Per-student task view; `is_locked` is computed at read time, never persisted.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TaskStatus {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub max_attempts: i32,
    pub attempts_left: i32,
    pub is_completed: bool,
    pub is_locked: bool,
}
