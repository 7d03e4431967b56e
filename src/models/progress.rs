use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// One row per (student, task) pair. `attempts_left` is seeded from the task's
/// `max_attempts`, only ever decreases, stops at 0, and is frozen once
/// `completed` is set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentTaskProgress {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
