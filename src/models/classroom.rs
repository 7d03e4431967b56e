use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Classroom {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub class_name: String,
    pub grade_level: String,
    pub section: Option<String>,
    pub school_year: Option<String>,
    /// Generated once at creation, globally unique, never reassigned.
    pub classroom_code: String,
    /// Cached derived count; refreshed inside every enrollment transaction.
    pub number_of_students: i32,
    pub background_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
