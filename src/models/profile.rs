use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub admin_email: String,
    #[serde(skip_serializing)]
    pub admin_security_code_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeacherProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub teacher_email: String,
    pub teacher_name: String,
    pub teacher_position: String,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub student_name: String,
    pub student_lrn: String,
    pub student_grade: String,
    pub student_section: String,
    /// A student belongs to at most one classroom at a time.
    pub class_room_id: Option<Uuid>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
