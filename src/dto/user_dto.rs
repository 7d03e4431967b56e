use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::profile::StudentProfile;
use crate::models::user::User;

/// Coalescing partial update; role-specific fields are ignored for users of
/// other roles.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserPayload {
    #[validate(length(min = 1))]
    pub username: Option<String>,
    #[validate(length(min = 1))]
    pub teacher_name: Option<String>,
    #[validate(email)]
    pub teacher_email: Option<String>,
    #[validate(length(min = 1))]
    pub teacher_position: Option<String>,
    #[validate(length(min = 1))]
    pub student_name: Option<String>,
    #[validate(length(min = 1))]
    pub student_lrn: Option<String>,
    #[validate(length(min = 1))]
    pub student_grade: Option<String>,
    #[validate(length(min = 1))]
    pub student_section: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TeacherListItem {
    pub teacher_id: Uuid,
    pub user_id: Uuid,
    pub teacher_name: String,
    pub teacher_email: String,
    pub teacher_position: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentListItem {
    pub student_id: Uuid,
    pub user_id: Uuid,
    pub student_name: String,
    pub student_lrn: String,
    pub student_grade: String,
    pub student_section: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentWithUser {
    pub user: User,
    pub student: StudentProfile,
}
