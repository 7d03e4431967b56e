use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClassroomPayload {
    #[validate(length(min = 1, max = 255))]
    pub class_name: String,
    #[validate(length(min = 1, max = 50))]
    pub grade_level: String,
    #[validate(length(max = 50))]
    pub section: Option<String>,
    #[validate(length(max = 20))]
    pub school_year: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateClassroomPayload {
    #[validate(length(min = 1, max = 255))]
    pub class_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub grade_level: Option<String>,
    #[validate(length(max = 50))]
    pub section: Option<String>,
    #[validate(length(max = 20))]
    pub school_year: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignStudentPayload {
    pub student_id: Uuid,
    pub class_room_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnassignStudentPayload {
    pub student_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JoinClassPayload {
    #[validate(length(equal = 8))]
    pub classroom_code: String,
}

/// Teacher-facing list row; `student_count` is the live aggregate, not the
/// cached column.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClassroomSummary {
    pub id: Uuid,
    pub class_name: String,
    pub grade_level: String,
    pub section: Option<String>,
    pub school_year: Option<String>,
    pub student_count: i64,
    pub teacher_name: String,
    pub classroom_code: String,
    pub background_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentSummary {
    pub id: Uuid,
    pub student_name: String,
    pub student_grade: String,
    pub student_section: String,
    pub student_lrn: String,
    pub username: String,
    pub profile_picture: Option<String>,
    pub class_room_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassroomDetailResponse {
    #[serde(flatten)]
    pub summary: ClassroomSummary,
    pub students: Vec<StudentSummary>,
}

/// Student-facing classroom view with the owning teacher's details.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentClassSummary {
    pub id: Uuid,
    pub class_name: String,
    pub grade_level: String,
    pub section: Option<String>,
    pub classroom_code: String,
    pub teacher_name: String,
    pub teacher_email: String,
    pub teacher_position: String,
    pub teacher_avatar: Option<String>,
    pub background_image: Option<String>,
}
