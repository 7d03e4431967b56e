use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::material::MaterialType;

#[derive(Debug, Clone, Serialize)]
pub struct MaterialResponse {
    pub id: Uuid,
    pub class_room_id: Uuid,
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub material_title: String,
    pub material_file_url: String,
    pub material_type: MaterialType,
    pub file_icon: &'static str,
    /// Human-readable size ("2.5 MB"), as the clients expect.
    pub file_size: String,
    pub description: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}
