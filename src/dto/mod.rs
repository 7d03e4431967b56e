pub mod auth_dto;
pub mod classroom_dto;
pub mod material_dto;
pub mod profile_dto;
pub mod progress_dto;
pub mod user_dto;
