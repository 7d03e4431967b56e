pub mod auth;
pub mod classroom;
pub mod health;
pub mod material;
pub mod profile;
pub mod progress;
pub mod task;
pub mod user;
