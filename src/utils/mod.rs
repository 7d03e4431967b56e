pub mod crypto;
pub mod files;
pub mod token;
