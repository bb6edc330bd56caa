pub mod health;
pub mod media_delete;
pub mod media_upload;
