//! Edumedia Core Library
//!
//! This crate provides the domain models, error types, and configuration
//! shared by the storage, processing, and API crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{
    validate_env, CloudinaryCredentials, Config, LocalStorageConfig, ServerConfig, UploadSettings,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    EagerTransform, ImageConstraints, OutputFormat, ResourceKind, StoredObjectDescriptor,
    UploadOptions, UploadRequest, UploadSource,
};
pub use storage_types::StorageBackend;
