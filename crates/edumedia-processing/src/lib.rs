//! Edumedia Processing Library
//!
//! The upload pipeline above the storage layer:
//! - image transcoding (decode, fit-inside resize, lossy re-encode)
//! - request validation (payload length, filename, MIME type)
//! - per-folder destination policies and the upload orchestrator

pub mod image;
pub mod upload;
pub mod validator;

pub use crate::image::{ImageTranscoder, TranscodeError, TranscodedImage};
pub use upload::{
    DestinationPolicy, DestinationRegistry, FolderMatcher, UploadOrchestrator,
};
pub use validator::ValidationError;
