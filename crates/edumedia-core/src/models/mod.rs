//! Domain models for the upload pipeline.

mod image;
mod options;
mod stored;
mod upload;

pub use image::{ImageConstraints, OutputFormat};
pub use options::{EagerTransform, UploadOptions};
pub use stored::{ResourceKind, StoredObjectDescriptor};
pub use upload::{UploadRequest, UploadSource};
