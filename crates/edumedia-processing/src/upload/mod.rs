//! Upload pipeline: destination policies and the orchestrator that ties
//! validation, transcoding and the remote upload together.

pub mod destination;
pub mod orchestrator;

pub use destination::{DestinationPolicy, DestinationRegistry, FolderMatcher};
pub use orchestrator::UploadOrchestrator;
