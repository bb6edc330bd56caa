//! edumedia HTTP API
//!
//! Upload and delete routes over the media pipeline, plus application setup.

pub mod constants;
pub mod error;
mod handlers;
pub mod setup;
pub mod state;
mod utils;

pub use error::{ErrorResponse, HttpAppError};
