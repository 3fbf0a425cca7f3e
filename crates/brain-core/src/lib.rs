//! Core trait and types for brain implementations.
//!
//! This crate provides the shared interface between the orchestrator and the
//! generative backends. It defines:
//!
//! - [`Brain`] - The trait that all brain implementations must implement
//! - [`InboundMessage`] / [`OutboundMessage`] - Message types for input/output
//! - [`MediaRef`] / [`UploadedMedia`] - Local and backend-side media handles
//! - [`BrainError`] - Error types for brain operations
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//!
//! use brain_core::{Brain, BrainError, UploadedMedia};
//! use async_trait::async_trait;
//!
//! struct MyBrain;
//!
//! #[async_trait]
//! impl Brain for MyBrain {
//!     async fn generate_text(&self, _prompt: &str) -> Result<String, BrainError> {
//!         Ok("Hello!".to_string())
//!     }
//!
//!     async fn upload_media(&self, path: &Path, mime_type: &str) -> Result<UploadedMedia, BrainError> {
//!         Ok(UploadedMedia { uri: path.display().to_string(), mime_type: mime_type.to_string() })
//!     }
//!
//!     async fn generate_from_media(&self, _media: &UploadedMedia, _prompt: &str) -> Result<String, BrainError> {
//!         Ok("Nice picture!".to_string())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "MyBrain"
//!     }
//! }
//! ```

mod error;
mod message;
mod trait_def;

pub use error::BrainError;
pub use message::{InboundContent, InboundMessage, MediaRef, OutboundMessage, UploadedMedia};
pub use trait_def::Brain;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
