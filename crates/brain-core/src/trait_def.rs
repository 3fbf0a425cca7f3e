//! The Brain trait definition.

use std::path::Path;

use async_trait::async_trait;

use crate::error::BrainError;
use crate::message::UploadedMedia;

/// A generative backend that turns prompts (optionally with media) into text.
///
/// This trait is object-safe and can be used with `Arc<dyn Brain>`.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Generate a reply for a plain text prompt.
    async fn generate_text(&self, prompt: &str) -> Result<String, BrainError>;

    /// Make a local file available to the backend.
    ///
    /// The returned handle is passed to [`Brain::generate_from_media`].
    async fn upload_media(&self, path: &Path, mime_type: &str) -> Result<UploadedMedia, BrainError>;

    /// Generate a reply for a prompt that refers to previously uploaded media.
    async fn generate_from_media(
        &self,
        media: &UploadedMedia,
        prompt: &str,
    ) -> Result<String, BrainError>;

    /// Get a human-readable name for this brain implementation.
    fn name(&self) -> &str;

    /// Check if the brain is ready to process messages.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }

    /// Gracefully shut down the brain.
    ///
    /// Default implementation does nothing.
    async fn shutdown(&self) -> Result<(), BrainError> {
        Ok(())
    }
}
