//! Failing brain implementation - every call returns a scripted error.

use std::path::Path;

use brain_core::{async_trait, Brain, BrainError, UploadedMedia};

/// Which call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    /// Uploads and generation both fail.
    Everything,
    /// Uploads succeed, generation fails.
    Generation,
    /// Uploads fail, text generation echoes the prompt.
    Upload,
}

/// A brain whose calls fail with a fixed provider message.
///
/// Use it to drive the failure classification paths, e.g.
/// `FailingBrain::new("429: quota exceeded")`.
#[derive(Debug, Clone)]
pub struct FailingBrain {
    message: String,
    at: FailAt,
}

impl FailingBrain {
    /// Fail every call with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            at: FailAt::Everything,
        }
    }

    /// Fail only at the given stage.
    pub fn at(mut self, at: FailAt) -> Self {
        self.at = at;
        self
    }

    /// A brain that answers every request with empty text.
    pub fn empty() -> Self {
        Self::new(String::new())
    }

    fn error(&self) -> BrainError {
        if self.message.is_empty() {
            BrainError::EmptyResponse
        } else {
            BrainError::ProcessingFailed(self.message.clone())
        }
    }
}

#[async_trait]
impl Brain for FailingBrain {
    async fn generate_text(&self, prompt: &str) -> Result<String, BrainError> {
        match self.at {
            FailAt::Upload => Ok(prompt.to_string()),
            _ => Err(self.error()),
        }
    }

    async fn upload_media(&self, path: &Path, mime_type: &str) -> Result<UploadedMedia, BrainError> {
        match self.at {
            FailAt::Generation => Ok(UploadedMedia {
                uri: format!("mock://{}", path.display()),
                mime_type: mime_type.to_string(),
            }),
            _ => Err(BrainError::Upload(self.message.clone())),
        }
    }

    async fn generate_from_media(
        &self,
        _media: &UploadedMedia,
        _prompt: &str,
    ) -> Result<String, BrainError> {
        Err(self.error())
    }

    fn name(&self) -> &str {
        "FailingBrain"
    }
}
