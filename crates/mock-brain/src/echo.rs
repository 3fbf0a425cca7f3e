//! Echo brain implementation - echoes prompts back.

use std::path::Path;

use brain_core::{async_trait, Brain, BrainError, UploadedMedia};
use tokio::sync::Mutex;

/// A simple brain that answers with the prompt it was given.
///
/// Useful for testing the message flow without any AI processing: the reply
/// shows exactly what prompt (style, context and request) was composed.
/// Every prompt is also recorded and can be inspected with [`EchoBrain::prompts`].
#[derive(Debug, Default)]
pub struct EchoBrain {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl EchoBrain {
    /// Create a new EchoBrain with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoBrain with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_brain::EchoBrain;
    ///
    /// let brain = EchoBrain::with_prefix("Echo: ");
    /// // Will respond with "Echo: <prompt>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            prompts: Mutex::default(),
        }
    }

    /// Every prompt received so far, in order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    async fn echo(&self, prompt: &str) -> String {
        self.prompts.lock().await.push(prompt.to_string());
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, prompt),
            None => prompt.to_string(),
        }
    }
}

#[async_trait]
impl Brain for EchoBrain {
    async fn generate_text(&self, prompt: &str) -> Result<String, BrainError> {
        Ok(self.echo(prompt).await)
    }

    async fn upload_media(&self, path: &Path, mime_type: &str) -> Result<UploadedMedia, BrainError> {
        Ok(UploadedMedia {
            uri: format!("mock://{}", path.display()),
            mime_type: mime_type.to_string(),
        })
    }

    async fn generate_from_media(
        &self,
        media: &UploadedMedia,
        prompt: &str,
    ) -> Result<String, BrainError> {
        let echoed = self.echo(prompt).await;
        Ok(format!("[{}] {}", media.mime_type, echoed))
    }

    fn name(&self) -> &str {
        "EchoBrain"
    }
}
