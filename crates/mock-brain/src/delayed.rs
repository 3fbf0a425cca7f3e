//! Delayed brain implementation - wraps another brain with artificial delay.

use std::path::Path;
use std::time::Duration;

use brain_core::{async_trait, Brain, BrainError, UploadedMedia};
use tokio::time::sleep;

/// A brain that wraps another brain and adds artificial delay.
///
/// Useful for testing per-user serialization and simulating generation latency.
pub struct DelayedBrain<B: Brain> {
    inner: B,
    delay: Duration,
}

impl<B: Brain> DelayedBrain<B> {
    /// Create a new DelayedBrain wrapping the given brain with the specified delay.
    pub fn new(inner: B, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a brain with a delay in milliseconds.
    pub fn with_millis(inner: B, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Access the wrapped brain.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: Brain> Brain for DelayedBrain<B> {
    async fn generate_text(&self, prompt: &str) -> Result<String, BrainError> {
        sleep(self.delay).await;
        self.inner.generate_text(prompt).await
    }

    async fn upload_media(&self, path: &Path, mime_type: &str) -> Result<UploadedMedia, BrainError> {
        self.inner.upload_media(path, mime_type).await
    }

    async fn generate_from_media(
        &self,
        media: &UploadedMedia,
        prompt: &str,
    ) -> Result<String, BrainError> {
        sleep(self.delay).await;
        self.inner.generate_from_media(media, prompt).await
    }

    fn name(&self) -> &str {
        "DelayedBrain"
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }

    async fn shutdown(&self) -> Result<(), BrainError> {
        self.inner.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EchoBrain;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delayed_brain() {
        let brain = DelayedBrain::with_millis(EchoBrain::new(), 100);

        let start = Instant::now();
        let response = brain.generate_text("test").await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(response, "test");
        assert!(elapsed >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_concurrent_calls_overlap() {
        let brain = DelayedBrain::with_millis(EchoBrain::new(), 100);

        let start = Instant::now();
        let (a, b) = futures::join!(brain.generate_text("a"), brain.generate_text("b"));
        let elapsed = start.elapsed();

        assert_eq!(a.unwrap(), "a");
        assert_eq!(b.unwrap(), "b");
        assert!(elapsed < Duration::from_millis(190));
    }

    #[tokio::test]
    async fn test_brain_name() {
        let brain = DelayedBrain::with_millis(EchoBrain::new(), 0);
        assert_eq!(brain.name(), "DelayedBrain");
    }
}
