//! Google Gemini-based brain implementation.
//!
//! This crate provides a brain implementation that uses the Gemini REST API
//! to answer text prompts and prompts about uploaded images and audio.
//!
//! # Features
//!
//! - `generateContent` for text and media prompts
//! - Resumable Files API uploads for images, voice notes and audio files
//! - Provider error messages preserved in [`BrainError`] for classification
//! - Configurable via environment variables
//!
//! # Usage
//!
//! ```rust,no_run
//! use gemini_brain::{Brain, GeminiBrain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let brain = GeminiBrain::from_env()?;
//!     let reply = brain.generate_text("Привет!").await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

mod api_types;
mod brain;
mod config;

pub use brain::GeminiBrain;
pub use config::{GeminiBrainConfig, GeminiBrainConfigBuilder, DEFAULT_API_URL, DEFAULT_MODEL};

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, UploadedMedia};
