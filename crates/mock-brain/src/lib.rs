//! Mock brain implementations for assistant message processing.
//!
//! This crate provides mock implementations of the `Brain` trait for testing:
//! - `EchoBrain` - Answers with the composed prompt
//! - `FailingBrain` - Fails with a scripted provider message
//! - `DelayedBrain` - Wraps another brain with artificial delay
//!
//! For production processing, use the `gemini-brain` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_brain::{Brain, EchoBrain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_brain::BrainError> {
//!     let brain = EchoBrain::new();
//!
//!     let response = brain.generate_text("Hello!").await?;
//!     println!("Response: {}", response);
//!     Ok(())
//! }
//! ```

mod delayed;
mod echo;
mod failing;

// Re-export brain-core types for convenience
pub use brain_core::{async_trait, Brain, BrainError, UploadedMedia};

pub use delayed::DelayedBrain;
pub use echo::EchoBrain;
pub use failing::{FailAt, FailingBrain};
