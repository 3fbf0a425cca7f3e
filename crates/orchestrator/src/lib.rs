//! Conversation orchestrator with per-user settings and dialogue memory.
//!
//! This crate provides the [`Orchestrator`] type which turns inbound chat
//! messages into brain calls, plus the two stores it personalises them with:
//! [`UserSettingsStore`] (response style and context limits) and
//! [`ContextStore`] (an append-only, per-user log of dialogue turns).
//!
//! # Features
//!
//! - Ten built-in response styles, extensible at startup
//! - Context windows bounded by message count and estimated tokens
//! - Count-based auto-cleanup of the persisted history
//! - Text, image, voice and audio-file turns
//! - Slash commands answered without calling the brain
//! - Backend failures mapped to readable replies
//!
//! # Architecture
//!
//! ```text
//! Inbound message (from a transport)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ORCHESTRATOR                           │
//! │                                                             │
//! │  1. Chat action (typing / upload_photo / record_voice)      │
//! │         ↓                                                   │
//! │  2. Per-user lock                                           │
//! │         ↓                                                   │
//! │  3. /command → settings / context stores → reply            │
//! │     otherwise:                                              │
//! │     • settings (style, context limits)                      │
//! │     • context window → transcript block                     │
//! │     • style + context + request → brain                     │
//! │     • user turn, assistant turn, auto-cleanup               │
//! │         ↓                                                   │
//! │  4. Send reply                                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use database::Database;
//! use gemini_brain::GeminiBrain;
//! use orchestrator::{InboundMessage, LoggingSender, Orchestrator, OrchestratorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:data/bot.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let orchestrator = Orchestrator::new(
//!         Arc::new(GeminiBrain::from_env()?),
//!         LoggingSender,
//!         Arc::new(db),
//!         OrchestratorConfig::from_env(),
//!     );
//!
//!     orchestrator.handle(InboundMessage::text(42, "Привет!", 0)).await?;
//!     Ok(())
//! }
//! ```

mod commands;
mod config;
mod context_store;
mod error;
mod failure;
mod locks;
mod media;
mod orchestrator;
mod prompt;
mod sender;
mod settings;
mod styles;
mod token;

// Public exports
pub use commands::{Command, ContextCommand, HELP_TEXT};
pub use config::OrchestratorConfig;
pub use context_store::{
    apply_token_budget, format_messages, ContextStats, ContextStore, GlobalStats, CONTEXT_HEADER,
};
pub use error::{OrchestratorError, ValidationError};
pub use failure::{failure_reply, FailureKind};
pub use locks::KeyedLocks;
pub use media::{decorate_reply, format_duration, resolve_mime_type};
pub use orchestrator::Orchestrator;
pub use prompt::{media_instruction, PromptComposer, REQUEST_MARKER};
pub use sender::{LoggingSender, MessageSender, NoOpSender, TYPING_ACTION};
pub use settings::{validate_patch, UserSettingsStore};
pub use styles::{StyleDescription, StyleRegistry, BASE_PROMPT};
pub use token::{estimate_tokens, TokenEstimator, WordCountEstimator};

// Re-export commonly used types from dependencies
pub use brain_core::{InboundContent, InboundMessage, MediaRef, OutboundMessage};
pub use database::{
    ContextMessage, ContextSettings, ContextSettingsPatch, MessageType, Role, UserSettings,
};
