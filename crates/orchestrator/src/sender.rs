//! Message sender trait and implementations.

use async_trait::async_trait;

use crate::error::OrchestratorError;

/// Chat action shown while a text reply is generated.
pub const TYPING_ACTION: &str = "typing";

/// Trait for sending replies and chat actions.
///
/// Abstracted to support different transports (Telegram, console, tests).
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send a text message to a chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), OrchestratorError>;

    /// Show a transient activity indicator such as `typing` or `record_voice`.
    async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), OrchestratorError>;
}

/// A no-op message sender for testing that discards all messages.
#[derive(Debug, Clone, Default)]
pub struct NoOpSender;

#[async_trait]
impl MessageSender for NoOpSender {
    async fn send_message(&self, _chat_id: i64, _text: &str) -> Result<(), OrchestratorError> {
        Ok(())
    }

    async fn send_chat_action(&self, _chat_id: i64, _action: &str) -> Result<(), OrchestratorError> {
        Ok(())
    }
}

/// A logging message sender for debugging that logs all operations.
#[derive(Debug, Clone, Default)]
pub struct LoggingSender;

#[async_trait]
impl MessageSender for LoggingSender {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), OrchestratorError> {
        tracing::info!("Sending message to chat {}: {}", chat_id, text);
        Ok(())
    }

    async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), OrchestratorError> {
        tracing::info!("Chat action '{}' for chat {}", action, chat_id);
        Ok(())
    }
}
