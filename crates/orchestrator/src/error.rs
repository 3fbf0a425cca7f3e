//! Error types for orchestrator operations.

use brain_core::BrainError;
use database::{DatabaseError, MessageType};
use thiserror::Error;

use crate::failure::failure_reply;

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Message was intentionally skipped.
    #[error("message skipped: {0}")]
    Skipped(String),

    /// Brain processing failed.
    #[error("brain error: {0}")]
    Brain(#[from] BrainError),

    /// Message sending failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Settings or context storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] DatabaseError),

    /// Input was rejected before touching storage.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl OrchestratorError {
    /// Reply shown to the user instead of the raw error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.user_message(),
            Self::Brain(e) => failure_reply(e, MessageType::Text).to_string(),
            Self::Storage(_) => "⚠️ Не удалось сохранить изменения. Попробуйте позже.".to_string(),
            Self::Skipped(_) | Self::SendFailed(_) => {
                "Извините, произошла ошибка при обработке вашего запроса. Попробуйте еще раз."
                    .to_string()
            }
        }
    }
}

/// Input rejected before any side effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The style key is not in the registry.
    #[error("unknown style '{0}'")]
    UnknownStyle(String),

    /// A context limit was zero, negative or not a number.
    #[error("{field} must be a positive integer, got '{value}'")]
    NotPositive { field: &'static str, value: String },

    /// A command argument could not be understood.
    #[error("invalid argument for {command}: {reason}")]
    InvalidArgument {
        command: &'static str,
        reason: String,
    },
}

impl ValidationError {
    /// Reply shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnknownStyle(key) => format!(
                "❌ Неизвестный стиль: {}. Используйте /styles для списка доступных стилей.",
                key
            ),
            Self::NotPositive { value, .. } => format!(
                "❌ Значение должно быть положительным целым числом, получено: {}",
                value
            ),
            Self::InvalidArgument { command, .. } => format!(
                "❌ Неверные параметры команды {}. Используйте /help для справки.",
                command
            ),
        }
    }
}
