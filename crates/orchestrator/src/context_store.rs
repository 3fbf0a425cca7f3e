//! Per-user dialogue context with dual-budget retrieval.
//!
//! The log is append-only per user. Reads return a window bounded by both a
//! message count and an estimated token budget, dropping the oldest turns
//! first. Auto-cleanup keeps the persisted log bounded by count only.
//!
//! Reads degrade to empty results when storage fails; writes propagate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use database::{ContextBackend, ContextMessage, ContextSettings, DatabaseError, MessageType, Role};
use serde::Serialize;
use tracing::{debug, warn};

use crate::token::{TokenEstimator, WordCountEstimator};

/// Header placed before the rendered transcript.
pub const CONTEXT_HEADER: &str = "Контекст предыдущих сообщений:";

/// Aggregate over a user's full persisted log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextStats {
    pub message_count: usize,
    pub estimated_tokens: usize,
    pub oldest_message: Option<DateTime<Utc>>,
    pub newest_message: Option<DateTime<Utc>>,
}

/// Aggregate across all users.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalStats {
    /// Users with at least one stored turn.
    pub total_users: usize,
    pub total_messages: usize,
    /// Rounded to two decimals.
    pub average_messages_per_user: f64,
}

/// Dialogue log store backed by a [`ContextBackend`].
pub struct ContextStore {
    backend: Arc<dyn ContextBackend>,
    estimator: Arc<dyn TokenEstimator>,
}

impl ContextStore {
    pub fn new(backend: Arc<dyn ContextBackend>) -> Self {
        Self::with_estimator(backend, Arc::new(WordCountEstimator))
    }

    pub fn with_estimator(
        backend: Arc<dyn ContextBackend>,
        estimator: Arc<dyn TokenEstimator>,
    ) -> Self {
        Self { backend, estimator }
    }

    /// Append a user turn. Durable when this returns `Ok`.
    pub async fn add_user_message(
        &self,
        user_id: i64,
        content: &str,
        message_type: MessageType,
    ) -> Result<ContextMessage, DatabaseError> {
        self.append(user_id, Role::User, content, message_type).await
    }

    /// Append an assistant turn. Durable when this returns `Ok`.
    pub async fn add_assistant_message(
        &self,
        user_id: i64,
        content: &str,
    ) -> Result<ContextMessage, DatabaseError> {
        self.append(user_id, Role::Assistant, content, MessageType::Text)
            .await
    }

    async fn append(
        &self,
        user_id: i64,
        role: Role,
        content: &str,
        message_type: MessageType,
    ) -> Result<ContextMessage, DatabaseError> {
        let tokens = self.estimator.estimate(content);
        let message = ContextMessage::new(user_id, role, content, message_type, tokens);
        self.backend.append_message(&message).await?;
        debug!(
            "Stored {} {} turn for user {} ({} tokens)",
            role, message_type, user_id, tokens
        );
        Ok(message)
    }

    /// The window of history visible under `settings`, oldest first.
    pub async fn get_user_context(
        &self,
        user_id: i64,
        settings: &ContextSettings,
    ) -> Vec<ContextMessage> {
        if !settings.enabled {
            return Vec::new();
        }

        let recent = match self
            .backend
            .recent_messages(user_id, settings.max_messages)
            .await
        {
            Ok(recent) => recent,
            Err(e) => {
                warn!("Failed to load context for user {}: {}", user_id, e);
                return Vec::new();
            }
        };

        apply_token_budget(recent, settings.max_tokens, self.estimator.as_ref())
    }

    /// Delete every turn for a user. Returns how many were removed.
    pub async fn clear_user_context(&self, user_id: i64) -> Result<usize, DatabaseError> {
        let removed = self.backend.delete_messages(user_id).await?;
        debug!("Cleared {} context messages for user {}", removed, user_id);
        Ok(removed as usize)
    }

    /// Drop all but the newest `max_messages` turns when auto-cleanup is on.
    pub async fn auto_cleanup_context(
        &self,
        user_id: i64,
        settings: &ContextSettings,
    ) -> Result<usize, DatabaseError> {
        if !settings.auto_cleanup {
            return Ok(0);
        }

        let removed = self
            .backend
            .retain_latest(user_id, settings.max_messages)
            .await?;
        if removed > 0 {
            debug!(
                "Auto-cleanup removed {} old messages for user {}",
                removed, user_id
            );
        }
        Ok(removed as usize)
    }

    /// Stats over the whole persisted log, not the budgeted window.
    pub async fn get_user_context_stats(&self, user_id: i64) -> ContextStats {
        let messages = match self.backend.all_messages(user_id).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Failed to load context stats for user {}: {}", user_id, e);
                return ContextStats::default();
            }
        };

        ContextStats {
            message_count: messages.len(),
            estimated_tokens: messages
                .iter()
                .map(|m| token_cost(m, self.estimator.as_ref()))
                .sum(),
            oldest_message: messages.first().map(|m| m.timestamp),
            newest_message: messages.last().map(|m| m.timestamp),
        }
    }

    /// Render the context window as a transcript block for the prompt.
    ///
    /// Returns an empty string when the window is empty.
    pub async fn format_context_for_prompt(
        &self,
        user_id: i64,
        settings: &ContextSettings,
    ) -> String {
        format_messages(&self.get_user_context(user_id, settings).await)
    }

    pub async fn get_global_stats(&self) -> GlobalStats {
        let (users, messages) = match self.backend.global_counts().await {
            Ok(counts) => counts,
            Err(e) => {
                warn!("Failed to load global context stats: {}", e);
                return GlobalStats::default();
            }
        };

        let total_users = users.max(0) as usize;
        let total_messages = messages.max(0) as usize;
        let average = if total_users == 0 {
            0.0
        } else {
            ((total_messages as f64 / total_users as f64) * 100.0).round() / 100.0
        };

        GlobalStats {
            total_users,
            total_messages,
            average_messages_per_user: average,
        }
    }
}

fn token_cost(message: &ContextMessage, estimator: &dyn TokenEstimator) -> usize {
    message
        .token_count
        .unwrap_or_else(|| estimator.estimate(&message.content))
}

/// Keep the longest suffix of `messages` whose token cost fits `max_tokens`.
///
/// Walks from the newest turn backward and stops at the first turn that
/// would exceed the budget, so an older turn is never kept over a newer one.
pub fn apply_token_budget(
    messages: Vec<ContextMessage>,
    max_tokens: usize,
    estimator: &dyn TokenEstimator,
) -> Vec<ContextMessage> {
    let mut total = 0usize;
    let mut start = messages.len();

    for (index, message) in messages.iter().enumerate().rev() {
        let cost = token_cost(message, estimator);
        if total + cost > max_tokens {
            break;
        }
        total += cost;
        start = index;
    }

    messages.into_iter().skip(start).collect()
}

/// Render turns as `"<role>[ [type]]: <content>"` lines under [`CONTEXT_HEADER`].
pub fn format_messages(messages: &[ContextMessage]) -> String {
    if messages.is_empty() {
        return String::new();
    }

    let lines: Vec<String> = messages
        .iter()
        .map(|message| {
            let label = role_label(message.role);
            match message.message_type {
                MessageType::Text => format!("{}: {}", label, message.content),
                other => format!("{} [{}]: {}", label, other, message.content),
            }
        })
        .collect();

    format!("\n\n{}\n{}\n", CONTEXT_HEADER, lines.join("\n"))
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "Пользователь",
        Role::Assistant => "Ассистент",
    }
}
