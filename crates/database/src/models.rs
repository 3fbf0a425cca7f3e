//! Database models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};

/// Style assigned to users that never picked one.
pub const DEFAULT_RESPONSE_STYLE: &str = "friendly";

/// Who produced a dialogue turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a dialogue turn. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Text,
    Voice,
    Audio,
    Image,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
            Self::Audio => "audio",
            Self::Image => "image",
        }
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "voice" => Ok(Self::Voice),
            "audio" => Ok(Self::Audio),
            "image" => Ok(Self::Image),
            other => Err(format!("unknown message type '{}'", other)),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-user budget for the context window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSettings {
    /// Maximum number of messages in a context window.
    pub max_messages: usize,
    /// Maximum cumulative estimated tokens in a context window.
    pub max_tokens: usize,
    /// When false, the context window is always empty.
    pub enabled: bool,
    /// When true, history beyond `max_messages` is deleted after each write.
    pub auto_cleanup: bool,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            max_messages: 20,
            max_tokens: 8000,
            enabled: true,
            auto_cleanup: true,
        }
    }
}

/// Partial update for [`ContextSettings`]. Unset fields keep their value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextSettingsPatch {
    pub max_messages: Option<usize>,
    pub max_tokens: Option<usize>,
    pub enabled: Option<bool>,
    pub auto_cleanup: Option<bool>,
}

impl ContextSettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.max_messages.is_none()
            && self.max_tokens.is_none()
            && self.enabled.is_none()
            && self.auto_cleanup.is_none()
    }

    /// Merge this patch over `base`, field by field.
    pub fn apply(&self, base: ContextSettings) -> ContextSettings {
        ContextSettings {
            max_messages: self.max_messages.unwrap_or(base.max_messages),
            max_tokens: self.max_tokens.unwrap_or(base.max_tokens),
            enabled: self.enabled.unwrap_or(base.enabled),
            auto_cleanup: self.auto_cleanup.unwrap_or(base.auto_cleanup),
        }
    }
}

/// The single settings record kept for each user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Platform identity of the user.
    pub user_id: i64,
    /// Last seen display handle.
    pub username: Option<String>,
    /// Key into the style registry.
    pub response_style: String,
    /// Context window budget.
    pub context_settings: ContextSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    /// Build a fresh record with the given style and context defaults.
    pub fn with_defaults(
        user_id: i64,
        username: Option<&str>,
        response_style: &str,
        context_settings: ContextSettings,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            username: username.map(str::to_string),
            response_style: response_style.to_string(),
            context_settings,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One dialogue turn. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub id: String,
    pub user_id: i64,
    pub role: Role,
    pub content: String,
    pub message_type: MessageType,
    pub timestamp: DateTime<Utc>,
    /// Estimated token cost cached at insertion. Absent for imported rows
    /// that never carried one.
    pub token_count: Option<usize>,
}

impl ContextMessage {
    /// Create a new turn with a fresh id and the current time.
    pub fn new(
        user_id: i64,
        role: Role,
        content: impl Into<String>,
        message_type: MessageType,
        token_count: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            role,
            content: content.into(),
            message_type,
            timestamp: Utc::now(),
            token_count: Some(token_count),
        }
    }
}

/// Raw `user_settings` row.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserSettingsRow {
    pub user_id: i64,
    pub username: Option<String>,
    pub response_style: String,
    pub context_enabled: bool,
    pub context_max_messages: i64,
    pub context_max_tokens: i64,
    pub context_auto_cleanup: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<UserSettingsRow> for UserSettings {
    type Error = DatabaseError;

    fn try_from(row: UserSettingsRow) -> Result<Self> {
        let entity = "UserSettings";
        let max_messages = usize::try_from(row.context_max_messages)
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                DatabaseError::corrupt(entity, row.user_id, "context_max_messages must be positive")
            })?;
        let max_tokens = usize::try_from(row.context_max_tokens)
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                DatabaseError::corrupt(entity, row.user_id, "context_max_tokens must be positive")
            })?;
        let created_at = parse_timestamp(&row.created_at)
            .ok_or_else(|| DatabaseError::corrupt(entity, row.user_id, "invalid created_at"))?;
        let updated_at = parse_timestamp(&row.updated_at)
            .ok_or_else(|| DatabaseError::corrupt(entity, row.user_id, "invalid updated_at"))?;

        Ok(Self {
            user_id: row.user_id,
            username: row.username,
            response_style: row.response_style,
            context_settings: ContextSettings {
                max_messages,
                max_tokens,
                enabled: row.context_enabled,
                auto_cleanup: row.context_auto_cleanup,
            },
            created_at,
            updated_at,
        })
    }
}

/// Raw `user_contexts` row.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ContextMessageRow {
    pub id: String,
    pub user_id: i64,
    pub role: String,
    pub content: String,
    pub message_type: String,
    pub token_count: Option<i64>,
    pub created_at: String,
}

impl TryFrom<ContextMessageRow> for ContextMessage {
    type Error = DatabaseError;

    fn try_from(row: ContextMessageRow) -> Result<Self> {
        let entity = "ContextMessage";
        let role = row
            .role
            .parse::<Role>()
            .map_err(|reason| DatabaseError::corrupt(entity, &row.id, reason))?;
        let message_type = row
            .message_type
            .parse::<MessageType>()
            .map_err(|reason| DatabaseError::corrupt(entity, &row.id, reason))?;
        let timestamp = parse_timestamp(&row.created_at)
            .ok_or_else(|| DatabaseError::corrupt(entity, &row.id, "invalid created_at"))?;
        let token_count = match row.token_count {
            Some(count) => Some(usize::try_from(count).map_err(|_| {
                DatabaseError::corrupt(entity, &row.id, "negative token_count")
            })?),
            None => None,
        };

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            role,
            content: row.content,
            message_type,
            timestamp,
            token_count,
        })
    }
}

/// Format a timestamp the way it is stored.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 and SQLite's `CURRENT_TIMESTAMP` format.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_settings_defaults() {
        let settings = ContextSettings::default();
        assert_eq!(settings.max_messages, 20);
        assert_eq!(settings.max_tokens, 8000);
        assert!(settings.enabled);
        assert!(settings.auto_cleanup);
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let base = ContextSettings::default();
        let patch = ContextSettingsPatch {
            max_messages: Some(5),
            ..Default::default()
        };

        let merged = patch.apply(base);
        assert_eq!(merged.max_messages, 5);
        assert_eq!(merged.max_tokens, 8000);
        assert!(merged.enabled);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-05-01T10:00:00.000Z").is_some());
        assert!(parse_timestamp("2024-05-01 10:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_corrupt_row_is_rejected() {
        let row = ContextMessageRow {
            id: "abc".to_string(),
            user_id: 1,
            role: "system".to_string(),
            content: "hi".to_string(),
            message_type: "text".to_string(),
            token_count: Some(1),
            created_at: "2024-05-01T10:00:00Z".to_string(),
        };

        let result = ContextMessage::try_from(row);
        assert!(matches!(result, Err(DatabaseError::Corrupt { .. })));
    }
}
