//! One-shot import of the JSON files written by earlier deployments.
//!
//! `user-settings.json` holds an array of settings objects; records written
//! before context support existed have no `contextSettings` and get the
//! defaults. `user-contexts.json` maps a user id string to that user's turns.
//!
//! Re-running an import is safe: stored settings are kept and turns whose id
//! is already stored are skipped. Turns without an id get one derived from
//! their user and position, so they are recognised on the next run too.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::backend::{ContextBackend, SettingsBackend};
use crate::error::Result;
use crate::models::{
    parse_timestamp, ContextMessage, ContextSettings, MessageType, Role, UserSettings,
    DEFAULT_RESPONSE_STYLE,
};

/// What an import run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Settings records inserted. Existing records are never overwritten.
    pub users: usize,
    /// Dialogue turns appended.
    pub messages: usize,
    /// Entries skipped because they failed validation or were already stored.
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacySettings {
    user_id: i64,
    username: Option<String>,
    response_style: Option<String>,
    context_settings: Option<LegacyContextSettings>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyContextSettings {
    max_messages: Option<usize>,
    max_tokens: Option<usize>,
    enabled: Option<bool>,
    auto_cleanup: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyMessage {
    id: Option<String>,
    role: String,
    content: String,
    message_type: Option<String>,
    timestamp: Option<String>,
    token_count: Option<usize>,
}

impl LegacySettings {
    fn into_settings(self) -> UserSettings {
        let defaults = ContextSettings::default();
        let context_settings = match self.context_settings {
            Some(ctx) => ContextSettings {
                max_messages: ctx.max_messages.filter(|v| *v > 0).unwrap_or(defaults.max_messages),
                max_tokens: ctx.max_tokens.filter(|v| *v > 0).unwrap_or(defaults.max_tokens),
                enabled: ctx.enabled.unwrap_or(defaults.enabled),
                auto_cleanup: ctx.auto_cleanup.unwrap_or(defaults.auto_cleanup),
            },
            None => defaults,
        };

        let mut settings = UserSettings::with_defaults(
            self.user_id,
            self.username.as_deref(),
            self.response_style.as_deref().unwrap_or(DEFAULT_RESPONSE_STYLE),
            context_settings,
        );
        if let Some(created_at) = self.created_at.as_deref().and_then(parse_timestamp) {
            settings.created_at = created_at;
        }
        if let Some(updated_at) = self.updated_at.as_deref().and_then(parse_timestamp) {
            settings.updated_at = updated_at;
        }
        settings
    }
}

impl LegacyMessage {
    fn into_message(self, user_id: i64, position: usize) -> std::result::Result<ContextMessage, String> {
        let role = self.role.parse::<Role>()?;
        let message_type = match self.message_type.as_deref() {
            Some(raw) => raw.parse::<MessageType>()?,
            None => MessageType::Text,
        };

        let mut message = ContextMessage::new(user_id, role, self.content, message_type, 0);
        message.token_count = self.token_count;
        message.id = match self.id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => format!("legacy-{}-{}", user_id, position),
        };
        if let Some(ts) = self.timestamp.as_deref().and_then(parse_timestamp) {
            message.timestamp = ts;
        }
        Ok(message)
    }
}

/// Import legacy JSON files into `backend`. Missing files are skipped.
pub async fn import_files<B>(
    backend: &B,
    settings_path: &Path,
    contexts_path: &Path,
) -> Result<ImportReport>
where
    B: SettingsBackend + ContextBackend,
{
    let mut report = ImportReport::default();

    if let Some(raw) = read_optional(settings_path).await? {
        let records: Vec<LegacySettings> = serde_json::from_str(&raw)?;
        for record in records {
            let user_id = record.user_id;
            if backend.load_settings(user_id).await?.is_some() {
                info!("Settings for user {} already present, keeping stored record", user_id);
                continue;
            }
            backend.insert_settings_if_absent(&record.into_settings()).await?;
            report.users += 1;
        }
    }

    if let Some(raw) = read_optional(contexts_path).await? {
        let logs: IndexMap<String, Vec<LegacyMessage>> = serde_json::from_str(&raw)?;
        for (key, messages) in logs {
            let Ok(user_id) = key.parse::<i64>() else {
                warn!("Skipping context log with non-numeric user id '{}'", key);
                report.skipped += messages.len();
                continue;
            };
            for (position, legacy) in messages.into_iter().enumerate() {
                match legacy.into_message(user_id, position) {
                    Ok(message) => {
                        if backend.append_message_if_absent(&message).await? {
                            report.messages += 1;
                        } else {
                            debug!("Context message {} already imported, skipping", message.id);
                            report.skipped += 1;
                        }
                    }
                    Err(reason) => {
                        warn!("Skipping context message for user {}: {}", user_id, reason);
                        report.skipped += 1;
                    }
                }
            }
        }
    }

    info!(
        "Legacy import complete: {} users, {} messages, {} skipped",
        report.users, report.messages, report.skipped
    );

    Ok(report)
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("Legacy file {} not found, skipping", path.display());
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
