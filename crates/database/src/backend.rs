//! Storage seams used by the settings and context stores.
//!
//! [`Database`] is the production implementation. [`crate::MemoryBackend`]
//! backs tests and ephemeral runs.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ContextMessage, UserSettings};
use crate::{user_context, user_settings, Database};

/// Durable storage for per-user settings records.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    /// Load the record for a user, if one exists.
    async fn load_settings(&self, user_id: i64) -> Result<Option<UserSettings>>;

    /// Store `defaults` unless a record exists. Returns whichever record is stored.
    async fn insert_settings_if_absent(&self, defaults: &UserSettings) -> Result<UserSettings>;

    /// Overwrite an existing record.
    async fn save_settings(&self, settings: &UserSettings) -> Result<()>;

    /// Number of users per stored style key.
    async fn count_by_style(&self) -> Result<Vec<(String, i64)>>;

    /// Number of settings records.
    async fn count_users(&self) -> Result<i64>;
}

/// Durable storage for per-user dialogue logs.
#[async_trait]
pub trait ContextBackend: Send + Sync {
    /// Append a turn to the end of the user's log.
    async fn append_message(&self, message: &ContextMessage) -> Result<()>;

    /// Append a turn unless its id is already stored anywhere. Returns whether it was written.
    async fn append_message_if_absent(&self, message: &ContextMessage) -> Result<bool>;

    /// The `limit` newest turns, oldest first.
    async fn recent_messages(&self, user_id: i64, limit: usize) -> Result<Vec<ContextMessage>>;

    /// The whole log, oldest first.
    async fn all_messages(&self, user_id: i64) -> Result<Vec<ContextMessage>>;

    /// Remove the whole log. Returns how many turns were removed.
    async fn delete_messages(&self, user_id: i64) -> Result<u64>;

    /// Drop all but the `keep` newest turns. Returns how many were removed.
    async fn retain_latest(&self, user_id: i64, keep: usize) -> Result<u64>;

    /// Users with a non-empty log and total stored turns.
    async fn global_counts(&self) -> Result<(i64, i64)>;
}

#[async_trait]
impl SettingsBackend for Database {
    async fn load_settings(&self, user_id: i64) -> Result<Option<UserSettings>> {
        user_settings::get_settings(self.pool(), user_id).await
    }

    async fn insert_settings_if_absent(&self, defaults: &UserSettings) -> Result<UserSettings> {
        user_settings::insert_if_absent(self.pool(), defaults).await
    }

    async fn save_settings(&self, settings: &UserSettings) -> Result<()> {
        user_settings::update_settings(self.pool(), settings).await
    }

    async fn count_by_style(&self) -> Result<Vec<(String, i64)>> {
        user_settings::count_users_by_style(self.pool()).await
    }

    async fn count_users(&self) -> Result<i64> {
        user_settings::count_users(self.pool()).await
    }
}

#[async_trait]
impl ContextBackend for Database {
    async fn append_message(&self, message: &ContextMessage) -> Result<()> {
        user_context::insert_message(self.pool(), message).await
    }

    async fn append_message_if_absent(&self, message: &ContextMessage) -> Result<bool> {
        user_context::insert_message_if_absent(self.pool(), message).await
    }

    async fn recent_messages(&self, user_id: i64, limit: usize) -> Result<Vec<ContextMessage>> {
        user_context::list_recent(self.pool(), user_id, limit).await
    }

    async fn all_messages(&self, user_id: i64) -> Result<Vec<ContextMessage>> {
        user_context::list_all(self.pool(), user_id).await
    }

    async fn delete_messages(&self, user_id: i64) -> Result<u64> {
        user_context::delete_for_user(self.pool(), user_id).await
    }

    async fn retain_latest(&self, user_id: i64, keep: usize) -> Result<u64> {
        user_context::retain_latest(self.pool(), user_id, keep).await
    }

    async fn global_counts(&self) -> Result<(i64, i64)> {
        user_context::global_counts(self.pool()).await
    }
}
