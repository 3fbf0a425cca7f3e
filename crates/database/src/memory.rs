//! In-process backend that keeps everything in maps.

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::backend::{ContextBackend, SettingsBackend};
use crate::error::{DatabaseError, Result};
use crate::models::{ContextMessage, UserSettings};

/// Non-durable backend. Insertion order is kept for users and turns.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    settings: RwLock<IndexMap<i64, UserSettings>>,
    contexts: RwLock<IndexMap<i64, Vec<ContextMessage>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsBackend for MemoryBackend {
    async fn load_settings(&self, user_id: i64) -> Result<Option<UserSettings>> {
        Ok(self.settings.read().await.get(&user_id).cloned())
    }

    async fn insert_settings_if_absent(&self, defaults: &UserSettings) -> Result<UserSettings> {
        let mut settings = self.settings.write().await;
        let stored = settings
            .entry(defaults.user_id)
            .or_insert_with(|| defaults.clone());
        Ok(stored.clone())
    }

    async fn save_settings(&self, updated: &UserSettings) -> Result<()> {
        let mut settings = self.settings.write().await;
        match settings.get_mut(&updated.user_id) {
            Some(existing) => {
                *existing = updated.clone();
                Ok(())
            }
            None => Err(DatabaseError::NotFound {
                entity: "UserSettings",
                id: updated.user_id.to_string(),
            }),
        }
    }

    async fn count_by_style(&self) -> Result<Vec<(String, i64)>> {
        let settings = self.settings.read().await;
        let mut counts: IndexMap<String, i64> = IndexMap::new();
        for record in settings.values() {
            *counts.entry(record.response_style.clone()).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn count_users(&self) -> Result<i64> {
        Ok(self.settings.read().await.len() as i64)
    }
}

#[async_trait]
impl ContextBackend for MemoryBackend {
    async fn append_message(&self, message: &ContextMessage) -> Result<()> {
        self.contexts
            .write()
            .await
            .entry(message.user_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn append_message_if_absent(&self, message: &ContextMessage) -> Result<bool> {
        let mut contexts = self.contexts.write().await;
        let stored = contexts
            .values()
            .flatten()
            .any(|existing| existing.id == message.id);
        if stored {
            return Ok(false);
        }
        contexts
            .entry(message.user_id)
            .or_default()
            .push(message.clone());
        Ok(true)
    }

    async fn recent_messages(&self, user_id: i64, limit: usize) -> Result<Vec<ContextMessage>> {
        let contexts = self.contexts.read().await;
        let log = contexts.get(&user_id).map(Vec::as_slice).unwrap_or_default();
        let start = log.len().saturating_sub(limit);
        Ok(log[start..].to_vec())
    }

    async fn all_messages(&self, user_id: i64) -> Result<Vec<ContextMessage>> {
        Ok(self
            .contexts
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_messages(&self, user_id: i64) -> Result<u64> {
        let removed = self.contexts.write().await.shift_remove(&user_id);
        Ok(removed.map(|log| log.len() as u64).unwrap_or(0))
    }

    async fn retain_latest(&self, user_id: i64, keep: usize) -> Result<u64> {
        let mut contexts = self.contexts.write().await;
        let Some(log) = contexts.get_mut(&user_id) else {
            return Ok(0);
        };
        let excess = log.len().saturating_sub(keep);
        log.drain(..excess);
        if log.is_empty() {
            contexts.shift_remove(&user_id);
        }
        Ok(excess as u64)
    }

    async fn global_counts(&self) -> Result<(i64, i64)> {
        let contexts = self.contexts.read().await;
        let users = contexts.values().filter(|log| !log.is_empty()).count();
        let messages: usize = contexts.values().map(Vec::len).sum();
        Ok((users as i64, messages as i64))
    }
}
