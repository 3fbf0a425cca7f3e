//! User settings store.
//!
//! One record per user holding the selected style and context budget,
//! created lazily with defaults on first access.

use std::sync::Arc;

use chrono::Utc;
use database::{ContextSettings, ContextSettingsPatch, DatabaseError, SettingsBackend, UserSettings};
use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::error::{OrchestratorError, ValidationError};
use crate::locks::KeyedLocks;
use crate::styles::{StyleDescription, StyleRegistry};

/// Authoritative per-user settings, backed by a [`SettingsBackend`].
pub struct UserSettingsStore {
    backend: Arc<dyn SettingsBackend>,
    registry: Arc<StyleRegistry>,
    default_style: String,
    default_context: ContextSettings,
    locks: KeyedLocks,
}

impl UserSettingsStore {
    pub fn new(backend: Arc<dyn SettingsBackend>, registry: Arc<StyleRegistry>) -> Self {
        Self {
            backend,
            registry,
            default_style: database::DEFAULT_RESPONSE_STYLE.to_string(),
            default_context: ContextSettings::default(),
            locks: KeyedLocks::new(),
        }
    }

    /// Style given to newly created records. Unknown keys are ignored.
    pub fn with_default_style(mut self, style: &str) -> Self {
        if self.registry.is_valid_style(style) {
            self.default_style = style.to_string();
        } else {
            warn!("Ignoring unknown default style '{}', keeping '{}'", style, self.default_style);
        }
        self
    }

    pub fn default_style(&self) -> &str {
        &self.default_style
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    /// A fresh default record that has not been persisted.
    pub fn defaults_for(&self, user_id: i64, username: Option<&str>) -> UserSettings {
        UserSettings::with_defaults(user_id, username, &self.default_style, self.default_context)
    }

    /// Get a user's settings, creating and persisting defaults on first access.
    ///
    /// A failed read degrades to unpersisted defaults. A stored record that
    /// no longer parses degrades the same way but is logged as an error, since
    /// it will not heal on retry. A failed insert of a new record is returned
    /// as an error. A changed `username` is refreshed
    /// on the stored record; failing to save it is only logged.
    pub async fn get_user_settings(
        &self,
        user_id: i64,
        username: Option<&str>,
    ) -> Result<UserSettings, OrchestratorError> {
        let _guard = self.locks.lock(user_id).await;

        let existing = match self.backend.load_settings(user_id).await {
            Ok(existing) => existing,
            Err(e @ DatabaseError::Corrupt { .. }) => {
                error!("Stored settings for user {} are corrupt, serving defaults: {}", user_id, e);
                return Ok(self.defaults_for(user_id, username));
            }
            Err(e) => {
                warn!("Failed to load settings for user {}: {}", user_id, e);
                return Ok(self.defaults_for(user_id, username));
            }
        };

        let Some(mut settings) = existing else {
            let created = self
                .backend
                .insert_settings_if_absent(&self.defaults_for(user_id, username))
                .await?;
            info!(
                "Created default settings for user {} (style: {})",
                user_id, created.response_style
            );
            return Ok(created);
        };

        if let Some(name) = username {
            if settings.username.as_deref() != Some(name) {
                settings.username = Some(name.to_string());
                settings.updated_at = Utc::now();
                if let Err(e) = self.backend.save_settings(&settings).await {
                    warn!("Failed to refresh username for user {}: {}", user_id, e);
                }
            }
        }

        Ok(settings)
    }

    /// Change a user's response style.
    ///
    /// The key is not checked against the registry here; callers validate
    /// with [`UserSettingsStore::is_valid_style`] first.
    pub async fn update_user_style(
        &self,
        user_id: i64,
        style_key: &str,
        username: Option<&str>,
    ) -> Result<UserSettings, OrchestratorError> {
        self.modify(user_id, username, |settings| {
            settings.response_style = style_key.to_string();
        })
        .await
        .inspect(|_| info!("User {} switched style to {}", user_id, style_key))
    }

    /// Merge a partial context configuration over the stored one.
    pub async fn update_user_context_settings(
        &self,
        user_id: i64,
        patch: ContextSettingsPatch,
        username: Option<&str>,
    ) -> Result<UserSettings, OrchestratorError> {
        validate_patch(&patch)?;

        self.modify(user_id, username, |settings| {
            settings.context_settings = patch.apply(settings.context_settings);
        })
        .await
        .inspect(|updated| {
            debug!(
                "User {} context settings now {:?}",
                user_id, updated.context_settings
            )
        })
    }

    /// Read-modify-write under the user's lock.
    async fn modify<F>(
        &self,
        user_id: i64,
        username: Option<&str>,
        change: F,
    ) -> Result<UserSettings, OrchestratorError>
    where
        F: FnOnce(&mut UserSettings),
    {
        let _guard = self.locks.lock(user_id).await;

        let mut settings = match self.backend.load_settings(user_id).await? {
            Some(settings) => settings,
            None => {
                self.backend
                    .insert_settings_if_absent(&self.defaults_for(user_id, username))
                    .await?
            }
        };

        change(&mut settings);
        if let Some(name) = username {
            settings.username = Some(name.to_string());
        }
        settings.updated_at = Utc::now();

        self.backend.save_settings(&settings).await?;
        Ok(settings)
    }

    pub fn is_valid_style(&self, key: &str) -> bool {
        self.registry.is_valid_style(key)
    }

    pub fn get_style_description(&self, key: &str) -> Option<StyleDescription> {
        self.registry.get(key).cloned()
    }

    /// All styles in registry order.
    pub fn get_all_styles(&self) -> Vec<StyleDescription> {
        self.registry.all().cloned().collect()
    }

    /// Users per style. Every registry key is present, zero counts included;
    /// stored keys no longer in the registry follow at the end.
    pub async fn get_style_stats(&self) -> IndexMap<String, usize> {
        let mut stats: IndexMap<String, usize> =
            self.registry.keys().map(|key| (key.to_string(), 0)).collect();

        match self.backend.count_by_style().await {
            Ok(counts) => {
                for (style, count) in counts {
                    *stats.entry(style).or_insert(0) += count.max(0) as usize;
                }
            }
            Err(e) => warn!("Failed to count users by style: {}", e),
        }

        stats
    }

    pub async fn get_users_count(&self) -> usize {
        match self.backend.count_users().await {
            Ok(count) => count.max(0) as usize,
            Err(e) => {
                warn!("Failed to count users: {}", e);
                0
            }
        }
    }
}

/// Context limits must stay positive.
pub fn validate_patch(patch: &ContextSettingsPatch) -> Result<(), ValidationError> {
    if patch.max_messages == Some(0) {
        return Err(ValidationError::NotPositive {
            field: "max_messages",
            value: "0".to_string(),
        });
    }
    if patch.max_tokens == Some(0) {
        return Err(ValidationError::NotPositive {
            field: "max_tokens",
            value: "0".to_string(),
        });
    }
    Ok(())
}
