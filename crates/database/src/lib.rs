//! SQLite persistence layer for the assistant.
//!
//! This crate stores per-user settings and the rolling dialogue log using
//! SQLx with SQLite. The stores in `orchestrator` talk to it through the
//! [`SettingsBackend`] and [`ContextBackend`] traits, which [`Database`] and
//! [`MemoryBackend`] both implement.
//!
//! # Example
//!
//! ```no_run
//! use database::{ContextSettings, Database, UserSettings, user_settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:data/bot.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let defaults = UserSettings::with_defaults(42, Some("alice"), "friendly", ContextSettings::default());
//!     let stored = user_settings::insert_if_absent(db.pool(), &defaults).await?;
//!     println!("style: {}", stored.response_style);
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod legacy;
pub mod memory;
pub mod models;
pub mod user_context;
pub mod user_settings;

pub use backend::{ContextBackend, SettingsBackend};
pub use error::{DatabaseError, Result};
pub use memory::MemoryBackend;
pub use models::{
    ContextMessage, ContextSettings, ContextSettingsPatch, MessageType, Role, UserSettings,
    DEFAULT_RESPONSE_STYLE,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/bot.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing, use a pool size of 1)
    /// let db = database::Database::connect_with_pool_size("sqlite::memory:", 1).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    ///
    /// For file databases the parent directory is created first.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        if let Some(dir) = database_file(url).as_deref().and_then(Path::parent) {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }

        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// The file path behind a `sqlite:` URL, or `None` for in-memory databases.
fn database_file(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_file() {
        assert_eq!(
            database_file("sqlite:data/bot.db?mode=rwc"),
            Some(PathBuf::from("data/bot.db"))
        );
        assert_eq!(
            database_file("sqlite:///var/lib/bot.db"),
            Some(PathBuf::from("/var/lib/bot.db"))
        );
        assert_eq!(database_file("sqlite::memory:"), None);
        assert_eq!(database_file("postgres://localhost/db"), None);
    }

    #[tokio::test]
    async fn test_connect_creates_missing_directory() {
        let root = std::env::temp_dir().join(format!("db-{}", uuid::Uuid::new_v4()));
        let url = format!("sqlite:{}?mode=rwc", root.join("data").join("bot.db").display());

        let db = Database::connect_with_pool_size(&url, 1).await.unwrap();
        db.migrate().await.unwrap();
        assert!(root.join("data").join("bot.db").exists());

        db.close().await;
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_settings_crud() {
        let db = test_db().await;

        // Missing record
        assert!(user_settings::get_settings(db.pool(), 1).await.unwrap().is_none());

        // Insert
        let defaults = UserSettings::with_defaults(1, Some("alice"), "friendly", ContextSettings::default());
        let stored = user_settings::insert_if_absent(db.pool(), &defaults).await.unwrap();
        assert_eq!(stored.response_style, "friendly");
        assert_eq!(stored.context_settings, ContextSettings::default());

        // Second insert keeps the first record
        let other = UserSettings::with_defaults(1, Some("mallory"), "calm", ContextSettings::default());
        let stored = user_settings::insert_if_absent(db.pool(), &other).await.unwrap();
        assert_eq!(stored.username.as_deref(), Some("alice"));

        // Update
        let updated = UserSettings {
            response_style: "expert".to_string(),
            context_settings: ContextSettings {
                max_messages: 4,
                ..ContextSettings::default()
            },
            ..stored
        };
        user_settings::update_settings(db.pool(), &updated).await.unwrap();
        let fetched = user_settings::get_settings(db.pool(), 1).await.unwrap().unwrap();
        assert_eq!(fetched.response_style, "expert");
        assert_eq!(fetched.context_settings.max_messages, 4);

        // Counts
        assert_eq!(user_settings::count_users(db.pool()).await.unwrap(), 1);
        let by_style = user_settings::count_users_by_style(db.pool()).await.unwrap();
        assert_eq!(by_style, vec![("expert".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_update_missing_settings() {
        let db = test_db().await;
        let settings = UserSettings::with_defaults(5, None, "friendly", ContextSettings::default());

        let result = user_settings::update_settings(db.pool(), &settings).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_context_log_ordering_and_retention() {
        let db = test_db().await;

        for i in 0..6 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            let msg = ContextMessage::new(7, role, format!("turn {}", i), MessageType::Text, 2);
            user_context::insert_message(db.pool(), &msg).await.unwrap();
        }
        let other = ContextMessage::new(8, Role::User, "elsewhere", MessageType::Voice, 1);
        user_context::insert_message(db.pool(), &other).await.unwrap();

        let recent = user_context::list_recent(db.pool(), 7, 3).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["turn 3", "turn 4", "turn 5"]);

        let removed = user_context::retain_latest(db.pool(), 7, 2).await.unwrap();
        assert_eq!(removed, 4);
        let all = user_context::list_all(db.pool(), 7).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].content, "turn 4");
        assert_eq!(all[0].token_count, Some(2));

        assert_eq!(user_context::global_counts(db.pool()).await.unwrap(), (2, 3));

        let deleted = user_context::delete_for_user(db.pool(), 7).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(user_context::global_counts(db.pool()).await.unwrap(), (1, 1));

        let voice = user_context::list_all(db.pool(), 8).await.unwrap();
        assert_eq!(voice[0].message_type, MessageType::Voice);
    }

    #[tokio::test]
    async fn test_backend_trait_on_database() {
        let db = test_db().await;
        let backend: &dyn ContextBackend = &db;

        let msg = ContextMessage::new(3, Role::User, "hello", MessageType::Text, 1);
        backend.append_message(&msg).await.unwrap();
        let log = backend.all_messages(3).await.unwrap();
        assert_eq!(log[0].id, msg.id);
        assert_eq!(log[0].content, "hello");
    }
}
