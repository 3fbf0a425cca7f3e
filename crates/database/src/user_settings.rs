//! User settings persistence.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{format_timestamp, UserSettings, UserSettingsRow};

const SELECT_COLUMNS: &str = r#"
    SELECT user_id, username, response_style, context_enabled,
           context_max_messages, context_max_tokens, context_auto_cleanup,
           created_at, updated_at
    FROM user_settings
"#;

/// Get the settings record for a user, if one exists.
pub async fn get_settings(pool: &SqlitePool, user_id: i64) -> Result<Option<UserSettings>> {
    let row = sqlx::query_as::<_, UserSettingsRow>(&format!("{} WHERE user_id = ?", SELECT_COLUMNS))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    row.map(UserSettings::try_from).transpose()
}

/// Insert `defaults` unless a record already exists, then return the stored record.
///
/// Concurrent first access for the same user converges on a single row.
pub async fn insert_if_absent(pool: &SqlitePool, defaults: &UserSettings) -> Result<UserSettings> {
    sqlx::query(
        r#"
        INSERT INTO user_settings (
            user_id, username, response_style, context_enabled,
            context_max_messages, context_max_tokens, context_auto_cleanup,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(defaults.user_id)
    .bind(&defaults.username)
    .bind(&defaults.response_style)
    .bind(defaults.context_settings.enabled)
    .bind(defaults.context_settings.max_messages as i64)
    .bind(defaults.context_settings.max_tokens as i64)
    .bind(defaults.context_settings.auto_cleanup)
    .bind(format_timestamp(&defaults.created_at))
    .bind(format_timestamp(&defaults.updated_at))
    .execute(pool)
    .await?;

    get_settings(pool, defaults.user_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "UserSettings",
            id: defaults.user_id.to_string(),
        })
}

/// Overwrite the mutable fields of an existing record.
pub async fn update_settings(pool: &SqlitePool, settings: &UserSettings) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE user_settings
        SET username = ?, response_style = ?, context_enabled = ?,
            context_max_messages = ?, context_max_tokens = ?,
            context_auto_cleanup = ?, updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(&settings.username)
    .bind(&settings.response_style)
    .bind(settings.context_settings.enabled)
    .bind(settings.context_settings.max_messages as i64)
    .bind(settings.context_settings.max_tokens as i64)
    .bind(settings.context_settings.auto_cleanup)
    .bind(format_timestamp(&settings.updated_at))
    .bind(settings.user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "UserSettings",
            id: settings.user_id.to_string(),
        });
    }

    Ok(())
}

/// Count total users.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM user_settings
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Count users grouped by response style.
pub async fn count_users_by_style(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT response_style, COUNT(*) as count
        FROM user_settings
        GROUP BY response_style
        ORDER BY count DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
