//! Dialogue turn persistence.
//!
//! Turns are ordered by the autoincrement `seq` column, which always follows
//! insertion order even when two turns share a timestamp.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{format_timestamp, ContextMessage, ContextMessageRow};

/// Append a turn to a user's log.
pub async fn insert_message(pool: &SqlitePool, message: &ContextMessage) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_contexts (id, user_id, role, content, message_type, token_count, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&message.id)
    .bind(message.user_id)
    .bind(message.role.as_str())
    .bind(&message.content)
    .bind(message.message_type.as_str())
    .bind(message.token_count.map(|count| count as i64))
    .bind(format_timestamp(&message.timestamp))
    .execute(pool)
    .await?;

    Ok(())
}

/// Append a turn unless one with the same id is stored. Returns whether it was written.
pub async fn insert_message_if_absent(pool: &SqlitePool, message: &ContextMessage) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO user_contexts (id, user_id, role, content, message_type, token_count, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO NOTHING
        "#,
    )
    .bind(&message.id)
    .bind(message.user_id)
    .bind(message.role.as_str())
    .bind(&message.content)
    .bind(message.message_type.as_str())
    .bind(message.token_count.map(|count| count as i64))
    .bind(format_timestamp(&message.timestamp))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Get the `limit` most recent turns for a user, oldest first.
pub async fn list_recent(pool: &SqlitePool, user_id: i64, limit: usize) -> Result<Vec<ContextMessage>> {
    let rows = sqlx::query_as::<_, ContextMessageRow>(
        r#"
        SELECT id, user_id, role, content, message_type, token_count, created_at
        FROM (
            SELECT seq, id, user_id, role, content, message_type, token_count, created_at
            FROM user_contexts
            WHERE user_id = ?
            ORDER BY seq DESC
            LIMIT ?
        )
        ORDER BY seq ASC
        "#,
    )
    .bind(user_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ContextMessage::try_from).collect()
}

/// Get every stored turn for a user, oldest first.
pub async fn list_all(pool: &SqlitePool, user_id: i64) -> Result<Vec<ContextMessage>> {
    let rows = sqlx::query_as::<_, ContextMessageRow>(
        r#"
        SELECT id, user_id, role, content, message_type, token_count, created_at
        FROM user_contexts
        WHERE user_id = ?
        ORDER BY seq ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ContextMessage::try_from).collect()
}

/// Delete every turn for a user. Returns the number of rows removed.
pub async fn delete_for_user(pool: &SqlitePool, user_id: i64) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM user_contexts
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Keep only the `keep` most recent turns for a user.
pub async fn retain_latest(pool: &SqlitePool, user_id: i64, keep: usize) -> Result<u64> {
    if keep == 0 {
        return delete_for_user(pool, user_id).await;
    }

    let result = sqlx::query(
        r#"
        DELETE FROM user_contexts
        WHERE user_id = ?
          AND seq NOT IN (
            SELECT seq
            FROM user_contexts
            WHERE user_id = ?
            ORDER BY seq DESC
            LIMIT ?
          )
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .bind(keep as i64)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Count users with at least one stored turn and the total number of turns.
pub async fn global_counts(pool: &SqlitePool) -> Result<(i64, i64)> {
    let counts = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(DISTINCT user_id), COUNT(*)
        FROM user_contexts
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(counts)
}
