use chrono::{DateTime, Utc};
use sqlx::Row;

use super::{ts_column, SqliteStateStore};
use crate::traits::Notification;
use crate::types::NotificationCategory;

impl SqliteStateStore {
    /// Single-insert notification sink. The caller-supplied timestamp is
    /// stored verbatim, never overwritten with the current time.
    pub async fn create_notification(
        &self,
        user_id: i64,
        category: NotificationCategory,
        title: &str,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        let result = sqlx::query(
            "INSERT INTO notifications (user_id, category, title, body, is_read, created_at)
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(user_id)
        .bind(category.as_str())
        .bind(title)
        .bind(body)
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Newest-first notifications for a user.
    pub async fn list_notifications(&self, user_id: i64) -> anyhow::Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, user_id, category, title, body, is_read, created_at
             FROM notifications WHERE user_id = ?
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut notifications = Vec::with_capacity(rows.len());
        for row in &rows {
            let category: String = row.get("category");
            notifications.push(Notification {
                id: row.get("id"),
                user_id: row.get("user_id"),
                category: NotificationCategory::parse(&category),
                title: row.get("title"),
                body: row.get::<Option<String>, _>("body").unwrap_or_default(),
                is_read: row.get::<i32, _>("is_read") != 0,
                created_at: ts_column(row, "created_at")?,
            });
        }
        Ok(notifications)
    }
}

/// Transaction-scoped insert for the paths that must commit a notification
/// together with another write (care job, hydration reminder).
pub(crate) async fn insert_notification_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    user_id: i64,
    category: NotificationCategory,
    title: &str,
    body: &str,
    created_at: DateTime<Utc>,
) -> anyhow::Result<i64> {
    let result = sqlx::query(
        "INSERT INTO notifications (user_id, category, title, body, is_read, created_at)
         VALUES (?, ?, ?, ?, 0, ?)",
    )
    .bind(user_id)
    .bind(category.as_str())
    .bind(title)
    .bind(body)
    .bind(created_at.to_rfc3339())
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}
