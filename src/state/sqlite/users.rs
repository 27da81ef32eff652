use chrono::{DateTime, Utc};
use sqlx::Row;

use super::{parse_ts, SqliteStateStore};

impl SqliteStateStore {
    /// Ids of every active user, for the scheduler fan-out.
    pub async fn active_user_ids(&self) -> anyhow::Result<Vec<i64>> {
        let rows = sqlx::query("SELECT id FROM users WHERE is_active = 1")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    /// The user's stored last-hydration-reminder time, if any. Unknown users
    /// read as `None`; the scheduler treats both the same way.
    pub async fn last_hydration_remind_at(
        &self,
        user_id: i64,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        let row = sqlx::query("SELECT last_hydration_remind_at FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: Option<String> = row.get("last_hydration_remind_at");
                match raw {
                    Some(raw) => Ok(Some(parse_ts(&raw)?)),
                    None => Ok(None),
                }
            }
            None => Ok(None),
        }
    }

    /// Create (or find) a user by name. Account management proper lives in a
    /// separate service; this exists for local bootstrap and tests.
    pub async fn seed_user(&self, username: &str) -> anyhow::Result<i64> {
        sqlx::query("INSERT OR IGNORE INTO users (username, is_active, created_at) VALUES (?, 1, ?)")
            .bind(username)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        let row = sqlx::query("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("id"))
    }

    #[cfg(test)]
    pub async fn set_user_active(&self, user_id: i64, active: bool) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(active as i32)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Stamp the last-hydration-reminder time inside an open transaction; commits
/// together with the reminder notification.
pub(crate) async fn set_last_hydration_remind_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    user_id: i64,
    at: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET last_hydration_remind_at = ? WHERE id = ?")
        .bind(at.to_rfc3339())
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
