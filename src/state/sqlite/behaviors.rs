use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::Row;

use super::{parse_ts, ts_column, SqliteStateStore};
use crate::traits::{BehaviorEvent, NewBehavior};

impl SqliteStateStore {
    /// Insert a caller-supplied behavior event. Semantic content starts NULL;
    /// the enrichment worker patches it later.
    pub async fn insert_behavior(&self, input: &NewBehavior) -> anyhow::Result<BehaviorEvent> {
        let now = Utc::now();
        let details_json = match &input.details {
            Some(v) => Some(serde_json::to_string(v)?),
            None => None,
        };

        let result = sqlx::query(
            "INSERT INTO behaviors
                (user_id, device_id, action_type, details, raw_content, semantic_content, occurred_at, created_at)
             VALUES (?, ?, ?, ?, ?, NULL, ?, ?)",
        )
        .bind(input.user_id)
        .bind(&input.device_id)
        .bind(&input.action_type)
        .bind(&details_json)
        .bind(&input.raw_content)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(BehaviorEvent {
            id: result.last_insert_rowid(),
            user_id: input.user_id,
            device_id: input.device_id.clone(),
            action_type: input.action_type.clone(),
            details: input.details.clone(),
            raw_content: input.raw_content.clone(),
            semantic_content: None,
            occurred_at: now,
            created_at: now,
        })
    }

    /// Patch the semantic description of an already-stored event. The whole
    /// string lands in one UPDATE, so a reader never sees a partial write.
    pub async fn update_semantic_content(
        &self,
        behavior_id: i64,
        semantic_content: &str,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE behaviors SET semantic_content = ? WHERE id = ?")
            .bind(semantic_content)
            .bind(behavior_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_behavior(&self, behavior_id: i64) -> anyhow::Result<Option<BehaviorEvent>> {
        let row = sqlx::query(
            "SELECT id, user_id, device_id, action_type, details, raw_content, semantic_content, occurred_at, created_at
             FROM behaviors WHERE id = ?",
        )
        .bind(behavior_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_behavior(&row)?)),
            None => Ok(None),
        }
    }

    /// Newest-first listing, optionally scoped to one user.
    pub async fn list_behaviors(
        &self,
        user_id: Option<i64>,
        limit: i64,
    ) -> anyhow::Result<Vec<BehaviorEvent>> {
        let rows = match user_id {
            Some(uid) => {
                sqlx::query(
                    "SELECT id, user_id, device_id, action_type, details, raw_content, semantic_content, occurred_at, created_at
                     FROM behaviors WHERE user_id = ?
                     ORDER BY occurred_at DESC LIMIT ?",
                )
                .bind(uid)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, user_id, device_id, action_type, details, raw_content, semantic_content, occurred_at, created_at
                     FROM behaviors
                     ORDER BY occurred_at DESC LIMIT ?",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_behavior).collect()
    }

    /// When the user most recently performed `action_type`, if ever.
    pub async fn last_action_at(
        &self,
        user_id: i64,
        action_type: &str,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        let row = sqlx::query(
            "SELECT occurred_at FROM behaviors
             WHERE user_id = ? AND action_type = ?
             ORDER BY occurred_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(action_type)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let raw: String = row.get("occurred_at");
                Ok(Some(parse_ts(&raw)?))
            }
            None => Ok(None),
        }
    }
}

/// Insert a fully formed system-authored behavior inside an open transaction.
/// Used by the late-night care job, which pre-authors both the raw and the
/// semantic text instead of going through enrichment.
pub(crate) async fn insert_synthetic_behavior(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    user_id: i64,
    device_id: &str,
    action_type: &str,
    details: &Value,
    raw_content: &str,
    semantic_content: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<i64> {
    let result = sqlx::query(
        "INSERT INTO behaviors
            (user_id, device_id, action_type, details, raw_content, semantic_content, occurred_at, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(device_id)
    .bind(action_type)
    .bind(serde_json::to_string(details)?)
    .bind(raw_content)
    .bind(semantic_content)
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}

fn row_to_behavior(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<BehaviorEvent> {
    let details_raw: Option<String> = row.get("details");
    let details = match details_raw {
        Some(raw) => Some(serde_json::from_str(&raw)?),
        None => None,
    };

    Ok(BehaviorEvent {
        id: row.get("id"),
        user_id: row.get("user_id"),
        device_id: row.get("device_id"),
        action_type: row.get("action_type"),
        details,
        raw_content: row.get("raw_content"),
        semantic_content: row.get("semantic_content"),
        occurred_at: ts_column(row, "occurred_at")?,
        created_at: ts_column(row, "created_at")?,
    })
}
