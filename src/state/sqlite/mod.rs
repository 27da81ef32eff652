use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::db::migrations;

pub(crate) mod behaviors;
pub(crate) mod notifications;
pub(crate) mod users;


/// The authoritative relational store: behavior events, the user fields this
/// core owns, and notifications. One pool for the whole process; background
/// work checks out its own connections and never reuses a request's.
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    pub async fn new(db_path: &str) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        migrations::run_all(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Parse an RFC 3339 timestamp stored as TEXT back into UTC.
pub(crate) fn parse_ts(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(|e| anyhow::anyhow!("Invalid stored timestamp '{}': {}", raw, e))?
        .with_timezone(&Utc))
}

/// Read an RFC 3339 TEXT column from a row.
pub(crate) fn ts_column(row: &sqlx::sqlite::SqliteRow, name: &str) -> anyhow::Result<DateTime<Utc>> {
    let raw: String = row.get(name);
    parse_ts(&raw)
}
