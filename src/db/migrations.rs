use sqlx::SqlitePool;
use tracing::info;

/// Centralized database migrations for the SQLite-backed stores.
///
/// Each migration is safe to call multiple times (idempotent) by using
/// `IF NOT EXISTS` throughout.
pub(crate) async fn run_all(pool: &SqlitePool) -> anyhow::Result<()> {
    migrate_behaviors(pool).await?;
    migrate_users(pool).await?;
    migrate_notifications(pool).await?;
    Ok(())
}

pub(crate) async fn migrate_behaviors(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS behaviors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            device_id TEXT NOT NULL,
            action_type TEXT NOT NULL,
            details TEXT,
            raw_content TEXT,
            semantic_content TEXT,
            occurred_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_behaviors_user_time
         ON behaviors(user_id, occurred_at DESC)",
    )
    .execute(pool)
    .await?;

    // Latest drink_water lookup is the hot path of the hydration scheduler.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_behaviors_user_action_time
         ON behaviors(user_id, action_type, occurred_at DESC)",
    )
    .execute(pool)
    .await?;

    // Partial index keeps un-enriched rows cheap to sweep.
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_behaviors_pending
         ON behaviors(id) WHERE semantic_content IS NULL",
    )
    .execute(pool)
    .await?;

    info!("Behaviors table migration complete");
    Ok(())
}

pub(crate) async fn migrate_users(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            is_active INTEGER NOT NULL DEFAULT 1,
            last_hydration_remind_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_users_active
         ON users(id) WHERE is_active = 1",
    )
    .execute(pool)
    .await?;

    info!("Users table migration complete");
    Ok(())
}

pub(crate) async fn migrate_notifications(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            category TEXT NOT NULL,
            title TEXT NOT NULL,
            body TEXT,
            is_read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_notifications_user_time
         ON notifications(user_id, created_at DESC)",
    )
    .execute(pool)
    .await?;

    info!("Notifications table migration complete");
    Ok(())
}
