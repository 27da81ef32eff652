//! Pattern trigger engine: stateless rules evaluated against each incoming
//! event, with side effects scheduled off the request path.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde_json::json;
use tracing::{error, info};

use crate::state::sqlite::{behaviors, notifications};
use crate::state::SqliteStateStore;
use crate::types::NotificationCategory;

/// The household's local zone (UTC+8). The late-night window is defined in
/// this zone regardless of where the server runs.
const LOCAL_OFFSET_HOURS: i32 = 8;
const NIGHT_START_HOUR: u32 = 20;
const NIGHT_END_HOUR: u32 = 4;

const CARE_TITLE: &str = "Welcome home";
const CARE_BODY: &str =
    "We noticed you came home late. The air conditioner has been turned on for you, please rest well.";
const CARE_RAW_CONTENT: &str = "The air conditioner was turned on automatically, set to 24°C";
const CARE_SEMANTIC_CONTENT: &str =
    "The butler noticed a late-night return and turned on the air conditioning at 24°C.";

pub struct PatternEngine {
    state: Arc<SqliteStateStore>,
}

impl PatternEngine {
    pub fn new(state: Arc<SqliteStateStore>) -> Self {
        Self { state }
    }

    /// Evaluate the late-night-return rule for a just-persisted event and,
    /// on a match, schedule the care job. Stateless: every qualifying event
    /// fires again.
    pub fn evaluate(&self, user_id: i64, device_id: &str, action_type: &str, now: DateTime<Utc>) {
        if !matches_late_night_return(device_id, action_type, now) {
            return;
        }

        info!(user_id, device_id, action_type, "Late-night return detected");
        let state = self.state.clone();
        tokio::spawn(async move {
            if let Err(e) = run_care_job(&state, user_id).await {
                error!(user_id, "Late-night care job failed: {:#}", e);
            }
        });
    }
}

fn local_hour(now: DateTime<Utc>) -> u32 {
    let offset =
        FixedOffset::east_opt(LOCAL_OFFSET_HOURS * 3600).expect("UTC+8 is a valid offset");
    now.with_timezone(&offset).hour()
}

/// True when a door-unlock style event lands inside the 20:00–04:00 local
/// window.
pub(crate) fn matches_late_night_return(
    device_id: &str,
    action_type: &str,
    now: DateTime<Utc>,
) -> bool {
    let action_ok = matches!(action_type, "unlock_door" | "open");
    let device_ok = matches!(device_id, "door" | "unlock_door");
    if !action_ok || !device_ok {
        return false;
    }

    let hour = local_hour(now);
    hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
}

/// Create the courtesy notification and the synthetic system-initiated AC
/// event in one transaction.
async fn run_care_job(state: &SqliteStateStore, user_id: i64) -> anyhow::Result<()> {
    let now = Utc::now();

    let mut tx = state.pool().begin().await?;
    notifications::insert_notification_tx(
        &mut tx,
        user_id,
        NotificationCategory::Reminder,
        CARE_TITLE,
        CARE_BODY,
        now,
    )
    .await?;
    behaviors::insert_synthetic_behavior(
        &mut tx,
        user_id,
        "ac",
        "toggle_ac",
        &json!({
            "status": "on",
            "temperature": 24,
            "mode": "auto",
            "reason": "late_night_return",
        }),
        CARE_RAW_CONTENT,
        CARE_SEMANTIC_CONTENT,
        now,
    )
    .await?;
    tx.commit().await?;

    info!(user_id, "Late-night care committed");
    Ok(())
}
