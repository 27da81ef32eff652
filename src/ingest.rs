//! Front door for behavior events: durable synchronous insert, then
//! fire-and-forget enrichment and pattern evaluation.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::enrichment::EnrichmentWorker;
use crate::patterns::PatternEngine;
use crate::state::SqliteStateStore;
use crate::traits::{BehaviorEvent, NewBehavior};

pub struct BehaviorGateway {
    state: Arc<SqliteStateStore>,
    enrichment: Arc<EnrichmentWorker>,
    patterns: PatternEngine,
}

impl BehaviorGateway {
    pub fn new(
        state: Arc<SqliteStateStore>,
        enrichment: Arc<EnrichmentWorker>,
        patterns: PatternEngine,
    ) -> Self {
        Self {
            state,
            enrichment,
            patterns,
        }
    }

    /// Persist the event and return it with its assigned id. Enrichment has
    /// not run when this returns; `semantic_content` is still null. A write
    /// failure surfaces here; nothing that happens afterwards can undo the
    /// committed row.
    pub async fn record(&self, input: NewBehavior) -> anyhow::Result<BehaviorEvent> {
        let event = self.state.insert_behavior(&input).await?;
        info!(
            behavior_id = event.id,
            user_id = event.user_id,
            action_type = %event.action_type,
            "Behavior recorded"
        );

        // Background work gets owned primitives copied out of the row, never
        // the row's storage session.
        let behavior_id = event.id;
        let user_id = event.user_id;
        let raw_content = event
            .raw_content
            .clone()
            .unwrap_or_else(|| event.action_type.clone());
        let details = event.details.clone();

        let worker = self.enrichment.clone();
        tokio::spawn(async move {
            worker.enrich(behavior_id, user_id, raw_content, details).await;
        });

        self.patterns
            .evaluate(user_id, &event.device_id, &event.action_type, Utc::now());

        Ok(event)
    }
}
