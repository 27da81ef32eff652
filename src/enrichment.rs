//! Off-request enrichment pipeline: description → embedding → vector write →
//! relational patch. Runs in its own spawned task; failures never reach the
//! ingestion caller.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::state::SqliteStateStore;
use crate::traits::{Embedder, TextGenerator, VectorMemory};
use crate::utils::truncate_str;

/// Fixed instruction for the description generator.
const SYSTEM_PROMPT: &str =
    "You are a smart-home butler. Describe the user's latest action.";

pub struct EnrichmentWorker {
    text: Arc<dyn TextGenerator>,
    embedder: Arc<dyn Embedder>,
    vectors: Arc<dyn VectorMemory>,
    state: Arc<SqliteStateStore>,
}

impl EnrichmentWorker {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorMemory>,
        state: Arc<SqliteStateStore>,
    ) -> Self {
        Self {
            text,
            embedder,
            vectors,
            state,
        }
    }

    /// Run the full pipeline for one event. Never returns an error: any stage
    /// failing aborts the rest, gets logged with the behavior id, and is
    /// swallowed. The event then simply stays un-enriched.
    pub async fn enrich(
        &self,
        behavior_id: i64,
        user_id: i64,
        raw_content: String,
        details: Option<Value>,
    ) {
        if let Err(e) = self
            .try_enrich(behavior_id, user_id, &raw_content, details.as_ref())
            .await
        {
            error!(behavior_id, user_id, "Semantic enrichment failed: {:#}", e);
        }
    }

    async fn try_enrich(
        &self,
        behavior_id: i64,
        user_id: i64,
        raw_content: &str,
        details: Option<&Value>,
    ) -> anyhow::Result<()> {
        let prompt = build_prompt(raw_content, details);

        info!(behavior_id, "Generating semantic description");
        let description = self
            .text
            .generate(&prompt, SYSTEM_PROMPT)
            .await
            .context("generate description")?;
        let description = trim_quotes(&description);
        if description.is_empty() {
            anyhow::bail!("text generator returned an empty description");
        }

        debug!(behavior_id, "Embedding description");
        let vector = self
            .embedder
            .embed(&description)
            .await
            .context("embed description")?;

        let timestamp = Utc::now().timestamp();
        self.vectors
            .insert(behavior_id, user_id, &description, &vector, timestamp)
            .await
            .context("vector memory insert")?;

        // Patch through a fresh pool connection; the session that created the
        // event is long gone by the time this runs.
        self.state
            .update_semantic_content(behavior_id, &description)
            .await
            .context("relational patch")?;

        info!(
            behavior_id,
            description = %truncate_str(&description, 120),
            "Semantic memory stored"
        );
        Ok(())
    }
}

fn build_prompt(raw_content: &str, details: Option<&Value>) -> String {
    let details_str = details
        .map(|d| d.to_string())
        .unwrap_or_else(|| "{}".to_string());
    format!(
        "Given the following information, write one concise natural-language sentence:\n\
         - Raw action: {}\n\
         - Parameters: {}\n\
         Include the actor, the device, the state, and key parameters when present. \
         Example: 'Mr. Chen turned on the air conditioner and set it to 24°C.'",
        raw_content, details_str
    )
}

/// Strip surrounding quote characters and whitespace from generated text.
fn trim_quotes(s: &str) -> String {
    s.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}
