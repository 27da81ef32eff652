use std::sync::Arc;

use tracing::info;

use crate::api::{self, ApiState};
use crate::config::AppConfig;
use crate::enrichment::EnrichmentWorker;
use crate::hydration::HydrationScheduler;
use crate::ingest::BehaviorGateway;
use crate::memory::vector::SqliteVectorMemory;
use crate::patterns::PatternEngine;
use crate::providers::{HttpEmbedder, OpenAiCompatibleProvider};
use crate::state::SqliteStateStore;
use crate::traits::{Embedder, TextGenerator, VectorMemory};

/// Composition root: every long-lived handle is built here and passed down.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    // 1. State store
    let state = Arc::new(SqliteStateStore::new(&config.state.db_path).await?);
    info!("State store initialized ({})", config.state.db_path);

    // 2. Collaborators. Credentials are validated at first use, not here.
    let text: Arc<dyn TextGenerator> = Arc::new(OpenAiCompatibleProvider::new(&config.llm)?);
    let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(&config.embedding)?);
    let vectors: Arc<dyn VectorMemory> = Arc::new(
        SqliteVectorMemory::new(state.pool().clone(), config.embedding.dimensions).await?,
    );

    // 3. Enrichment worker + gateway
    let enrichment = Arc::new(EnrichmentWorker::new(
        text,
        embedder,
        vectors,
        state.clone(),
    ));
    let patterns = PatternEngine::new(state.clone());
    let gateway = Arc::new(BehaviorGateway::new(state.clone(), enrichment, patterns));

    // 4. Hydration scheduler
    let scheduler = Arc::new(HydrationScheduler::new(
        state.clone(),
        config.hydration.tick_secs,
    ));
    scheduler.spawn();

    // 5. API
    api::serve(ApiState { gateway, state }, config.api.port).await
}
