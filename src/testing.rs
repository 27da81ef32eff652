//! Test infrastructure: mock collaborators and a fully wired harness.
//!
//! The harness runs the real gateway, worker, stores, and vector memory on a
//! temp-file database; only the two remote collaborators are mocked.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::enrichment::EnrichmentWorker;
use crate::ingest::BehaviorGateway;
use crate::memory::vector::SqliteVectorMemory;
use crate::patterns::PatternEngine;
use crate::state::SqliteStateStore;
use crate::traits::{Embedder, TextGenerator, VectorMemory};

pub const TEST_EMBEDDING_DIM: usize = 8;

// ---------------------------------------------------------------------------
// MockTextGenerator
// ---------------------------------------------------------------------------

/// A recorded call to `MockTextGenerator::generate()`.
#[derive(Debug, Clone)]
pub struct MockGenerateCall {
    pub prompt: String,
    pub system_prompt: String,
}

/// Mock text generator that returns scripted responses.
pub struct MockTextGenerator {
    responses: Mutex<Vec<Result<String, String>>>,
    pub call_log: Mutex<Vec<MockGenerateCall>>,
}

impl MockTextGenerator {
    /// A generator that always returns a fixed description.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            call_log: Mutex::new(Vec::new()),
        }
    }

    /// A generator with a FIFO queue of scripted results.
    pub fn with_responses(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_log: Mutex::new(Vec::new()),
        }
    }

    /// A generator that fails every call.
    pub fn failing(message: &str) -> Self {
        Self::with_responses(vec![Err(message.to_string()); 16])
    }

    pub async fn call_count(&self) -> usize {
        self.call_log.lock().await.len()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> anyhow::Result<String> {
        self.call_log.lock().await.push(MockGenerateCall {
            prompt: prompt.to_string(),
            system_prompt: system_prompt.to_string(),
        });

        let mut responses = self.responses.lock().await;
        if responses.is_empty() {
            return Ok("\"Mr. Chen turned on the air conditioner, set to 24°C.\"".to_string());
        }
        match responses.remove(0) {
            Ok(text) => Ok(text),
            Err(message) => anyhow::bail!("{}", message),
        }
    }
}

// ---------------------------------------------------------------------------
// MockEmbedder
// ---------------------------------------------------------------------------

/// Mock embedder producing deterministic vectors: the same text always embeds
/// to the same vector, different texts to different ones.
pub struct MockEmbedder {
    dim: usize,
    emit_dim: usize,
    fail: bool,
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            emit_dim: dim,
            fail: false,
        }
    }

    pub fn failing(dim: usize) -> Self {
        Self {
            dim,
            emit_dim: dim,
            fail: true,
        }
    }

    /// An embedder whose vectors have the wrong length, for exercising the
    /// vector store's dimension check.
    pub fn with_emit_dim(dim: usize, emit_dim: usize) -> Self {
        Self {
            dim,
            emit_dim,
            fail: false,
        }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if self.fail {
            anyhow::bail!("embedding collaborator unavailable");
        }

        let mut vector = vec![0.0f32; self.emit_dim];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % self.emit_dim] += byte as f32 / 255.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dim
    }
}

// ---------------------------------------------------------------------------
// TestHarness
// ---------------------------------------------------------------------------

pub struct TestHarness {
    pub gateway: Arc<BehaviorGateway>,
    pub worker: Arc<EnrichmentWorker>,
    pub state: Arc<SqliteStateStore>,
    pub text: Arc<MockTextGenerator>,
    _db: tempfile::NamedTempFile,
}

impl TestHarness {
    /// Count vector records stored for one behavior id.
    pub async fn vector_count(&self, behavior_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM behavior_vectors WHERE behavior_id = ?")
            .bind(behavior_id)
            .fetch_one(self.state.pool())
            .await
            .unwrap()
    }

    /// Poll until the event's semantic content is set, or time out.
    pub async fn wait_for_semantic(&self, behavior_id: i64) -> Option<String> {
        for _ in 0..100 {
            let event = self.state.get_behavior(behavior_id).await.unwrap();
            if let Some(semantic) = event.and_then(|e| e.semantic_content) {
                return Some(semantic);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        None
    }
}

pub async fn setup_harness(text: MockTextGenerator, embedder: MockEmbedder) -> TestHarness {
    let db_file = tempfile::NamedTempFile::new().unwrap();
    let state = Arc::new(
        SqliteStateStore::new(db_file.path().to_str().unwrap())
            .await
            .unwrap(),
    );

    let text = Arc::new(text);
    let embedder = Arc::new(embedder);
    let vectors: Arc<dyn VectorMemory> = Arc::new(
        SqliteVectorMemory::new(state.pool().clone(), TEST_EMBEDDING_DIM)
            .await
            .unwrap(),
    );

    let worker = Arc::new(EnrichmentWorker::new(
        text.clone(),
        embedder,
        vectors,
        state.clone(),
    ));
    let patterns = PatternEngine::new(state.clone());
    let gateway = Arc::new(BehaviorGateway::new(
        state.clone(),
        worker.clone(),
        patterns,
    ));

    TestHarness {
        gateway,
        worker,
        state,
        text,
        _db: db_file,
    }
}
