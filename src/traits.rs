use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::NotificationCategory;

/// A recorded user/device action. `semantic_content` stays `None` until the
/// enrichment worker patches it; everything else is immutable after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorEvent {
    pub id: i64,
    pub user_id: i64,
    pub device_id: String,
    pub action_type: String,
    pub details: Option<Value>,
    pub raw_content: Option<String>,
    pub semantic_content: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a new behavior event. `raw_content` falls back to the
/// action type when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBehavior {
    pub user_id: i64,
    pub device_id: String,
    pub action_type: String,
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub raw_content: Option<String>,
}

/// A message-center notification. Created by the care job and the hydration
/// scheduler; read acknowledgement belongs to the account service.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub category: NotificationCategory,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A ranked hit from the vector memory store. L2 metric: lower is closer.
#[derive(Debug, Clone, Serialize)]
pub struct VectorHit {
    pub behavior_id: i64,
    pub content: String,
    pub timestamp: i64,
    pub distance: f32,
}

/// Text generation collaborator: turns a prompt into a short description.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> anyhow::Result<String>;
}

/// Embedding collaborator: fixed-dimension vector for a piece of text.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// The fixed dimension every returned vector must have.
    fn dimensions(&self) -> usize;
}

/// Vector memory: write-once projection of enriched events, searchable
/// per user. Insert is an upsert keyed by behavior id so re-running
/// enrichment never produces a second record for the same event.
#[async_trait]
pub trait VectorMemory: Send + Sync {
    async fn insert(
        &self,
        behavior_id: i64,
        user_id: i64,
        content: &str,
        vector: &[f32],
        timestamp: i64,
    ) -> anyhow::Result<()>;

    async fn search(
        &self,
        user_id: i64,
        query: &[f32],
        limit: usize,
    ) -> anyhow::Result<Vec<VectorHit>>;
}
