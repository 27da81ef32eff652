use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::EmbeddingConfig;
use crate::providers::ProviderError;
use crate::traits::Embedder;
use crate::utils::truncate_str;

/// Embedding collaborator over an OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        if self.api_key.is_empty() {
            return Err(ProviderError::missing_credentials("embedding.api_key").into());
        }

        let mut body = json!({
            "model": self.model,
            "input": text,
        });
        // Only embedding-3 family models accept an explicit dimension.
        if self.model.contains("embedding-3") {
            body["dimensions"] = json!(self.dimensions);
        }

        let url = format!("{}/embeddings", self.base_url);
        debug!(model = %self.model, url = %url, "Calling embedding API");

        let resp = match self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!("Embedding request failed: {}", e);
                return Err(ProviderError::network(&e).into());
            }
        };

        let status = resp.status();
        let text_body = resp.text().await?;

        if !status.is_success() {
            error!(status = %status, "Embedding API error: {}", truncate_str(&text_body, 300));
            return Err(ProviderError::from_status(status.as_u16(), &text_body).into());
        }

        let data: Value = serde_json::from_str(&text_body)?;
        let values = data["data"]
            .get(0)
            .and_then(|entry| entry["embedding"].as_array())
            .ok_or_else(|| anyhow::anyhow!("No embedding in response"))?;

        let vector: Vec<f32> = values
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| anyhow::anyhow!("Non-numeric value in embedding"))?;

        if vector.len() != self.dimensions {
            anyhow::bail!(
                "Embedding API returned {} dimensions, expected {}",
                vector.len(),
                self.dimensions
            );
        }

        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
