use crate::config::Config;
use crate::error::{malformed_response, AppResult, Error};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::info;

/// Model families usable for extraction; everything else is filtered out
const CHAT_MODEL_PREFIXES: [&str; 4] = ["gpt-", "o1", "o3", "chatgpt-"];

/// Time-boxed cached listing of the AI provider's chat-capable models.
///
/// Lives outside the pipeline; only the settings surface uses it.
pub struct ModelCatalog {
    config: Arc<RwLock<Config>>,
    client: Client,
    cache: RwLock<Option<CachedListing>>,
}

struct CachedListing {
    fetched_at: Instant,
    models: Vec<String>,
}

impl ModelCatalog {
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self {
            config,
            client: Client::new(),
            cache: RwLock::new(None),
        }
    }

    /// List chat-capable model identifiers, serving from cache within TTL
    pub async fn list_models(&self) -> AppResult<Vec<String>> {
        let ttl = {
            let config = self.config.read().await;
            Duration::from_secs(config.model_cache_ttl_secs)
        };

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < ttl {
                    return Ok(cached.models.clone());
                }
            }
        }

        let models = self.fetch_models().await?;

        let mut cache = self.cache.write().await;
        *cache = Some(CachedListing {
            fetched_at: Instant::now(),
            models: models.clone(),
        });

        Ok(models)
    }

    async fn fetch_models(&self) -> AppResult<Vec<String>> {
        let (api_key, base_url, timeout_secs) = {
            let config = self.config.read().await;
            (
                config.ai_api_key.clone(),
                config.ai_base_url.clone(),
                config.ai_timeout_secs,
            )
        };

        let response = self
            .client
            .get(format!("{}/models", base_url))
            .timeout(Duration::from_secs(timeout_secs))
            .header("Authorization", format!("Bearer {}", api_key))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::ProviderTimeout {
                        provider: "AI",
                        seconds: timeout_secs,
                    }
                } else {
                    Error::Provider(format!("Model listing failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(Error::ProviderHttp {
                provider: "AI",
                status,
                body,
            });
        }

        let response_data: Value = response
            .json()
            .await
            .map_err(|e| malformed_response(&format!("failed to read model listing: {}", e)))?;

        let data = response_data
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| malformed_response("no data in model listing"))?;

        let mut models: Vec<String> = data
            .iter()
            .filter_map(|model| model.get("id").and_then(|id| id.as_str()))
            .filter(|id| CHAT_MODEL_PREFIXES.iter().any(|p| id.starts_with(p)))
            .map(|id| id.to_string())
            .collect();
        models.sort();

        info!("Fetched {} chat-capable models", models.len());
        Ok(models)
    }
}
