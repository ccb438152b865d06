use super::CompletionProvider;
use crate::config::Config;
use crate::error::{malformed_response, AppResult, Error};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// Fixed system instruction: the extraction policy and output schema
pub const SYSTEM_PROMPT: &str = "You are a calendar event extractor. You analyze \
web page content and extract calendar events from it. Respond with a JSON object \
containing an `events` array. Every event must have: summary, location, \
start_date (YYYY-MM-DD), end_date (YYYY-MM-DD), description, timezone (IANA \
identifier such as Europe/Helsinki), url. The start_time and end_time fields \
(HH:MM, 24-hour) are null for all-day events. Dates and times are local to the \
event's timezone. Use the page's own wording for the summary. Never invent \
events that are not in the content.";

/// OpenAI-compatible chat-completion client
pub struct AiCompletionProvider {
    config: Arc<RwLock<Config>>,
    client: Client,
}

impl AiCompletionProvider {
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }
}

/// Structured-output schema for the `events` response object
fn events_schema(max_events: u32) -> Value {
    json!({
        "type": "object",
        "properties": {
            "events": {
                "type": "array",
                "minItems": 1,
                "maxItems": max_events,
                "items": {
                    "type": "object",
                    "properties": {
                        "summary": { "type": "string" },
                        "location": { "type": "string" },
                        "start_date": { "type": "string" },
                        "start_time": { "type": ["string", "null"] },
                        "end_date": { "type": "string" },
                        "end_time": { "type": ["string", "null"] },
                        "description": { "type": "string" },
                        "timezone": { "type": "string" },
                        "url": { "type": "string" }
                    },
                    "required": [
                        "summary", "location", "start_date", "start_time",
                        "end_date", "end_time", "description", "timezone", "url"
                    ],
                    "additionalProperties": false
                }
            }
        },
        "required": ["events"],
        "additionalProperties": false
    })
}

#[async_trait]
impl CompletionProvider for AiCompletionProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_events: u32,
    ) -> AppResult<String> {
        let (api_key, base_url, model, timeout_secs, max_tokens) = {
            let config = self.config.read().await;
            (
                config.ai_api_key.clone(),
                config.ai_base_url.clone(),
                config.ai_model.clone(),
                config.ai_timeout_secs,
                config.ai_max_tokens,
            )
        };

        info!("Requesting extraction from model {}", model);

        let body = json!({
            "model": model,
            "max_tokens": max_tokens,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "calendar_events",
                    "strict": true,
                    "schema": events_schema(max_events)
                }
            }
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", base_url))
            .timeout(Duration::from_secs(timeout_secs))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::ProviderTimeout {
                        provider: "AI",
                        seconds: timeout_secs,
                    }
                } else {
                    Error::Provider(format!("AI request failed: {}", e))
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
            .map_err(|e| malformed_response(&format!("failed to read completion: {}", e)))?;

        let content = response_data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| malformed_response("no message content in completion"))?;

        Ok(content.to_string())
    }
}
