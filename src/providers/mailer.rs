use super::{InviteEmail, MailTransport};
use crate::config::Config;
use crate::error::{AppResult, Error};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// Postmark-compatible transactional email client
pub struct EmailProvider {
    config: Arc<RwLock<Config>>,
    client: Client,
}

impl EmailProvider {
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl MailTransport for EmailProvider {
    async fn send_invite(&self, email: &InviteEmail) -> AppResult<()> {
        let (server_token, base_url, sender, timeout_secs) = {
            let config = self.config.read().await;
            (
                config.email_server_token.clone(),
                config.email_base_url.clone(),
                config.sender_address.clone(),
                config.email_timeout_secs,
            )
        };

        let body = json!({
            "From": sender,
            "To": email.to,
            "Subject": email.subject,
            "TextBody": email.text_body,
            "Attachments": [{
                "Name": "invite.ics",
                "Content": BASE64.encode(email.ics_document.as_bytes()),
                "ContentType": "text/calendar"
            }]
        });

        let response = self
            .client
            .post(format!("{}/email", base_url))
            .timeout(Duration::from_secs(timeout_secs))
            .header("X-Postmark-Server-Token", server_token)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::ProviderTimeout {
                        provider: "email",
                        seconds: timeout_secs,
                    }
                } else {
                    Error::Provider(format!("Email request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(Error::ProviderHttp {
                provider: "email",
                status,
                body,
            });
        }

        info!("Invitation email sent to {}", email.to);
        Ok(())
    }
}
