use crate::error::{env_error, AppResult};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;

/// Default AI provider endpoint (OpenAI-compatible)
pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model used for event extraction
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

/// Default email provider endpoint (Postmark-compatible)
pub const DEFAULT_EMAIL_BASE_URL: &str = "https://api.postmarkapp.com";

/// Main configuration structure for the service
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the AI provider
    pub ai_api_key: String,
    /// Base URL of the AI provider
    pub ai_base_url: String,
    /// Model identifier used for extraction
    pub ai_model: String,
    /// Hard timeout for AI provider calls, in seconds
    pub ai_timeout_secs: u64,
    /// Token ceiling for a single completion
    pub ai_max_tokens: u32,
    /// Maximum number of events extracted in multi-day mode
    pub multi_event_cap: u32,
    /// Server token for the email provider
    pub email_server_token: String,
    /// Base URL of the email provider
    pub email_base_url: String,
    /// Hard timeout for email provider calls, in seconds
    pub email_timeout_secs: u64,
    /// Sender address, also used as the ICS organizer
    pub sender_address: String,
    /// Recipient address for confirmed events
    pub confirmed_recipient: String,
    /// Recipient address for tentative events
    pub tentative_recipient: String,
    /// Lifetime of pending confirmation entries, in seconds
    pub confirmation_ttl_secs: u64,
    /// Address the HTTP API listens on
    pub listen_addr: String,
    /// Lifetime of the cached model catalog, in seconds
    pub model_cache_ttl_secs: u64,
}

/// Optional non-credential overrides loaded from config/kutsuri.toml
#[derive(Debug, Default, Deserialize)]
struct FileOverrides {
    ai_base_url: Option<String>,
    ai_model: Option<String>,
    ai_timeout_secs: Option<u64>,
    ai_max_tokens: Option<u32>,
    multi_event_cap: Option<u32>,
    email_base_url: Option<String>,
    email_timeout_secs: Option<u64>,
    confirmation_ttl_secs: Option<u64>,
    listen_addr: Option<String>,
    model_cache_ttl_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment and optional config file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Required credentials and addresses
        let ai_api_key = env::var("AI_API_KEY").map_err(|_| env_error("AI_API_KEY"))?;
        let email_server_token =
            env::var("EMAIL_SERVER_TOKEN").map_err(|_| env_error("EMAIL_SERVER_TOKEN"))?;
        let sender_address = env::var("EMAIL_FROM").map_err(|_| env_error("EMAIL_FROM"))?;
        let confirmed_recipient =
            env::var("INVITE_RECIPIENT").map_err(|_| env_error("INVITE_RECIPIENT"))?;
        let tentative_recipient = env::var("INVITE_RECIPIENT_TENTATIVE")
            .map_err(|_| env_error("INVITE_RECIPIENT_TENTATIVE"))?;

        // Optional overrides from file, environment wins
        let file = Self::load_file_overrides();

        let ai_base_url = env::var("AI_BASE_URL")
            .ok()
            .or(file.ai_base_url)
            .unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string());
        let ai_model = env::var("AI_MODEL")
            .ok()
            .or(file.ai_model)
            .unwrap_or_else(|| DEFAULT_AI_MODEL.to_string());
        let ai_timeout_secs = parse_env_u64("AI_TIMEOUT_SECS")?
            .or(file.ai_timeout_secs)
            .unwrap_or(30);
        let ai_max_tokens = parse_env_u32("AI_MAX_TOKENS")?
            .or(file.ai_max_tokens)
            .unwrap_or(4096);
        let multi_event_cap = parse_env_u32("MULTI_EVENT_CAP")?
            .or(file.multi_event_cap)
            .unwrap_or(10);
        let email_base_url = env::var("EMAIL_BASE_URL")
            .ok()
            .or(file.email_base_url)
            .unwrap_or_else(|| DEFAULT_EMAIL_BASE_URL.to_string());
        let email_timeout_secs = parse_env_u64("EMAIL_TIMEOUT_SECS")?
            .or(file.email_timeout_secs)
            .unwrap_or(30);
        let confirmation_ttl_secs = parse_env_u64("CONFIRMATION_TTL_SECS")?
            .or(file.confirmation_ttl_secs)
            .unwrap_or(86_400);
        let listen_addr = env::var("LISTEN_ADDR")
            .ok()
            .or(file.listen_addr)
            .unwrap_or_else(|| "127.0.0.1:8787".to_string());
        let model_cache_ttl_secs = parse_env_u64("MODEL_CACHE_TTL_SECS")?
            .or(file.model_cache_ttl_secs)
            .unwrap_or(3600);

        Ok(Config {
            ai_api_key,
            ai_base_url,
            ai_model,
            ai_timeout_secs,
            ai_max_tokens,
            multi_event_cap,
            email_server_token,
            email_base_url,
            email_timeout_secs,
            sender_address,
            confirmed_recipient,
            tentative_recipient,
            confirmation_ttl_secs,
            listen_addr,
            model_cache_ttl_secs,
        })
    }

    /// Read config/kutsuri.toml if present; ignore it otherwise
    fn load_file_overrides() -> FileOverrides {
        match fs::read_to_string("config/kutsuri.toml") {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => FileOverrides::default(),
        }
    }

    /// A fixture configuration for tests, no real credentials
    pub fn fixture() -> Self {
        Config {
            ai_api_key: "test-ai-key".to_string(),
            ai_base_url: DEFAULT_AI_BASE_URL.to_string(),
            ai_model: DEFAULT_AI_MODEL.to_string(),
            ai_timeout_secs: 30,
            ai_max_tokens: 4096,
            multi_event_cap: 10,
            email_server_token: "test-email-token".to_string(),
            email_base_url: DEFAULT_EMAIL_BASE_URL.to_string(),
            email_timeout_secs: 30,
            sender_address: "invites@example.com".to_string(),
            confirmed_recipient: "calendar@example.com".to_string(),
            tentative_recipient: "calendar-tentative@example.com".to_string(),
            confirmation_ttl_secs: 86_400,
            listen_addr: "127.0.0.1:0".to_string(),
            model_cache_ttl_secs: 3600,
        }
    }
}

fn parse_env_u64(var: &str) -> AppResult<Option<u64>> {
    match env::var(var) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| env_error(&format!("Invalid {} format", var))),
        Err(_) => Ok(None),
    }
}

fn parse_env_u32(var: &str) -> AppResult<Option<u32>> {
    match env::var(var) {
        Ok(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|_| env_error(&format!("Invalid {} format", var))),
        Err(_) => Ok(None),
    }
}
