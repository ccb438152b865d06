use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Configuration error: {0}")]
    #[diagnostic(code(kutsuri::config))]
    Config(String),

    #[error("{provider} provider timed out after {seconds}s")]
    #[diagnostic(code(kutsuri::provider_timeout))]
    ProviderTimeout {
        provider: &'static str,
        seconds: u64,
    },

    #[error("{provider} provider returned HTTP {status}: {body}")]
    #[diagnostic(code(kutsuri::provider_http))]
    ProviderHttp {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Provider request failed: {0}")]
    #[diagnostic(code(kutsuri::provider))]
    Provider(String),

    #[error("Malformed AI response: {0}")]
    #[diagnostic(code(kutsuri::malformed_response))]
    MalformedResponse(String),

    #[error("AI response schema violation: {0}")]
    #[diagnostic(code(kutsuri::schema_violation))]
    SchemaViolation(String),

    #[error("Invalid or expired confirmation token")]
    #[diagnostic(code(kutsuri::invalid_token))]
    InvalidToken,

    #[error("Email dispatch failed, retry with confirmation token {token}")]
    #[diagnostic(code(kutsuri::dispatch_failed))]
    DispatchFailed {
        token: String,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    #[diagnostic(code(kutsuri::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(kutsuri::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(kutsuri::other))]
    Other(String),
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create configuration errors for missing environment variables
pub fn env_error(var: &str) -> Error {
    Error::Config(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
#[allow(dead_code)]
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create malformed-response errors
pub fn malformed_response(message: &str) -> Error {
    Error::MalformedResponse(message.to_string())
}

/// Helper to create schema-violation errors
pub fn schema_violation(message: &str) -> Error {
    Error::SchemaViolation(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
