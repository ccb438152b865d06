use crate::error::AppResult;
use async_trait::async_trait;

pub mod catalog;
pub mod completion;
pub mod mailer;

pub use catalog::ModelCatalog;
pub use completion::AiCompletionProvider;
pub use mailer::EmailProvider;

/// One outbound invitation email with its ICS attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub ics_document: String,
}

/// Boundary to the AI text-completion provider
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run one chat completion and return the raw response text.
    ///
    /// `max_events` bounds the `events` array in the structured-output
    /// schema: 1 in single-event mode, the configured cap otherwise.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_events: u32,
    ) -> AppResult<String>;
}

/// Boundary to the transactional email provider
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Send one invitation email; a single round-trip, no retries
    async fn send_invite(&self, email: &InviteEmail) -> AppResult<()>;
}
