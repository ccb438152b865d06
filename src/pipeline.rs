use crate::config::Config;
use crate::confirm::{ConfirmationEntry, ConfirmationHandle};
use crate::error::{AppResult, Error};
use crate::event::EventRecord;
use crate::extract::parse_extraction;
use crate::ics;
use crate::prompt::{build_prompt, ExtractionMode};
use crate::providers::completion::SYSTEM_PROMPT;
use crate::providers::{CompletionProvider, InviteEmail, MailTransport};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Per-request options supplied by the host environment
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Optional free-text instructions forwarded to the model
    pub instructions: Option<String>,
    /// URL of the page the content came from
    pub source_url: Option<String>,
    /// Extraction mode: primary event only, or all related events
    pub mode: ExtractionMode,
    /// Whether the whole batch is tentative
    pub tentative: bool,
    /// Review mode: render and hold for confirmation instead of sending
    pub review: bool,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The invitation was dispatched immediately
    Sent {
        recipient: String,
        subject: String,
        document: String,
        event_count: usize,
    },
    /// The invitation is held pending confirmation
    PendingReview {
        token: String,
        recipient: String,
        subject: String,
        document: String,
    },
}

/// The content-to-invite pipeline orchestrator
pub struct Pipeline {
    config: Arc<RwLock<Config>>,
    completion: Arc<dyn CompletionProvider>,
    mailer: Arc<dyn MailTransport>,
    confirmations: ConfirmationHandle,
}

impl Pipeline {
    pub fn new(
        config: Arc<RwLock<Config>>,
        completion: Arc<dyn CompletionProvider>,
        mailer: Arc<dyn MailTransport>,
        confirmations: ConfirmationHandle,
    ) -> Self {
        Self {
            config,
            completion,
            mailer,
            confirmations,
        }
    }

    /// Turn page content into an invitation: extract, validate, serialize,
    /// then either dispatch or hold for review.
    pub async fn process(&self, content: &str, options: &ProcessOptions) -> AppResult<Outcome> {
        let (sender, confirmed_recipient, tentative_recipient, multi_event_cap) = {
            let config = self.config.read().await;
            (
                config.sender_address.clone(),
                config.confirmed_recipient.clone(),
                config.tentative_recipient.clone(),
                config.multi_event_cap,
            )
        };

        let prompt = build_prompt(
            content,
            options.instructions.as_deref(),
            options.source_url.as_deref(),
            options.mode,
            options.tentative,
        );

        let max_events = match options.mode {
            ExtractionMode::Primary => 1,
            ExtractionMode::MultiDay => multi_event_cap,
        };

        let raw = self
            .completion
            .complete(SYSTEM_PROMPT, &prompt, max_events)
            .await?;
        let events = parse_extraction(&raw)?;
        info!("Extracted {} event(s)", events.len());

        let document = ics::generate(&events, options.tentative, Some(&sender))?;
        let subject = subject_line(&events);
        let recipient = if options.tentative {
            tentative_recipient
        } else {
            confirmed_recipient
        };

        let entry = ConfirmationEntry {
            document: document.clone(),
            recipient: recipient.clone(),
            subject: subject.clone(),
            events,
        };

        // The entry is stored in both modes. In direct mode it doubles as
        // the retry handle: a dispatch failure leaves it behind so the
        // caller can confirm later without a second AI call.
        let token = self.confirmations.store(entry.clone()).await?;

        if options.review {
            info!("Holding invitation for review");
            return Ok(Outcome::PendingReview {
                token,
                recipient,
                subject,
                document,
            });
        }

        match self.dispatch(&entry).await {
            Ok(()) => {
                let _ = self.confirmations.take(&token).await;
                Ok(Outcome::Sent {
                    recipient,
                    subject,
                    document,
                    event_count: entry.events.len(),
                })
            }
            Err(e) => {
                warn!("Dispatch failed, invitation retained under token");
                Err(Error::DispatchFailed {
                    token,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Commit a pending confirmation: consume the entry and dispatch it
    pub async fn confirm(&self, token: &str) -> AppResult<Outcome> {
        let entry = self.confirmations.take(token).await?;
        self.dispatch(&entry).await?;

        Ok(Outcome::Sent {
            recipient: entry.recipient,
            subject: entry.subject,
            document: entry.document,
            event_count: entry.events.len(),
        })
    }

    async fn dispatch(&self, entry: &ConfirmationEntry) -> AppResult<()> {
        let email = InviteEmail {
            to: entry.recipient.clone(),
            subject: entry.subject.clone(),
            text_body: text_body(&entry.events),
            ics_document: entry.document.clone(),
        };
        self.mailer.send_invite(&email).await
    }
}

/// Subject line: the first event names a single invite, counts name a batch
pub fn subject_line(events: &[EventRecord]) -> String {
    match events {
        [only] => format!("Calendar Invite: {}", only.summary),
        many => format!("Calendar Invites: {} events", many.len()),
    }
}

/// Plain-text body listing the attached events
fn text_body(events: &[EventRecord]) -> String {
    let mut body = String::from("Calendar invitation attached.\n");
    for event in events {
        body.push_str(&format!("- {} ({})\n", event.summary, event.start_date));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(summary: &str) -> EventRecord {
        EventRecord {
            summary: summary.to_string(),
            location: "Hall".to_string(),
            start_date: "2025-10-03".to_string(),
            start_time: None,
            end_date: Some("2025-10-03".to_string()),
            end_time: None,
            description: String::new(),
            timezone: "UTC".to_string(),
            url: String::new(),
        }
    }

    #[test]
    fn test_subject_line_single_event() {
        assert_eq!(
            subject_line(&[record("Concert")]),
            "Calendar Invite: Concert"
        );
    }

    #[test]
    fn test_subject_line_multiple_events() {
        let events = [record("A"), record("B"), record("C")];
        assert_eq!(subject_line(&events), "Calendar Invites: 3 events");
    }
}
