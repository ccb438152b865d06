mod mocks;

use kutsuri::config::Config;
use kutsuri::confirm::ConfirmationHandle;
use kutsuri::error::Error;
use kutsuri::pipeline::{Outcome, Pipeline, ProcessOptions};
use kutsuri::prompt::ExtractionMode;
use kutsuri::providers::{CompletionProvider, MailTransport};
use mocks::{MockCompletionProvider, MockMailTransport};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

const SINGLE_EVENT_RESPONSE: &str = r#"{"events":[{
    "summary": "Concert",
    "location": "Hall",
    "start_date": "2025-10-03",
    "start_time": "19:30",
    "end_date": "2025-10-03",
    "end_time": "21:30",
    "description": "d",
    "timezone": "America/Los_Angeles",
    "url": "https://x"
}]}"#;

fn multi_event_response() -> String {
    let event = |summary: &str, day: u32| {
        format!(
            r#"{{"summary":"{}","location":"Hall","start_date":"2025-10-{:02}",
            "start_time":"10:00","end_date":"2025-10-{:02}","end_time":"11:00",
            "description":"d","timezone":"UTC","url":"https://x"}}"#,
            summary, day, day
        )
    };
    format!(
        r#"{{"events":[{},{},{}]}}"#,
        event("Day one", 3),
        event("Day two", 4),
        event("Day three", 5)
    )
}

struct Harness {
    pipeline: Pipeline,
    completion: Arc<MockCompletionProvider>,
    mailer: Arc<MockMailTransport>,
}

fn harness(response: &str) -> Harness {
    let config = Arc::new(RwLock::new(Config::fixture()));
    let completion = Arc::new(MockCompletionProvider::new(response));
    let mailer = Arc::new(MockMailTransport::new());
    let confirmations = ConfirmationHandle::spawn(Duration::from_secs(60));

    let pipeline = Pipeline::new(
        config,
        Arc::clone(&completion) as Arc<dyn CompletionProvider>,
        Arc::clone(&mailer) as Arc<dyn MailTransport>,
        confirmations,
    );

    Harness {
        pipeline,
        completion,
        mailer,
    }
}

#[tokio::test]
async fn test_end_to_end_single_tentative_event() {
    let harness = harness(SINGLE_EVENT_RESPONSE);
    let options = ProcessOptions {
        tentative: true,
        ..Default::default()
    };

    let outcome = harness
        .pipeline
        .process("concert page content", &options)
        .await
        .unwrap();

    let Outcome::Sent {
        recipient,
        subject,
        document,
        event_count,
    } = outcome
    else {
        panic!("expected direct dispatch");
    };

    assert_eq!(event_count, 1);
    assert_eq!(subject, "Calendar Invite: Concert");
    // Tentative batches go to the tentative recipient
    assert_eq!(recipient, "calendar-tentative@example.com");

    assert_eq!(document.matches("BEGIN:VEVENT").count(), 1);
    assert!(document.contains("STATUS:TENTATIVE"));
    // 19:30 in Los Angeles is 02:30 UTC the next day
    assert!(document.contains("DTSTART:20251004T023000Z"));
    assert!(!document.contains("VALUE=DATE"));

    // Exactly one email went out, carrying the rendered document
    let sent = harness.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "calendar-tentative@example.com");
    assert_eq!(sent[0].subject, "Calendar Invite: Concert");
    assert_eq!(sent[0].ics_document, document);
}

#[tokio::test]
async fn test_confirmed_events_use_confirmed_recipient() {
    let harness = harness(SINGLE_EVENT_RESPONSE);
    let outcome = harness
        .pipeline
        .process("content", &ProcessOptions::default())
        .await
        .unwrap();

    let Outcome::Sent {
        recipient, document, ..
    } = outcome
    else {
        panic!("expected direct dispatch");
    };
    assert_eq!(recipient, "calendar@example.com");
    assert!(document.contains("STATUS:CONFIRMED"));
}

#[tokio::test]
async fn test_confirmation_round_trip() {
    let harness = harness(SINGLE_EVENT_RESPONSE);
    let options = ProcessOptions {
        review: true,
        ..Default::default()
    };

    let outcome = harness
        .pipeline
        .process("content", &options)
        .await
        .unwrap();

    let Outcome::PendingReview {
        token, document, ..
    } = outcome
    else {
        panic!("expected pending review");
    };

    // Nothing sent while pending
    assert_eq!(harness.mailer.sent_count(), 0);

    // Confirm dispatches exactly once
    let confirmed = harness.pipeline.confirm(&token).await.unwrap();
    let Outcome::Sent {
        document: sent_document,
        ..
    } = confirmed
    else {
        panic!("expected dispatch on confirm");
    };
    assert_eq!(sent_document, document);
    assert_eq!(harness.mailer.sent_count(), 1);

    // The AI provider was only consulted once for the whole flow
    assert_eq!(harness.completion.calls.load(Ordering::SeqCst), 1);

    // A second confirm with the same token fails
    let err = harness.pipeline.confirm(&token).await.unwrap_err();
    assert!(matches!(err, Error::InvalidToken));
    assert_eq!(harness.mailer.sent_count(), 1);
}

#[tokio::test]
async fn test_confirm_with_unknown_token_fails() {
    let harness = harness(SINGLE_EVENT_RESPONSE);
    let err = harness
        .pipeline
        .confirm("00000000-0000-0000-0000-000000000000")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidToken));
}

#[tokio::test]
async fn test_multi_day_mode_fans_out_events() {
    let response = multi_event_response();
    let harness = harness(&response);
    let options = ProcessOptions {
        mode: ExtractionMode::MultiDay,
        ..Default::default()
    };

    let outcome = harness
        .pipeline
        .process("festival program", &options)
        .await
        .unwrap();

    let Outcome::Sent {
        subject,
        document,
        event_count,
        ..
    } = outcome
    else {
        panic!("expected direct dispatch");
    };

    assert_eq!(event_count, 3);
    assert_eq!(subject, "Calendar Invites: 3 events");
    assert_eq!(document.matches("BEGIN:VCALENDAR").count(), 1);
    assert_eq!(document.matches("BEGIN:VEVENT").count(), 3);
}

#[tokio::test]
async fn test_dispatch_failure_leaves_retry_token() {
    let harness = harness(SINGLE_EVENT_RESPONSE);
    harness.mailer.set_failing(true);

    let err = harness
        .pipeline
        .process("content", &ProcessOptions::default())
        .await
        .unwrap_err();

    let Error::DispatchFailed { token, source } = err else {
        panic!("expected dispatch failure with retry token");
    };
    assert!(matches!(*source, Error::ProviderHttp { status: 500, .. }));

    // The provider recovers; retry goes through the stored entry
    // without a second AI call
    harness.mailer.set_failing(false);
    let outcome = harness.pipeline.confirm(&token).await.unwrap();
    assert!(matches!(outcome, Outcome::Sent { .. }));
    assert_eq!(harness.mailer.sent_count(), 1);
    assert_eq!(harness.completion.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_schema_violation_surfaces_to_caller() {
    let harness = harness(r#"{"events":[]}"#);
    let err = harness
        .pipeline
        .process("content", &ProcessOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SchemaViolation(_)));
    assert_eq!(harness.mailer.sent_count(), 0);
}

#[tokio::test]
async fn test_fenced_response_is_accepted() {
    let fenced = format!("```json\n{}\n```", SINGLE_EVENT_RESPONSE);
    let harness = harness(&fenced);
    let outcome = harness
        .pipeline
        .process("content", &ProcessOptions::default())
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Sent { event_count: 1, .. }));
}
