use async_trait::async_trait;
use kutsuri::error::{AppResult, Error};
use kutsuri::providers::{CompletionProvider, InviteEmail, MailTransport};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock AI provider returning a canned response
pub struct MockCompletionProvider {
    response: String,
    pub calls: AtomicUsize,
}

impl MockCompletionProvider {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _max_events: u32,
    ) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Mock email provider recording sent messages, optionally failing
#[derive(Default)]
pub struct MockMailTransport {
    pub sent: Mutex<Vec<InviteEmail>>,
    pub fail: AtomicBool,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    #[allow(dead_code)]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send_invite(&self, email: &InviteEmail) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::ProviderHttp {
                provider: "email",
                status: 500,
                body: "mock failure".to_string(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Test that demonstrates how to use the mocks
#[tokio::test]
async fn test_mock_providers() {
    let completion = MockCompletionProvider::new(r#"{"events":[]}"#);
    let response = completion.complete("system", "user", 1).await.unwrap();
    assert_eq!(response, r#"{"events":[]}"#);
    assert_eq!(completion.calls.load(Ordering::SeqCst), 1);

    let mailer = MockMailTransport::new();
    let email = InviteEmail {
        to: "calendar@example.com".to_string(),
        subject: "Calendar Invite: Test".to_string(),
        text_body: "Calendar invitation attached.\n".to_string(),
        ics_document: "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n".to_string(),
    };
    mailer.send_invite(&email).await.unwrap();
    assert_eq!(mailer.sent_count(), 1);

    mailer.set_failing(true);
    assert!(mailer.send_invite(&email).await.is_err());
    assert_eq!(mailer.sent_count(), 1);
}
