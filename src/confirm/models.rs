use crate::event::EventRecord;
use serde::{Deserialize, Serialize};

/// A fully rendered invitation waiting for the caller's go-ahead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationEntry {
    /// The rendered ICS calendar document
    pub document: String,
    /// Recipient the invitation will be sent to
    pub recipient: String,
    /// Email subject line
    pub subject: String,
    /// The extraction the document was rendered from
    pub events: Vec<EventRecord>,
}
