use serde::{Deserialize, Serialize};

/// One extracted calendar event, as validated from the AI response.
///
/// Dates and times stay as strings here; they are parsed against the
/// record's timezone during ICS serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub summary: String,
    pub location: String,
    pub start_date: String,
    /// Time of day in HH:MM; absent means an all-day event
    #[serde(default)]
    pub start_time: Option<String>,
    /// Always present on validated records; serialization still handles None
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    pub description: String,
    /// IANA zone identifier, e.g. "Europe/Helsinki"
    pub timezone: String,
    pub url: String,
}

impl EventRecord {
    /// A record is all-day iff it has no start time
    pub fn is_all_day(&self) -> bool {
        self.start_time.is_none()
    }
}
