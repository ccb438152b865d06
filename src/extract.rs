use crate::error::{malformed_response, schema_violation, AppResult};
use crate::event::EventRecord;
use serde_json::Value;

/// Fields that must be present as non-empty strings on every event
const REQUIRED_FIELDS: [&str; 7] = [
    "summary",
    "location",
    "start_date",
    "end_date",
    "description",
    "timezone",
    "url",
];

/// Parse and validate the AI provider's raw text output into event records.
///
/// Order of the returned records matches the response; no reordering or
/// deduplication. Date and timezone values are validated later, during
/// ICS serialization.
pub fn parse_extraction(raw: &str) -> AppResult<Vec<EventRecord>> {
    let unwrapped = strip_code_fences(raw);

    let value: Value = serde_json::from_str(unwrapped)
        .map_err(|e| malformed_response(&format!("not valid JSON: {}", e)))?;

    let events = match value.get("events") {
        None => return Err(schema_violation("missing `events` field")),
        Some(events) => events
            .as_array()
            .ok_or_else(|| schema_violation("`events` is not an array"))?,
    };

    if events.is_empty() {
        return Err(schema_violation("`events` is empty"));
    }

    let mut records = Vec::with_capacity(events.len());
    for (index, event) in events.iter().enumerate() {
        records.push(parse_event(event, index)?);
    }

    Ok(records)
}

/// Validate one element of the `events` array
fn parse_event(event: &Value, index: usize) -> AppResult<EventRecord> {
    let event = event
        .as_object()
        .ok_or_else(|| schema_violation(&format!("event {} is not an object", index)))?;

    for field in REQUIRED_FIELDS {
        match event.get(field) {
            None | Some(Value::Null) => {
                return Err(schema_violation(&format!(
                    "missing required field `{}` in event {}",
                    field, index
                )));
            }
            Some(Value::String(s)) if s.is_empty() => {
                return Err(schema_violation(&format!(
                    "empty required field `{}` in event {}",
                    field, index
                )));
            }
            Some(Value::String(_)) => {}
            Some(_) => {
                return Err(schema_violation(&format!(
                    "field `{}` in event {} is not a string",
                    field, index
                )));
            }
        }
    }

    let required = |field: &str| -> String {
        // Presence and type checked above
        event[field].as_str().unwrap_or_default().to_string()
    };

    let start_time = optional_time(event, "start_time", index)?;
    let mut end_time = optional_time(event, "end_time", index)?;

    // All-day events carry no end time, whatever the model returned
    if start_time.is_none() {
        end_time = None;
    }

    Ok(EventRecord {
        summary: required("summary"),
        location: required("location"),
        start_date: required("start_date"),
        start_time,
        end_date: Some(required("end_date")),
        end_time,
        description: required("description"),
        timezone: required("timezone"),
        url: required("url"),
    })
}

/// Optional time-of-day field: null, absent or empty all mean "absent"
fn optional_time(
    event: &serde_json::Map<String, Value>,
    field: &str,
    index: usize,
) -> AppResult<Option<String>> {
    match event.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(schema_violation(&format!(
            "field `{}` in event {} is not a string",
            field, index
        ))),
    }
}

/// Strip surrounding Markdown code-fence lines if present.
///
/// Lenient unwrap only: a leading ``` line (with optional language tag)
/// and a trailing ``` line are dropped, everything else passes through.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let after_fence = match trimmed.find('\n') {
        Some(pos) => &trimmed[pos + 1..],
        None => return trimmed,
    };

    match after_fence.rfind("```") {
        Some(pos) => after_fence[..pos].trim(),
        None => after_fence.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn single_event_json() -> String {
        r#"{"events":[{
            "summary": "Concert",
            "location": "Hall",
            "start_date": "2025-10-03",
            "start_time": "19:30",
            "end_date": "2025-10-03",
            "end_time": "21:30",
            "description": "d",
            "timezone": "America/Los_Angeles",
            "url": "https://x"
        }]}"#
            .to_string()
    }

    #[test]
    fn test_parse_single_event() {
        let records = parse_extraction(&single_event_json()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].summary, "Concert");
        assert_eq!(records[0].start_time.as_deref(), Some("19:30"));
        assert_eq!(records[0].end_date.as_deref(), Some("2025-10-03"));
        assert!(!records[0].is_all_day());
    }

    #[test]
    fn test_parse_strips_code_fences() {
        let fenced = format!("```json\n{}\n```", single_event_json());
        let records = parse_extraction(&fenced).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = parse_extraction("not json at all").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_rejects_missing_events_field() {
        let err = parse_extraction(r#"{"items":[]}"#).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(ref m) if m.contains("missing `events`")));
    }

    #[test]
    fn test_parse_rejects_wrong_events_type() {
        let err = parse_extraction(r#"{"events":"nope"}"#).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(ref m) if m.contains("not an array")));
    }

    #[test]
    fn test_parse_rejects_empty_events() {
        let err = parse_extraction(r#"{"events":[]}"#).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(ref m) if m.contains("empty")));
    }

    #[test]
    fn test_parse_rejects_missing_required_field() {
        let json = r#"{"events":[{
            "summary": "Concert",
            "location": "Hall",
            "start_date": "2025-10-03",
            "end_date": "2025-10-03",
            "description": "d",
            "timezone": "UTC"
        }]}"#;
        let err = parse_extraction(json).unwrap_err();
        assert!(
            matches!(err, Error::SchemaViolation(ref m) if m.contains("`url`") && m.contains("event 0"))
        );
    }

    #[test]
    fn test_all_day_event_drops_end_time() {
        let json = r#"{"events":[{
            "summary": "Fair",
            "location": "Square",
            "start_date": "2025-10-03",
            "start_time": null,
            "end_date": "2025-10-04",
            "end_time": "12:00",
            "description": "d",
            "timezone": "UTC",
            "url": "https://x"
        }]}"#;
        let records = parse_extraction(json).unwrap();
        assert!(records[0].is_all_day());
        assert_eq!(records[0].end_time, None);
    }

    #[test]
    fn test_order_is_preserved() {
        let json = r#"{"events":[
            {"summary":"A","location":"l","start_date":"2025-01-01","end_date":"2025-01-01",
             "description":"d","timezone":"UTC","url":"u"},
            {"summary":"B","location":"l","start_date":"2025-01-02","end_date":"2025-01-02",
             "description":"d","timezone":"UTC","url":"u"}
        ]}"#;
        let records = parse_extraction(json).unwrap();
        assert_eq!(records[0].summary, "A");
        assert_eq!(records[1].summary, "B");
    }
}
