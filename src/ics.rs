use crate::error::{schema_violation, AppResult};
use crate::event::EventRecord;
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

const PRODID: &str = "-//kutsuri//Calendar Invite//EN";

/// Escape text for an ICS property value.
///
/// Backslash, semicolon and comma are backslash-escaped, newlines become
/// a literal "\n" token and carriage returns are dropped.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Resolved start/end instants for one event
struct EventTimes {
    all_day: bool,
    start_utc: DateTime<Utc>,
    end_utc: DateTime<Utc>,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

fn parse_date(value: &str, field: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| schema_violation(&format!("invalid date in `{}`: {}", field, value)))
}

fn parse_time(value: &str, field: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| schema_violation(&format!("invalid time in `{}`: {}", field, value)))
}

fn parse_zone(value: &str) -> AppResult<Tz> {
    value
        .parse::<Tz>()
        .map_err(|_| schema_violation(&format!("invalid timezone: {}", value)))
}

/// Interpret a local date + time in the given zone and convert to UTC
fn to_utc(date: NaiveDate, time: NaiveTime, tz: Tz, field: &str) -> AppResult<DateTime<Utc>> {
    match tz.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        // DST overlap: take the earlier instant
        LocalResult::Ambiguous(earlier, _) => Ok(earlier.with_timezone(&Utc)),
        LocalResult::None => Err(schema_violation(&format!(
            "nonexistent local time in `{}`",
            field
        ))),
    }
}

/// Derive start and end instants per the event's date/time fields.
///
/// End, in priority order: explicit end date + time; end date alone means
/// end of that day; an all-day event with neither runs one calendar day;
/// a timed event with neither runs one hour.
fn resolve_times(event: &EventRecord) -> AppResult<EventTimes> {
    let tz = parse_zone(&event.timezone)?;
    let start_date = parse_date(&event.start_date, "start_date")?;
    let all_day = event.is_all_day();

    let start_time = match &event.start_time {
        Some(time) => parse_time(time, "start_time")?,
        None => NaiveTime::MIN,
    };
    let start_utc = to_utc(start_date, start_time, tz, "start_time")?;

    let end_date = match &event.end_date {
        Some(date) => Some(parse_date(date, "end_date")?),
        None => None,
    };
    // The all-day invariant makes end_time absent for all-day events
    let end_time = match (all_day, &event.end_time) {
        (false, Some(time)) => Some(parse_time(time, "end_time")?),
        _ => None,
    };

    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    let (end_utc, end_render) = match (end_date, end_time) {
        (Some(date), Some(time)) => (to_utc(date, time, tz, "end_time")?, date),
        (Some(date), None) => (to_utc(date, end_of_day, tz, "end_date")?, date),
        (None, _) if all_day => {
            let next = start_date + Duration::days(1);
            (to_utc(next, NaiveTime::MIN, tz, "end_date")?, next)
        }
        _ => (start_utc + Duration::hours(1), start_date),
    };

    Ok(EventTimes {
        all_day,
        start_utc,
        end_utc,
        start_date,
        end_date: end_render,
    })
}

fn format_timed(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

fn format_date(date: &NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Unique identifier for one VEVENT: time-based with a random suffix
fn generate_uid() -> String {
    format!(
        "{}-{}@kutsuri",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

fn push_optional(lines: &mut Vec<String>, property: &str, value: &str) {
    if !value.is_empty() {
        lines.push(format!("{}:{}", property, escape_text(value)));
    }
}

/// Serialize validated events into a single ICS calendar document.
///
/// One VCALENDAR container, one VEVENT block per record in input order,
/// CRLF line endings. The tentative flag applies to the whole batch.
pub fn generate(
    events: &[EventRecord],
    tentative: bool,
    organizer: Option<&str>,
) -> AppResult<String> {
    let mut lines: Vec<String> = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODID),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:REQUEST".to_string(),
    ];

    let status = if tentative { "TENTATIVE" } else { "CONFIRMED" };

    for event in events {
        let times = resolve_times(event)?;
        let stamp = format_timed(&Utc::now());

        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}", generate_uid()));
        lines.push(format!("DTSTAMP:{}", stamp));
        lines.push(format!("CREATED:{}", stamp));
        lines.push(format!("LAST-MODIFIED:{}", stamp));
        lines.push(format!("SUMMARY:{}", escape_text(&event.summary)));
        push_optional(&mut lines, "DESCRIPTION", &event.description);
        push_optional(&mut lines, "LOCATION", &event.location);
        push_optional(&mut lines, "URL", &event.url);

        if times.all_day {
            lines.push(format!(
                "DTSTART;VALUE=DATE:{}",
                format_date(&times.start_date)
            ));
            lines.push(format!("DTEND;VALUE=DATE:{}", format_date(&times.end_date)));
        } else {
            lines.push(format!("DTSTART:{}", format_timed(&times.start_utc)));
            lines.push(format!("DTEND:{}", format_timed(&times.end_utc)));
        }

        lines.push(format!("STATUS:{}", status));
        if let Some(organizer) = organizer {
            lines.push(format!("ORGANIZER:mailto:{}", organizer));
        }
        lines.push("END:VEVENT".to_string());
    }

    lines.push("END:VCALENDAR".to_string());

    let mut document = lines.join("\r\n");
    document.push_str("\r\n");
    Ok(document)
}
