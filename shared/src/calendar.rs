//! iCalendar (RFC 5545) invites attached to staff booking notifications.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

const PRODID: &str = "-//Salon Bookings//Booking Invite//EN";
const MAX_LINE_OCTETS: usize = 75;

/// A single calendar event.
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub uid: String,
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub duration: Duration,
    pub stamp: DateTime<Utc>,
}

impl CalendarEvent {
    /// Create an event with a fresh UID, stamped now.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        start: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            uid: format!("{}@salon-bookings", Uuid::new_v4()),
            title: title.into(),
            description: description.into(),
            start,
            duration,
            stamp: Utc::now(),
        }
    }

    /// Render as an `.ics` document with CRLF line endings.
    pub fn to_ics(&self) -> String {
        let lines = [
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            "CALSCALE:GREGORIAN".to_string(),
            format!("PRODID:{}", PRODID),
            "METHOD:PUBLISH".to_string(),
            "BEGIN:VEVENT".to_string(),
            format!("UID:{}", self.uid),
            format!("DTSTAMP:{}", ics_timestamp(self.stamp)),
            format!("DTSTART:{}", ics_timestamp(self.start)),
            format!("DURATION:{}", ics_duration(self.duration)),
            format!("SUMMARY:{}", escape_text(&self.title)),
            format!("DESCRIPTION:{}", escape_text(&self.description)),
            "END:VEVENT".to_string(),
            "END:VCALENDAR".to_string(),
        ];

        let mut out = String::new();
        for line in &lines {
            out.push_str(&fold_line(line));
            out.push_str("\r\n");
        }
        out
    }
}

fn ics_timestamp(date: DateTime<Utc>) -> String {
    date.format("%Y%m%dT%H%M%SZ").to_string()
}

fn ics_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes().max(0);
    match (minutes / 60, minutes % 60) {
        (h, 0) => format!("PT{}H", h),
        (0, m) => format!("PT{}M", m),
        (h, m) => format!("PT{}H{}M", h, m),
    }
}

/// Escape a TEXT value: backslash, semicolon, comma and newlines.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Fold a content line so no physical line exceeds 75 octets. Continuation
/// lines start with a single space, which counts toward their length.
fn fold_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut used = 0;
    for ch in line.chars() {
        let width = ch.len_utf8();
        if used + width > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            used = 1;
        }
        out.push(ch);
        used += width;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> CalendarEvent {
        CalendarEvent {
            uid: "abc@salon-bookings".to_string(),
            title: "8:05PM Ana - Gel X".to_string(),
            description: "Gel X: chrome, french\nPrice: $65".to_string(),
            start: Utc.with_ymd_and_hms(2022, 8, 17, 3, 5, 0).unwrap(),
            duration: Duration::hours(2),
            stamp: Utc.with_ymd_and_hms(2022, 8, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_to_ics_fields() {
        let ics = event().to_ics();
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ics.ends_with("END:VEVENT\r\nEND:VCALENDAR\r\n"));
        assert!(ics.contains("\r\nUID:abc@salon-bookings\r\n"));
        assert!(ics.contains("\r\nDTSTART:20220817T030500Z\r\n"));
        assert!(ics.contains("\r\nDTSTAMP:20220801T120000Z\r\n"));
        assert!(ics.contains("\r\nDURATION:PT2H\r\n"));
        assert!(ics.contains("\r\nSUMMARY:8:05PM Ana - Gel X\r\n"));
        assert!(ics.contains("\r\nDESCRIPTION:Gel X: chrome\\, french\\nPrice: $65\r\n"));
    }

    #[test]
    fn test_duration_rendering() {
        assert_eq!(ics_duration(Duration::minutes(90)), "PT1H30M");
        assert_eq!(ics_duration(Duration::minutes(45)), "PT45M");
    }

    #[test]
    fn test_long_lines_are_folded() {
        let mut e = event();
        e.description = "é".repeat(100);
        let ics = e.to_ics();
        for line in ics.split("\r\n") {
            assert!(line.len() <= MAX_LINE_OCTETS, "line too long: {}", line.len());
        }
        let unfolded = ics.replace("\r\n ", "");
        assert!(unfolded.contains(&format!("DESCRIPTION:{}", "é".repeat(100))));
    }

    #[test]
    fn test_new_events_get_unique_uids() {
        let start = Utc::now();
        let a = CalendarEvent::new("a", "", start, Duration::hours(2));
        let b = CalendarEvent::new("a", "", start, Duration::hours(2));
        assert_ne!(a.uid, b.uid);
    }
}
