//! Date and price formatting for emails and calendar invites, plus parsing of
//! the date strings the booking front end sends.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Local date-time layouts accepted without an explicit offset.
const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Long booking date shown in emails, e.g. `August 16, 2022 8:05 PM`.
pub fn format_booking_date(date: DateTime<Utc>, tz: Tz) -> String {
    date.with_timezone(&tz)
        .format("%B %-d, %Y %-I:%M %p")
        .to_string()
}

/// Compact time of day used in invite titles, e.g. `8:05PM`.
pub fn format_short_time(date: DateTime<Utc>, tz: Tz) -> String {
    date.with_timezone(&tz).format("%-I:%M%p").to_string()
}

/// Format a price in dollars with thousands separators, e.g. `$1,234.50`.
///
/// Anything that is not a digit, sign or decimal point is ignored, so `"$45"`
/// and `"1,200"` both work. Input that still fails to parse renders as `$0.00`.
pub fn format_price(input: &str) -> String {
    let cents = parse_cents(input).unwrap_or(0);
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, group_thousands(cents / 100), cents % 100)
}

fn parse_cents(input: &str) -> Option<i64> {
    let cleaned: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((value * 100.0).round() as i64)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Parse a date sent by the front end.
///
/// RFC 3339 strings keep their offset. Strings without an offset are read as
/// salon-local time, and a bare `YYYY-MM-DD` means local midnight. A local
/// time that falls in a DST gap does not exist and is rejected.
pub fn parse_date(input: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date.with_timezone(&Utc));
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    local_to_utc(naive, tz)
}

/// Half-open `[start, end)` range covering one calendar month in salon time.
///
/// `month` is zero-based and may overflow in either direction: month 12 of
/// 2023 is January 2024, month -1 of 2024 is December 2023.
pub fn month_range(month: i32, year: i32, tz: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = month_start(year, month, tz)?;
    let end = month_start(year, month.checked_add(1)?, tz)?;
    Some((start, end))
}

fn month_start(year: i32, month: i32, tz: Tz) -> Option<DateTime<Utc>> {
    let total = i64::from(year) * 12 + i64::from(month);
    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12) + 1).ok()?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    local_to_utc(first, tz)
}

fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Los_Angeles;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_format_booking_date_in_salon_time() {
        // 03:05 UTC is 8:05 PM the previous evening in Los Angeles (PDT)
        assert_eq!(
            format_booking_date(utc(2022, 8, 17, 3, 5), Los_Angeles),
            "August 16, 2022 8:05 PM"
        );
        assert_eq!(
            format_booking_date(utc(2023, 1, 9, 18, 0), Los_Angeles),
            "January 9, 2023 10:00 AM"
        );
    }

    #[test]
    fn test_format_short_time() {
        assert_eq!(format_short_time(utc(2022, 8, 17, 3, 5), Los_Angeles), "8:05PM");
        assert_eq!(format_short_time(utc(2022, 8, 16, 19, 0), Los_Angeles), "12:00PM");
        assert_eq!(format_short_time(utc(2022, 8, 16, 7, 30), Los_Angeles), "12:30AM");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price("65"), "$65.00");
        assert_eq!(format_price("45.5"), "$45.50");
        assert_eq!(format_price("$1,234.567"), "$1,234.57");
        assert_eq!(format_price("1000000"), "$1,000,000.00");
        assert_eq!(format_price("-5"), "-$5.00");
        assert_eq!(format_price("free"), "$0.00");
        assert_eq!(format_price(""), "$0.00");
    }

    #[test]
    fn test_parse_date_with_offset() {
        assert_eq!(
            parse_date("2022-08-17T03:05:00.000Z", Los_Angeles),
            Some(utc(2022, 8, 17, 3, 5))
        );
        assert_eq!(
            parse_date("2022-08-16T20:05:00-07:00", Los_Angeles),
            Some(utc(2022, 8, 17, 3, 5))
        );
    }

    #[test]
    fn test_parse_date_local() {
        assert_eq!(parse_date("2022-08-16T20:05", Los_Angeles), Some(utc(2022, 8, 17, 3, 5)));
        assert_eq!(parse_date("2022-08-16 20:05:00", Los_Angeles), Some(utc(2022, 8, 17, 3, 5)));
        assert_eq!(parse_date("2022-12-01", Los_Angeles), Some(utc(2022, 12, 1, 8, 0)));
    }

    #[test]
    fn test_parse_date_rejects_garbage_and_dst_gap() {
        assert_eq!(parse_date("next tuesday", Los_Angeles), None);
        assert_eq!(parse_date("", Los_Angeles), None);
        assert_eq!(parse_date("2024-03-10T02:30", Los_Angeles), None);
    }

    #[test]
    fn test_month_range() {
        let (start, end) = month_range(11, 2023, Los_Angeles).unwrap();
        assert_eq!(start, utc(2023, 12, 1, 8, 0));
        assert_eq!(end, utc(2024, 1, 1, 8, 0));

        // March 2024 starts in PST and ends in PDT
        let (start, end) = month_range(2, 2024, Los_Angeles).unwrap();
        assert_eq!(start, utc(2024, 3, 1, 8, 0));
        assert_eq!(end, utc(2024, 4, 1, 7, 0));
    }

    #[test]
    fn test_month_range_overflow() {
        let (start, _) = month_range(12, 2023, Los_Angeles).unwrap();
        assert_eq!(start, utc(2024, 1, 1, 8, 0));
        let (start, _) = month_range(-1, 2024, Los_Angeles).unwrap();
        assert_eq!(start, utc(2023, 12, 1, 8, 0));
    }
}
