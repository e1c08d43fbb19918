//! Timestamp and calendar-date encoding.
//!
//! Instants are stored as RFC 3339 UTC strings with microsecond precision
//! and a `Z` suffix, so lexical order equals chronological order. Calendar
//! dates are stored as `YYYY-MM-DD`.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current UTC time, truncated to the stored precision.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    parse(&format(&now)).unwrap_or(now)
}

/// Render an instant in the stored form.
pub fn format(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored instant. Any RFC 3339 offset is accepted and normalised.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render a calendar date in the stored form.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a stored calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Midnight UTC at the start of `date`, used when a date acts as an expiry.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    #[test]
    fn format_uses_micros_and_z_suffix() {
        let instant = Utc.with_ymd_and_hms(2016, 2, 1, 12, 30, 0).unwrap();
        assert_eq!(format(&instant), "2016-02-01T12:30:00.000000Z");
    }

    #[test]
    fn parse_normalises_offsets() {
        let parsed = parse("2016-02-01T22:30:00+10:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2016, 2, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse("yesterday").is_none());
        assert!(parse_date("2016-13-01").is_none());
    }

    #[test]
    fn date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2016, 2, 1).unwrap();
        assert_eq!(format_date(date), "2016-02-01");
        assert_eq!(parse_date("2016-02-01"), Some(date));
    }

    #[test]
    fn start_of_day_is_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2016, 2, 1).unwrap();
        assert_eq!(format(&start_of_day(date)), "2016-02-01T00:00:00.000000Z");
    }

    #[test]
    fn now_survives_stored_round_trip() {
        let now = now();
        assert_eq!(parse(&format(&now)), Some(now));
    }

    proptest! {
        #[test]
        fn lexical_order_matches_chronological_order(
            a in 0i64..4_000_000_000_000_000,
            b in 0i64..4_000_000_000_000_000,
        ) {
            let base = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
            let a = base + Duration::microseconds(a);
            let b = base + Duration::microseconds(b);
            prop_assert_eq!(a.cmp(&b), format(&a).cmp(&format(&b)));
        }
    }
}
