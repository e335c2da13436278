//! Slot string parsing shared by the scorer, the ranking stage, and the
//! simulated negotiation transport.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::request::TimeWindow;

/// Parse a slot string into a local wall-clock timestamp.
///
/// Accepts a full `YYYY-MM-DD HH:MM` timestamp (with an optional `T`
/// separator or trailing seconds), or a bare `HH:MM` time combined with
/// `date_hint`. Anything unparsable is `None`; malformed input never
/// raises.
pub fn parse_slot(raw: &str, date_hint: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // Bare time of day, anchored to the hinted date.
    if raw.len() == 5 && raw.contains(':') {
        if let (Some(hint), Ok(time)) =
            (date_hint, NaiveTime::parse_from_str(raw, "%H:%M"))
        {
            if let Ok(date) = NaiveDate::parse_from_str(hint.trim(), "%Y-%m-%d") {
                return Some(date.and_time(time));
            }
        }
        return None;
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Resolve a time window's bounds against its own date. Either bound may
/// be absent or unparsable, in which case that side is unbounded.
pub fn window_bounds(window: &TimeWindow) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    let hint = window.date.as_deref();
    let start = window.start.as_deref().and_then(|raw| parse_slot(raw, hint));
    let end = window.end.as_deref().and_then(|raw| parse_slot(raw, hint));
    (start, end)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{parse_slot, window_bounds};
    use crate::domain::request::TimeWindow;

    fn at(date: &str, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .expect("valid date")
            .and_hms_opt(hour, minute, 0)
            .expect("valid time")
    }

    #[test]
    fn full_timestamp_parses_without_a_hint() {
        assert_eq!(parse_slot("2026-02-08 09:30", None), Some(at("2026-02-08", 9, 30)));
        assert_eq!(parse_slot("2026-02-08T09:30", None), Some(at("2026-02-08", 9, 30)));
    }

    #[test]
    fn bare_time_requires_a_date_hint() {
        assert_eq!(parse_slot("09:30", Some("2026-02-08")), Some(at("2026-02-08", 9, 30)));
        assert_eq!(parse_slot("09:30", None), None);
    }

    #[test]
    fn garbage_input_is_none_not_an_error() {
        assert_eq!(parse_slot("next tuesday-ish", Some("2026-02-08")), None);
        assert_eq!(parse_slot("", Some("2026-02-08")), None);
        assert_eq!(parse_slot("09:30", Some("not-a-date")), None);
    }

    #[test]
    fn window_bounds_combine_bare_times_with_the_window_date() {
        let window = TimeWindow {
            date: Some("2026-02-08".to_string()),
            start: Some("09:00".to_string()),
            end: Some("2026-02-08 17:00".to_string()),
        };

        let (start, end) = window_bounds(&window);
        assert_eq!(start, Some(at("2026-02-08", 9, 0)));
        assert_eq!(end, Some(at("2026-02-08", 17, 0)));
    }

    #[test]
    fn missing_window_fields_leave_that_side_unbounded() {
        let window = TimeWindow {
            date: Some("2026-02-08".to_string()),
            start: None,
            end: Some("17:00".to_string()),
        };

        let (start, end) = window_bounds(&window);
        assert_eq!(start, None);
        assert!(end.is_some());
    }
}
