//! Calendar-date normalization and the range checks that guard every trip and
//! destination mutation.
//!
//! Every check works on whole calendar days. Inputs that cannot be turned into
//! a date make the check fail instead of raising an error, so callers can
//! reject the operation without any error plumbing of their own.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::trip::Destination;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_FORMAT: &str = "%d/%m/%Y";

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const LOOSE_DATE_FORMATS: &[&str] = &[DATE_FORMAT, "%Y/%m/%d", "%m/%d/%Y"];

/// A date as it shows up in forms and backend payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Date(NaiveDate),
    Text(String),
}

impl DateValue {
    /// Reads an HTML date input. Blank inputs carry no date at all.
    pub fn from_input(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self::Text(trimmed.to_string()))
        }
    }

    pub fn to_date(&self) -> Option<NaiveDate> {
        normalize(Some(self))
    }
}

impl From<NaiveDate> for DateValue {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<&str> for DateValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for DateValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

pub fn normalize(value: Option<&DateValue>) -> Option<NaiveDate> {
    match value? {
        DateValue::Date(date) => Some(*date),
        DateValue::Text(text) => parse_text(text),
    }
}

fn parse_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // Plain dates are calendar days already; no zone may shift them.
    if is_plain_date(text) {
        return NaiveDate::parse_from_str(text, DATE_FORMAT).ok();
    }

    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.with_timezone(&Local).date_naive());
    }
    if let Ok(stamp) = DateTime::parse_from_rfc2822(text) {
        return Some(stamp.with_timezone(&Local).date_naive());
    }

    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|local| local.date())
        .or_else(|| {
            LOOSE_DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        })
}

fn is_plain_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}

/// Inclusive containment of a destination range in its trip range.
pub fn is_within_trip(
    dest_start: Option<&DateValue>,
    dest_end: Option<&DateValue>,
    trip_start: Option<&DateValue>,
    trip_end: Option<&DateValue>,
) -> bool {
    let (Some(dest_start), Some(dest_end), Some(trip_start), Some(trip_end)) = (
        normalize(dest_start),
        normalize(dest_end),
        normalize(trip_start),
        normalize(trip_end),
    ) else {
        return false;
    };

    dest_start >= trip_start && dest_end <= trip_end
}

/// Checks a candidate range against the other destinations of the same trip.
///
/// `exclude_id` names the destination being edited so it does not collide
/// with itself. Destinations whose own dates cannot be read never block. A
/// candidate whose dates cannot be read always does.
pub fn overlaps(
    candidate_start: Option<&DateValue>,
    candidate_end: Option<&DateValue>,
    existing: &[Destination],
    exclude_id: Option<i64>,
) -> bool {
    let (Some(start), Some(end)) = (normalize(candidate_start), normalize(candidate_end)) else {
        return true;
    };

    existing
        .iter()
        .filter(|dest| exclude_id.is_none() || dest.id != exclude_id)
        .filter_map(|dest| {
            Some((
                normalize(dest.start_date.as_ref())?,
                normalize(dest.end_date.as_ref())?,
            ))
        })
        .any(|other| ranges_conflict((start, end), other))
}

fn ranges_conflict(
    (start, end): (NaiveDate, NaiveDate),
    (other_start, other_end): (NaiveDate, NaiveDate),
) -> bool {
    let intersects = (start >= other_start && start < other_end)
        || (end > other_start && end <= other_end)
        || (start < other_start && end > other_end);
    let back_to_back = start == other_end || end == other_start;

    if intersects && !back_to_back {
        return true;
    }

    // Shared boundaries conflict even when the ranges also touch end to start.
    start == other_start || end == other_end
}

/// Inclusive number of days between two dates, in either order.
pub fn day_count(start: Option<&DateValue>, end: Option<&DateValue>) -> i64 {
    match (normalize(start), normalize(end)) {
        (Some(start), Some(end)) => (end - start).num_days().abs() + 1,
        _ => 0,
    }
}

pub fn is_future_or_today(date: Option<&DateValue>) -> bool {
    is_on_or_after(date, Local::now().date_naive())
}

pub fn is_on_or_after(date: Option<&DateValue>, today: NaiveDate) -> bool {
    normalize(date).is_some_and(|date| date >= today)
}

/// `YYYY-MM-DD` for date inputs, empty when the value cannot be read.
pub fn format_for_input(value: Option<&DateValue>) -> String {
    normalize(value)
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn format_for_display(value: Option<&DateValue>) -> String {
    match value {
        None => "no date".to_string(),
        Some(value) => normalize(Some(value))
            .map(|date| date.format(DISPLAY_FORMAT).to_string())
            .unwrap_or_else(|| "invalid date".to_string()),
    }
}

/// Trips travel to the backend as local midnight timestamps.
pub fn format_trip_date_for_server(date: NaiveDate) -> String {
    format!("{}T00:00:00", date.format(DATE_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(text: &str) -> DateValue {
        DateValue::from(text)
    }

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn existing(id: i64, start: &str, end: &str) -> Destination {
        let mut dest = Destination::draft(1, "Stop", "Spain", Some(day(start)), Some(day(end)));
        dest.id = Some(id);
        dest
    }

    #[test]
    fn normalize_reads_plain_dates_and_calendar_values_alike() {
        let from_text = normalize(Some(&day("2025-06-01")));
        let from_date = normalize(Some(&DateValue::Date(ymd(2025, 6, 1))));
        assert_eq!(from_text, Some(ymd(2025, 6, 1)));
        assert_eq!(from_text, from_date);
    }

    #[test]
    fn normalize_drops_time_of_day() {
        assert_eq!(
            normalize(Some(&day("2025-06-01T00:00:00"))),
            Some(ymd(2025, 6, 1))
        );
        assert_eq!(
            normalize(Some(&day("2025-06-01T23:59:59.250"))),
            Some(ymd(2025, 6, 1))
        );
    }

    #[test]
    fn normalize_converts_offset_timestamps_to_local_days() {
        let stamp = "2025-06-01T12:00:00+00:00";
        let expected = DateTime::parse_from_rfc3339(stamp)
            .unwrap()
            .with_timezone(&Local)
            .date_naive();
        assert_eq!(normalize(Some(&day(stamp))), Some(expected));
    }

    #[test]
    fn normalize_reads_month_first_slashed_dates() {
        assert_eq!(normalize(Some(&day("06/01/2025"))), Some(ymd(2025, 6, 1)));
        assert_eq!(normalize(Some(&day("2025/06/01"))), Some(ymd(2025, 6, 1)));
        assert_eq!(normalize(Some(&day("13/01/2025"))), None);
    }

    #[test]
    fn normalize_rejects_missing_and_garbage() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some(&day(""))), None);
        assert_eq!(normalize(Some(&day("   "))), None);
        assert_eq!(normalize(Some(&day("next tuesday"))), None);
        assert_eq!(normalize(Some(&day("2025-02-30"))), None);
    }

    #[test]
    fn within_trip_allows_shared_boundaries() {
        assert!(is_within_trip(
            Some(&day("2025-06-01")),
            Some(&day("2025-06-10")),
            Some(&day("2025-06-01T00:00:00")),
            Some(&day("2025-06-10T00:00:00")),
        ));
        assert!(is_within_trip(
            Some(&day("2025-06-03")),
            Some(&day("2025-06-04")),
            Some(&day("2025-06-01")),
            Some(&day("2025-06-10")),
        ));
    }

    #[test]
    fn within_trip_rejects_ranges_spilling_out() {
        let trip_start = day("2025-06-01");
        let trip_end = day("2025-06-10");
        assert!(!is_within_trip(
            Some(&day("2025-05-31")),
            Some(&day("2025-06-05")),
            Some(&trip_start),
            Some(&trip_end),
        ));
        assert!(!is_within_trip(
            Some(&day("2025-06-05")),
            Some(&day("2025-06-11")),
            Some(&trip_start),
            Some(&trip_end),
        ));
    }

    #[test]
    fn within_trip_fails_when_any_date_is_unreadable() {
        assert!(!is_within_trip(
            Some(&day("2025-06-02")),
            None,
            Some(&day("2025-06-01")),
            Some(&day("2025-06-10")),
        ));
        assert!(!is_within_trip(
            Some(&day("2025-06-02")),
            Some(&day("2025-06-03")),
            Some(&day("soon")),
            Some(&day("2025-06-10")),
        ));
    }

    #[test]
    fn back_to_back_destinations_do_not_overlap() {
        let stops = vec![existing(1, "2025-06-01", "2025-06-05")];
        assert!(!overlaps(
            Some(&day("2025-06-05")),
            Some(&day("2025-06-10")),
            &stops,
            None
        ));
    }

    #[test]
    fn candidate_ending_where_a_stop_starts_does_not_overlap() {
        let stops = vec![existing(1, "2025-06-05", "2025-06-10")];
        assert!(!overlaps(
            Some(&day("2025-06-01")),
            Some(&day("2025-06-05")),
            &stops,
            None
        ));
    }

    #[test]
    fn identical_end_always_overlaps() {
        let stops = vec![existing(1, "2025-06-05", "2025-06-10")];
        assert!(overlaps(
            Some(&day("2025-06-07")),
            Some(&day("2025-06-10")),
            &stops,
            None
        ));
    }

    #[test]
    fn identical_start_always_overlaps() {
        let stops = vec![existing(1, "2025-06-01", "2025-06-05")];
        assert!(overlaps(
            Some(&day("2025-06-01")),
            Some(&day("2025-06-03")),
            &stops,
            None
        ));
    }

    #[test]
    fn identical_boundaries_beat_adjacency() {
        // Single-day stop: the candidate both touches it and shares its end.
        let stops = vec![existing(1, "2025-06-05", "2025-06-05")];
        assert!(overlaps(
            Some(&day("2025-06-01")),
            Some(&day("2025-06-05")),
            &stops,
            None
        ));
    }

    #[test]
    fn nested_and_enclosing_ranges_overlap() {
        let stops = vec![existing(1, "2025-06-01", "2025-06-10")];
        assert!(overlaps(
            Some(&day("2025-06-03")),
            Some(&day("2025-06-05")),
            &stops,
            None
        ));

        let stops = vec![existing(1, "2025-06-03", "2025-06-05")];
        assert!(overlaps(
            Some(&day("2025-06-01")),
            Some(&day("2025-06-10")),
            &stops,
            None
        ));
    }

    #[test]
    fn disjoint_ranges_do_not_overlap() {
        let stops = vec![
            existing(1, "2025-06-01", "2025-06-03"),
            existing(2, "2025-06-10", "2025-06-12"),
        ];
        assert!(!overlaps(
            Some(&day("2025-06-04")),
            Some(&day("2025-06-09")),
            &stops,
            None
        ));
    }

    #[test]
    fn editing_skips_the_destination_itself() {
        let stops = vec![existing(7, "2025-06-01", "2025-06-10")];
        assert!(!overlaps(
            Some(&day("2025-06-01")),
            Some(&day("2025-06-10")),
            &stops,
            Some(7)
        ));
        assert!(overlaps(
            Some(&day("2025-06-01")),
            Some(&day("2025-06-10")),
            &stops,
            Some(8)
        ));
    }

    #[test]
    fn unreadable_existing_dates_never_block() {
        let mut legacy = existing(1, "2025-06-01", "2025-06-10");
        legacy.end_date = Some(day("whenever"));
        assert!(!overlaps(
            Some(&day("2025-06-02")),
            Some(&day("2025-06-04")),
            &[legacy],
            None
        ));
    }

    #[test]
    fn unreadable_candidate_blocks() {
        assert!(overlaps(Some(&day("bogus")), Some(&day("2025-06-04")), &[], None));
    }

    #[test]
    fn day_count_is_inclusive_and_symmetric() {
        let a = day("2025-06-01");
        let b = day("2025-06-05T00:00:00");
        assert_eq!(day_count(Some(&a), Some(&a)), 1);
        assert_eq!(day_count(Some(&a), Some(&b)), 5);
        assert_eq!(day_count(Some(&b), Some(&a)), 5);
        assert_eq!(day_count(Some(&a), None), 0);
    }

    #[test]
    fn day_count_crosses_month_and_leap_day() {
        assert_eq!(
            day_count(Some(&day("2024-02-27")), Some(&day("2024-03-01"))),
            4
        );
    }

    #[test]
    fn today_counts_as_future_and_yesterday_does_not() {
        let today = Local::now().date_naive();
        let yesterday = today.pred_opt().unwrap();
        assert!(is_future_or_today(Some(&DateValue::Date(today))));
        assert!(!is_future_or_today(Some(&DateValue::Date(yesterday))));
        assert!(!is_future_or_today(None));
    }

    #[test]
    fn on_or_after_uses_the_given_reference_day() {
        let reference = ymd(2025, 6, 1);
        assert!(is_on_or_after(Some(&day("2025-06-01")), reference));
        assert!(!is_on_or_after(Some(&day("2025-05-31")), reference));
    }

    #[test]
    fn formatting_helpers() {
        let value = day("2025-06-01T00:00:00");
        assert_eq!(format_for_input(Some(&value)), "2025-06-01");
        assert_eq!(format_for_input(Some(&day("nope"))), "");
        assert_eq!(format_for_display(Some(&value)), "01/06/2025");
        assert_eq!(format_for_display(None), "no date");
        assert_eq!(format_for_display(Some(&day("nope"))), "invalid date");
        assert_eq!(
            format_trip_date_for_server(ymd(2025, 6, 1)),
            "2025-06-01T00:00:00"
        );
    }

    #[test]
    fn date_values_round_trip_through_json_untagged() {
        let parsed: DateValue = serde_json::from_str("\"2025-06-01\"").unwrap();
        assert_eq!(parsed, DateValue::Date(ymd(2025, 6, 1)));
        let parsed: DateValue = serde_json::from_str("\"2025-06-01T00:00:00\"").unwrap();
        assert_eq!(parsed, DateValue::Text("2025-06-01T00:00:00".into()));
        assert_eq!(
            serde_json::to_string(&DateValue::Date(ymd(2025, 6, 1))).unwrap(),
            "\"2025-06-01\""
        );
    }
}
