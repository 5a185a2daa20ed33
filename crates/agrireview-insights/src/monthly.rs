//! Month-bucketed conversation volume from free-form `sent_date` strings.

use std::collections::BTreeMap;

use agrireview_core::{Field, RecordSet};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

/// Date-time layouts carrying a UTC offset.
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Date-time layouts without an offset.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// Date-only layouts.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Permissive date parser. Accepts RFC 3339 and the common export layouts
/// above; the calendar date is taken in the timestamp's own offset.
pub fn parse_sent_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local().date());
    }
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local().date());
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    None
}

/// `YYYY-MM` bucket key for a date.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Count records per calendar month. Records whose date is missing or
/// unparseable are left out. Months with no records are not emitted.
pub fn monthly_counts(set: &RecordSet) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    if !set.has_field(Field::SentDate) {
        return counts;
    }

    let mut skipped = 0usize;
    for record in &set.records {
        match record.sent_date.as_deref().and_then(parse_sent_date) {
            Some(date) => *counts.entry(month_key(date)).or_insert(0) += 1,
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("{} records without a parseable sent_date left out of monthly counts", skipped);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrireview_core::{ConversationRecord, FieldSet};

    fn with_dates(dates: &[Option<&str>]) -> RecordSet {
        RecordSet::new(
            dates
                .iter()
                .enumerate()
                .map(|(i, d)| ConversationRecord {
                    sent_date: d.map(str::to_string),
                    ..ConversationRecord::new(i as i64)
                })
                .collect(),
        )
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_buckets_by_month_and_skips_unparseable() {
        let set = with_dates(&[
            Some("2024-01-05"),
            Some("2024-01-20"),
            Some("2024-02-01"),
            Some("not-a-date"),
        ]);
        let counts = monthly_counts(&set);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["2024-01"], 2);
        assert_eq!(counts["2024-02"], 1);
    }

    #[test]
    fn test_no_interpolation_of_gaps() {
        let set = with_dates(&[Some("2023-11-30"), Some("2024-03-01"), None]);
        let counts = monthly_counts(&set);
        let keys: Vec<&str> = counts.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2023-11", "2024-03"]);
    }

    #[test]
    fn test_parse_common_layouts() {
        let cases = [
            ("2024-01-05", ymd(2024, 1, 5)),
            ("2024-01-05 10:32:11", ymd(2024, 1, 5)),
            ("2024-01-05 10:32:11.250", ymd(2024, 1, 5)),
            ("2024-01-05T10:32:11", ymd(2024, 1, 5)),
            ("2024-01-05T23:30:00Z", ymd(2024, 1, 5)),
            ("2024-01-05T23:30:00+05:30", ymd(2024, 1, 5)),
            ("2024-01-05 10:32", ymd(2024, 1, 5)),
            ("2024/01/05", ymd(2024, 1, 5)),
            ("01/05/2024", ymd(2024, 1, 5)),
            ("01/05/2024 14:03", ymd(2024, 1, 5)),
            ("05.01.2024", ymd(2024, 1, 5)),
            ("January 5, 2024", ymd(2024, 1, 5)),
            ("Jan 5, 2024", ymd(2024, 1, 5)),
            ("5 January 2024", ymd(2024, 1, 5)),
            ("  2024-01-05  ", ymd(2024, 1, 5)),
        ];
        for (raw, expected) in cases {
            assert_eq!(parse_sent_date(raw), Some(expected), "parsing {:?}", raw);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["", "   ", "not-a-date", "nan", "2024-13-01", "2024-02-30", "yesterday"] {
            assert_eq!(parse_sent_date(raw), None, "parsing {:?}", raw);
        }
    }

    #[test]
    fn test_offset_keeps_local_calendar_date() {
        // 23:30 at -05:00 is already the next day in UTC; bucket by the local date.
        assert_eq!(
            parse_sent_date("2024-01-31T23:30:00-05:00"),
            Some(ymd(2024, 1, 31))
        );
    }

    #[test]
    fn test_absent_field_is_empty() {
        let set = RecordSet::with_fields(
            vec![ConversationRecord {
                sent_date: Some("2024-01-05".to_string()),
                ..ConversationRecord::new(1)
            }],
            FieldSet::all().without(Field::SentDate),
        );
        assert!(monthly_counts(&set).is_empty());
    }
}
