//! Fetch window planning
//!
//! The schedule is requested for a 14 hour span starting two hours before
//! now. Persistence is grouped by UTC calendar day, so a span that crosses
//! midnight is requested as two windows, one per day.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};

const LOOKBACK_HOURS: i64 = 2;
const SPAN_HOURS: i64 = 14;

/// A time range attributed to a single calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    pub fn query_start(&self) -> String {
        format_query_time(&self.start)
    }

    pub fn query_stop(&self) -> String {
        format_query_time(&self.end)
    }
}

/// `2024-01-15T12:00:00.000Z`
fn format_query_time(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn truncate_to_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    let naive = t.date_naive().and_time(NaiveTime::MIN) + Duration::hours(t.hour() as i64);
    Utc.from_utc_datetime(&naive)
}

fn at(day: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&day.and_time(time))
}

/// Windows to fetch for `now`, in chronological order
pub fn plan(now: DateTime<Utc>) -> Vec<FetchWindow> {
    let start = truncate_to_hour(now - Duration::hours(LOOKBACK_HOURS));
    let end = start + Duration::hours(SPAN_HOURS);
    let start_day = start.date_naive();
    let end_day = end.date_naive();

    if start_day == end_day {
        return vec![FetchWindow { day: start_day, start, end }];
    }
    // Ending exactly at midnight would leave an empty second window
    if end == at(end_day, 0, 0) {
        return vec![FetchWindow { day: start_day, start, end: at(start_day, 23, 59) }];
    }

    vec![
        FetchWindow { day: start_day, start, end: at(start_day, 23, 59) },
        FetchWindow { day: end_day, start: at(end_day, 0, 0), end },
    ]
}
