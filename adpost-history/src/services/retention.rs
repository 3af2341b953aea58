// src/services/retention.rs
//! Timestamps and the retention cutoff.
//!
//! New records carry UTC RFC 3339 timestamps with fixed microsecond precision
//! and a `Z` suffix, so text order equals time order. Older files may hold
//! naive local timestamps (`2025-01-31T09:15:02.123456`); those still parse.

use chrono::{
    DateTime, Local, LocalResult, NaiveDateTime, Offset, SecondsFormat, TimeDelta, TimeZone, Utc,
};
use serde::Serialize;

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Write-time timestamp text for `at`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp. RFC 3339 first, then naive local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT).ok()?;
    resolve_local(naive, |n| Local.from_local_datetime(n))
}

/// Map a wall-clock time to an instant. Ambiguous times take the earlier
/// instant. A time skipped by a forward clock change is read with the offset
/// in force just before the change.
fn resolve_local<Tz, F>(naive: NaiveDateTime, zone: F) -> Option<DateTime<Utc>>
where
    Tz: TimeZone,
    F: Fn(&NaiveDateTime) -> LocalResult<DateTime<Tz>>,
{
    if let Some(dt) = zone(&naive).earliest() {
        return Some(dt.with_timezone(&Utc));
    }
    (1..=24)
        .find_map(|hours| {
            let before = naive.checked_sub_signed(TimeDelta::hours(hours))?;
            let offset = zone(&before).latest()?.offset().fix();
            offset.from_local_datetime(&naive).single()
        })
        .map(|dt| dt.with_timezone(&Utc))
}

/// `now - days * 24h`. Zero or negative `days` put the cutoff at or after
/// `now`; spans too large for the calendar saturate.
pub fn cutoff(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(if days > 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

/// A record survives cleanup only when its timestamp parses and is strictly
/// after the cutoff.
pub fn is_retained(raw: &str, cutoff: DateTime<Utc>) -> bool {
    match parse_timestamp(raw) {
        Some(ts) => ts > cutoff,
        None => {
            tracing::debug!(timestamp = raw, "unparseable timestamp; record expires");
            false
        }
    }
}

/// Kept/removed counts for one collection after a cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneCounts {
    pub kept: usize,
    pub removed: usize,
}

impl From<(usize, usize)> for PruneCounts {
    fn from((kept, removed): (usize, usize)) -> Self {
        Self { kept, removed }
    }
}

/// Outcome of `ContentHistory::cleanup_old_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub days: i64,
    pub cutoff: String,
    pub prompts: PruneCounts,
    pub captions: PruneCounts,
    pub images: PruneCounts,
    pub posts: PruneCounts,
}

impl CleanupReport {
    pub fn total_removed(&self) -> usize {
        self.prompts.removed + self.captions.removed + self.images.removed + self.posts.removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    #[test]
    fn written_timestamps_sort_as_text() {
        let a = Utc.with_ymd_and_hms(2025, 1, 9, 23, 59, 59).unwrap();
        let b = a + TimeDelta::microseconds(1);
        let c = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        let (fa, fb, fc) = (format_timestamp(a), format_timestamp(b), format_timestamp(c));
        assert!(fa < fb && fb < fc, "{fa} {fb} {fc}");
        assert!(fa.ends_with('Z'));
        assert_eq!(fa.len(), fc.len());
    }

    #[test]
    fn parses_both_stored_forms() {
        let utc = parse_timestamp("2025-03-01T12:00:00.000000Z").expect("rfc3339");
        assert_eq!(utc, Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
        assert!(parse_timestamp("2025-03-01T12:00:00.123456").is_some());
        assert!(parse_timestamp("2025-03-01T12:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    // New York, 2026-03-08: clocks jump from 02:00 EST to 03:00 EDT.
    fn new_york_spring_forward(n: &NaiveDateTime) -> LocalResult<DateTime<FixedOffset>> {
        let day = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let gap_start = day.and_hms_opt(2, 0, 0).unwrap();
        let gap_end = day.and_hms_opt(3, 0, 0).unwrap();
        if *n < gap_start {
            FixedOffset::west_opt(5 * 3600).unwrap().from_local_datetime(n)
        } else if *n < gap_end {
            LocalResult::None
        } else {
            FixedOffset::west_opt(4 * 3600).unwrap().from_local_datetime(n)
        }
    }

    #[test]
    fn wall_times_in_a_forward_gap_still_resolve() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let at = |h, m| resolve_local(day.and_hms_opt(h, m, 0).unwrap(), new_york_spring_forward);

        assert_eq!(at(1, 30), Some(Utc.with_ymd_and_hms(2026, 3, 8, 6, 30, 0).unwrap()));
        assert_eq!(at(2, 30), Some(Utc.with_ymd_and_hms(2026, 3, 8, 7, 30, 0).unwrap()));
        assert_eq!(at(4, 30), Some(Utc.with_ymd_and_hms(2026, 3, 8, 8, 30, 0).unwrap()));

        let cut = Utc.with_ymd_and_hms(2016, 3, 8, 0, 0, 0).unwrap();
        assert!(at(2, 30).is_some_and(|ts| ts > cut));
    }

    #[test]
    fn cutoff_moves_with_sign_of_days() {
        let now = Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap();
        assert_eq!(cutoff(now, 30), Utc.with_ymd_and_hms(2025, 5, 31, 0, 0, 0).unwrap());
        assert_eq!(cutoff(now, 0), now);
        assert!(cutoff(now, -1) > now);
    }

    #[test]
    fn cutoff_saturates_instead_of_panicking() {
        let now = Utc::now();
        assert_eq!(cutoff(now, i64::MAX), DateTime::<Utc>::MIN_UTC);
        assert_eq!(cutoff(now, i64::MIN), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn retention_is_strictly_after_cutoff() {
        let cut = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert!(!is_retained("2025-01-01T00:00:00.000000Z", cut));
        assert!(is_retained("2025-01-01T00:00:00.000001Z", cut));
        assert!(!is_retained("garbage", cut));
    }
}
