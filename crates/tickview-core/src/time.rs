//! Calendar helpers for relative and absolute date display.
//!
//! All timestamps crossing the document boundary are milliseconds since the
//! Unix epoch. Day truncation happens in the caller's time zone; ISO dates are
//! always rendered in UTC so a date string does not depend on where the page
//! is viewed.

use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};

/// Unit table scanned from coarsest to finest by [`elapsed_time`].
const TIMEFRAMES: [(u64, &str); 7] = [
    (86_400 * 365 * 1000, "years"),
    (86_400 * 30 * 1000, "months"),
    (86_400 * 7 * 1000, "weeks"),
    (86_400 * 1000, "days"),
    (3600 * 1000, "hours"),
    (60 * 1000, "minutes"),
    (1000, "seconds"),
];

/// Local midnight of `t`'s calendar date.
///
/// When midnight does not exist locally (a DST gap), the first valid instant
/// of the day one hour later is used. Ambiguous midnights resolve to the
/// earlier instant.
#[must_use]
pub fn truncate_to_day<Tz: TimeZone>(t: &DateTime<Tz>) -> DateTime<Tz> {
    let tz = t.timezone();
    let midnight = t.date_naive().and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + TimeDelta::hours(1)))
                .earliest()
        })
        .unwrap_or_else(|| t.clone())
}

/// Midnight of the day before `t`.
///
/// Steps back three hours from midnight before truncating again, so a 23- or
/// 25-hour day never lands exactly on a boundary.
#[must_use]
pub fn day_before<Tz: TimeZone>(t: &DateTime<Tz>) -> DateTime<Tz> {
    truncate_to_day(&(truncate_to_day(t) - TimeDelta::hours(3)))
}

/// `YYYY-MM-DD` for a millisecond timestamp, in UTC.
///
/// Out-of-range timestamps fall back to their decimal representation.
#[must_use]
pub fn iso_date(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map_or_else(|| millis.to_string(), |dt| dt.format("%Y-%m-%d").to_string())
}

/// ISO date of an arbitrary zoned instant, in UTC.
#[must_use]
pub fn iso_date_of<Tz: TimeZone>(t: &DateTime<Tz>) -> String {
    iso_date(t.timestamp_millis())
}

/// Humanized magnitude of a millisecond delta, e.g. `"3 days"`.
///
/// Picks the coarsest unit whose doubled size still fits in `|delta|`, so 36
/// hours reads as `"36 hours"` rather than `"1 days"`. Unit names are always
/// plural.
#[must_use]
pub fn elapsed_time(delta_millis: i64) -> String {
    let elapsed = delta_millis.unsigned_abs();
    let (size, name) = TIMEFRAMES
        .iter()
        .copied()
        .find(|(size, _)| elapsed >= size.saturating_mul(2))
        .unwrap_or(TIMEFRAMES[TIMEFRAMES.len() - 1]);
    format!("{} {name}", elapsed / size)
}

/// `"<elapsed> ago"` for past timestamps, `"<elapsed> from now"` otherwise.
#[must_use]
pub fn ago_format(timestamp_millis: i64, now_millis: i64) -> String {
    let delta = timestamp_millis.saturating_sub(now_millis);
    let direction = if delta < 0 { "ago" } else { "from now" };
    format!("{} {direction}", elapsed_time(delta))
}
