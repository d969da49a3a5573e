//! Parsing of wire dates/times and conversion of business-local wall time to UTC.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::error::{TurnoError, TurnoResult};

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> TurnoResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| TurnoError::InvalidDate(s.into()))
}

/// Parse a 24-hour `HH:mm` time of day.
pub fn parse_time(s: &str) -> TurnoResult<NaiveTime> {
    let trimmed = s.trim();
    // chrono accepts single-digit hours; the wire format doesn't
    if trimmed.len() != 5 {
        return Err(TurnoError::InvalidTime(s.into()));
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M").map_err(|_| TurnoError::InvalidTime(s.into()))
}

/// Resolve a wall-clock time in `tz` to an absolute instant.
///
/// Ambiguous times (clocks going back) resolve to the earlier instant. Times
/// inside a spring-forward gap don't exist locally; they are read with the
/// offset in force before the gap, which pushes them forward by the gap length.
pub fn local_to_utc(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let offset = tz.offset_from_utc_datetime(&(local - Duration::days(1))).fix();
            (local - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
        }
    }
}

/// Absolute bounds of one business-local calendar day, `00:00` up to the last
/// millisecond before the next midnight.
pub fn day_bounds(tz: Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_to_utc(tz, date.and_time(NaiveTime::MIN));
    let next = date.succ_opt().unwrap_or(date);
    let end = local_to_utc(tz, next.and_time(NaiveTime::MIN)) - Duration::milliseconds(1);
    (start, end)
}
