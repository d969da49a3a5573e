//! Availability calculator: turns business hours plus busy time into bookable slots.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::BusyInterval;
use crate::config::BookingConfig;
use crate::time::local_to_utc;

/// A potential meeting start, labelled in business-local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// `HH:mm` in the configured timezone
    pub time: String,
    pub available: bool,
}

/// Compute every candidate slot of `date` and flag which ones can be booked.
///
/// Candidates are laid out on the business-local wall clock from
/// `work_start_hour`, one every `slot_stride_minutes`, strictly before
/// `work_end_hour`; busy time, `now` and the weekday only change the
/// `available` flags, never the number of slots.
///
/// A slot is available when all of these hold:
/// - it starts at least `min_notice_hours` after `now`,
/// - the meeting (without buffer) ends by `work_end_hour`,
/// - the meeting plus buffer doesn't overlap any busy interval,
/// - the weekday is one of `open_weekdays`.
pub fn compute_available_slots(
    config: &BookingConfig,
    date: NaiveDate,
    now: DateTime<Utc>,
    busy: &[BusyInterval],
) -> Vec<TimeSlot> {
    let tz = config.timezone;
    let day_open = config.is_open_on(date.weekday());
    // Past the end of representable time nothing is bookable
    let min_bookable = now.checked_add_signed(config.min_notice());
    let work_start = wall_clock(date, config.work_start_hour);
    let work_end = wall_clock(date, config.work_end_hour);

    let mut slots = Vec::with_capacity(config.slots_per_day());
    let mut current = work_start;

    while current < work_end {
        let window_end = current + config.meeting_duration() + config.buffer();

        let start_utc = local_to_utc(tz, current);
        let window_end_utc = local_to_utc(tz, window_end);

        let too_soon = min_bookable.is_none_or(|earliest| start_utc < earliest);
        let exceeds_work_hours = current + config.meeting_duration() > work_end;
        let has_overlap = busy
            .iter()
            .any(|b| b.overlaps(start_utc, window_end_utc));

        slots.push(TimeSlot {
            time: current.format("%H:%M").to_string(),
            available: day_open && !too_soon && !exceeds_work_hours && !has_overlap,
        });

        current += config.slot_stride();
    }

    slots
}

/// `date` at `hour:00` on the wall clock. Hour 24 is the following midnight.
fn wall_clock(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour))
}
