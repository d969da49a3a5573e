//! Booking configuration.
//!
//! Everything the availability calculator and the booking writer need to know
//! about business hours lives in [`BookingConfig`]. It is a plain data struct:
//! callers deserialize it (the server does so from `turno.toml` and the
//! environment) and hand it to [`crate::BookingService`].

use std::time::Duration as StdDuration;

use chrono::{Duration, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{TurnoError, TurnoResult};

/// Google's alias for the owner's main calendar
pub const DEFAULT_CALENDAR_ID: &str = "primary";

fn default_calendar_id() -> String {
    DEFAULT_CALENDAR_ID.to_string()
}

fn default_timezone() -> Tz {
    chrono_tz::America::Argentina::Buenos_Aires
}

fn default_work_start_hour() -> u32 {
    9
}

fn default_work_end_hour() -> u32 {
    18
}

fn default_slot_stride_minutes() -> u32 {
    30
}

fn default_meeting_duration_minutes() -> u32 {
    45
}

fn default_buffer_minutes() -> u32 {
    10
}

fn default_min_notice_hours() -> u32 {
    4
}

fn default_open_weekdays() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
}

fn default_recheck_before_booking() -> bool {
    true
}

fn default_calendar_timeout_secs() -> u64 {
    10
}

fn default_site_name() -> String {
    "ainponce.com".to_string()
}

/// Upper bound for notice, meeting length and buffer: one (leap) year.
const MAX_SPAN_MINUTES: u32 = 366 * 24 * 60;

/// What to do when busy intervals can't be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadFailurePolicy {
    /// Log the failure and compute slots as if the day had no busy time.
    #[default]
    FailOpen,
    /// Surface the failure to the caller.
    FailClosed,
}

/// Business hours, meeting shape and calendar policy for one bookable calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingConfig {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// IANA zone used to interpret business hours and to label slots
    #[serde(default = "default_timezone")]
    pub timezone: Tz,

    #[serde(default = "default_work_start_hour")]
    pub work_start_hour: u32,

    #[serde(default = "default_work_end_hour")]
    pub work_end_hour: u32,

    /// Spacing between candidate slot start times
    #[serde(default = "default_slot_stride_minutes")]
    pub slot_stride_minutes: u32,

    #[serde(default = "default_meeting_duration_minutes")]
    pub meeting_duration_minutes: u32,

    /// Padding after the meeting that must also be free of busy time
    #[serde(default = "default_buffer_minutes")]
    pub buffer_minutes: u32,

    #[serde(default = "default_min_notice_hours")]
    pub min_notice_hours: u32,

    #[serde(default = "default_open_weekdays")]
    pub open_weekdays: Vec<Weekday>,

    #[serde(default)]
    pub read_failure: ReadFailurePolicy,

    /// Re-fetch busy time right before writing and refuse slots that are taken
    #[serde(default = "default_recheck_before_booking")]
    pub recheck_before_booking: bool,

    #[serde(default = "default_calendar_timeout_secs")]
    pub calendar_timeout_secs: u64,

    /// Written into event descriptions as "Booked via {site_name}"
    #[serde(default = "default_site_name")]
    pub site_name: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        BookingConfig {
            calendar_id: default_calendar_id(),
            timezone: default_timezone(),
            work_start_hour: default_work_start_hour(),
            work_end_hour: default_work_end_hour(),
            slot_stride_minutes: default_slot_stride_minutes(),
            meeting_duration_minutes: default_meeting_duration_minutes(),
            buffer_minutes: default_buffer_minutes(),
            min_notice_hours: default_min_notice_hours(),
            open_weekdays: default_open_weekdays(),
            read_failure: ReadFailurePolicy::default(),
            recheck_before_booking: default_recheck_before_booking(),
            calendar_timeout_secs: default_calendar_timeout_secs(),
            site_name: default_site_name(),
        }
    }
}

impl BookingConfig {
    /// Check that the configured hours describe a usable workday.
    pub fn validate(&self) -> TurnoResult<()> {
        if self.calendar_id.trim().is_empty() {
            return Err(TurnoError::Config("calendar_id must not be empty".into()));
        }
        if self.work_end_hour > 24 {
            return Err(TurnoError::Config(format!(
                "work_end_hour must be at most 24, got {}",
                self.work_end_hour
            )));
        }
        if self.work_start_hour >= self.work_end_hour {
            return Err(TurnoError::Config(format!(
                "work_start_hour ({}) must be before work_end_hour ({})",
                self.work_start_hour, self.work_end_hour
            )));
        }
        if self.slot_stride_minutes == 0 {
            return Err(TurnoError::Config("slot_stride_minutes must be positive".into()));
        }
        if self.meeting_duration_minutes == 0 {
            return Err(TurnoError::Config(
                "meeting_duration_minutes must be positive".into(),
            ));
        }
        if self.meeting_duration_minutes > MAX_SPAN_MINUTES {
            return Err(TurnoError::Config(format!(
                "meeting_duration_minutes must be at most {}, got {}",
                MAX_SPAN_MINUTES, self.meeting_duration_minutes
            )));
        }
        if self.buffer_minutes > MAX_SPAN_MINUTES {
            return Err(TurnoError::Config(format!(
                "buffer_minutes must be at most {}, got {}",
                MAX_SPAN_MINUTES, self.buffer_minutes
            )));
        }
        if self.min_notice_hours > MAX_SPAN_MINUTES / 60 {
            return Err(TurnoError::Config(format!(
                "min_notice_hours must be at most {}, got {}",
                MAX_SPAN_MINUTES / 60,
                self.min_notice_hours
            )));
        }
        if self.calendar_timeout_secs == 0 {
            return Err(TurnoError::Config("calendar_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn slot_stride(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_stride_minutes))
    }

    pub fn meeting_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.meeting_duration_minutes))
    }

    pub fn buffer(&self) -> Duration {
        Duration::minutes(i64::from(self.buffer_minutes))
    }

    pub fn min_notice(&self) -> Duration {
        Duration::hours(i64::from(self.min_notice_hours))
    }

    pub fn calendar_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.calendar_timeout_secs)
    }

    pub fn is_open_on(&self, weekday: Weekday) -> bool {
        self.open_weekdays.contains(&weekday)
    }

    /// Number of candidate slots in one day. Only depends on the hours and stride.
    pub fn slots_per_day(&self) -> usize {
        let minutes = (self.work_end_hour.saturating_sub(self.work_start_hour)) * 60;
        (minutes / self.slot_stride_minutes.max(1)) as usize
    }
}
