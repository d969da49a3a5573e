//! The external calendar collaborator.
//!
//! turno keeps no state of its own: busy time is read from, and bookings are
//! written to, whatever implements [`CalendarBackend`]. The Google Calendar
//! implementation lives in the `turno-provider-google` crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::TurnoResult;

/// A period during which the calendar owner is already committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        BusyInterval { start, end }
    }

    /// Half-open overlap test: ranges that only touch don't overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

/// Free/busy lookup for one calendar over one business-local day.
#[derive(Debug, Clone, PartialEq)]
pub struct BusyQuery {
    pub calendar_id: String,
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
    pub time_zone: Tz,
}

/// An event to be created on the external calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub calendar_id: String,
    /// Client-chosen event id. Derived from the booking so replays collide.
    pub event_id: String,
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_zone: Tz,
    pub attendee: EventAttendee,
    /// Ask the calendar to provision a video-meeting link for this request id
    pub conference_request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventAttendee {
    pub email: String,
    pub name: Option<String>,
}

/// Read and write access to the calendar that owns the bookable time.
///
/// `create_event` returns `Ok` only once a live event is on the calendar. It
/// returns [`crate::TurnoError::DuplicateEvent`] only when a live event with the
/// same id and the same times already exists. An id left behind by a cancelled
/// event must be brought back (or reported as an error), never treated as a
/// duplicate.
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    async fn busy_intervals(&self, query: &BusyQuery) -> TurnoResult<Vec<BusyInterval>>;

    async fn create_event(&self, event: &NewEvent) -> TurnoResult<()>;
}
