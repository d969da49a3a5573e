//! Conversions between turno's calendar types and Google's wire types.

use anyhow::Result;
use turno_core::{BusyInterval, BusyQuery, NewEvent};

use crate::types::{
    ConferenceData, ConferenceSolutionKey, CreateConferenceRequest, EventAttendee, EventDateTime,
    FreeBusyRequest, FreeBusyRequestItem, FreeBusyResponse, GoogleEvent,
};

/// Google Meet
const CONFERENCE_SOLUTION: &str = "hangoutsMeet";

pub trait ToGoogle<T> {
    fn to_google(&self) -> T;
}

impl ToGoogle<FreeBusyRequest> for BusyQuery {
    fn to_google(&self) -> FreeBusyRequest {
        FreeBusyRequest {
            time_min: self.time_min,
            time_max: self.time_max,
            time_zone: self.time_zone.name().to_string(),
            items: vec![FreeBusyRequestItem {
                id: self.calendar_id.clone(),
            }],
        }
    }
}

impl ToGoogle<GoogleEvent> for NewEvent {
    fn to_google(&self) -> GoogleEvent {
        let time_zone = self.time_zone.name().to_string();

        GoogleEvent {
            id: self.event_id.clone(),
            summary: self.summary.clone(),
            description: self.description.clone(),
            start: EventDateTime {
                date_time: self.start,
                time_zone: time_zone.clone(),
            },
            end: EventDateTime {
                date_time: self.end,
                time_zone,
            },
            attendees: vec![EventAttendee {
                email: self.attendee.email.clone(),
                display_name: self.attendee.name.clone(),
            }],
            conference_data: self.conference_request_id.as_ref().map(|request_id| {
                ConferenceData {
                    create_request: CreateConferenceRequest {
                        request_id: request_id.clone(),
                        conference_solution_key: ConferenceSolutionKey {
                            type_: CONFERENCE_SOLUTION.to_string(),
                        },
                    },
                }
            }),
            status: None,
        }
    }
}

/// Busy intervals of `calendar_id` from a freeBusy response.
///
/// Google reports per-calendar problems (no access, unknown id) inside a 200
/// response; those are turned into errors so the read-failure policy applies.
pub fn busy_from_google(
    response: FreeBusyResponse,
    calendar_id: &str,
) -> Result<Vec<BusyInterval>> {
    let mut calendars = response.calendars;
    let Some(calendar) = calendars.remove(calendar_id) else {
        return Ok(Vec::new());
    };

    if !calendar.errors.is_empty() {
        let reasons: Vec<String> = calendar
            .errors
            .iter()
            .map(|e| format!("{}/{}", e.domain, e.reason))
            .collect();
        anyhow::bail!(
            "freeBusy returned errors for calendar {}: {}",
            calendar_id,
            reasons.join(", ")
        );
    }

    Ok(calendar
        .busy
        .into_iter()
        .map(|period| BusyInterval::new(period.start, period.end))
        .collect())
}
