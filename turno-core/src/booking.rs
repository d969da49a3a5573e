//! Booking requests and the event they turn into.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::{EventAttendee, NewEvent};
use crate::config::BookingConfig;
use crate::error::{TurnoError, TurnoResult};
use crate::time::{local_to_utc, parse_date, parse_time};

/// Message shown to callers when the calendar refuses or fails a write.
pub const GENERIC_FAILURE: &str = "Failed to create booking";

/// Message shown when the chosen slot was taken between listing and booking.
pub const SLOT_TAKEN: &str = "That time slot is no longer available";

/// What the booking form submits once a slot has been picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:mm` in business-local time
    pub time: String,
    pub name: String,
    pub email: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingResult {
    pub success: bool,
    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl BookingResult {
    pub fn success() -> Self {
        BookingResult {
            success: true,
            error_detail: None,
        }
    }

    pub fn failure(detail: &str) -> Self {
        BookingResult {
            success: false,
            error_detail: Some(detail.to_string()),
        }
    }
}

/// A [`BookingRequest`] whose fields have been parsed and checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidBooking {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub name: String,
    pub email: String,
    pub reason: String,
}

impl BookingRequest {
    /// Parse the date and time and check the attendee fields.
    pub fn validate(&self) -> TurnoResult<ValidBooking> {
        let date = parse_date(&self.date)?;
        let time = parse_time(&self.time)?;

        let name = required(&self.name, "name")?;
        let email = required(&self.email, "email")?;
        let reason = required(&self.reason, "reason")?;

        if !looks_like_email(&email) {
            return Err(TurnoError::InvalidRequest(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        Ok(ValidBooking {
            date,
            time,
            name,
            email,
            reason,
        })
    }
}

fn required(value: &str, field: &str) -> TurnoResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TurnoError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    }
}

impl ValidBooking {
    /// `HH:mm` label, the same form slots are listed under.
    pub fn time_label(&self) -> String {
        self.time.format("%H:%M").to_string()
    }

    /// Absolute meeting start, reading date and time in the business timezone.
    pub fn start(&self, config: &BookingConfig) -> DateTime<Utc> {
        local_to_utc(config.timezone, self.date.and_time(self.time))
    }

    /// Stable key for this booking: the same date, time and attendee always
    /// produce the same key, so a replayed request maps onto the same event.
    pub fn idempotency_key(&self) -> Uuid {
        let name = format!(
            "turno:{}T{}:{}",
            self.date.format("%Y-%m-%d"),
            self.time_label(),
            self.email.to_lowercase()
        );
        Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
    }

    /// The calendar event to create for this booking.
    pub fn to_event(&self, config: &BookingConfig) -> NewEvent {
        let start = self.start(config);
        let key = self.idempotency_key();

        NewEvent {
            calendar_id: config.calendar_id.clone(),
            // Lowercase hex is a valid Google event id (base32hex alphabet)
            event_id: key.simple().to_string(),
            summary: format!("Meeting with {}", self.name),
            description: format!("Reason: {}\n\nBooked via {}", self.reason, config.site_name),
            start,
            end: start + config.meeting_duration(),
            time_zone: config.timezone,
            attendee: EventAttendee {
                email: self.email.clone(),
                name: Some(self.name.clone()),
            },
            conference_request_id: Some(key.hyphenated().to_string()),
        }
    }
}
