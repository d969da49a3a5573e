//! Core of turno, a meeting-booking backend.
//!
//! This crate holds everything that doesn't depend on a specific calendar provider:
//! - `BookingConfig`: business hours, meeting length, buffer, notice window
//! - `compute_available_slots`: the availability calculator
//! - `BookingService`: the two entry points (list slots, create a booking)
//! - `CalendarBackend`: the trait a calendar provider implements

pub mod booking;
pub mod calendar;
pub mod config;
pub mod error;
pub mod service;
pub mod slots;
pub mod time;

pub use booking::{BookingRequest, BookingResult};
pub use calendar::{BusyInterval, BusyQuery, CalendarBackend, EventAttendee, NewEvent};
pub use config::{BookingConfig, ReadFailurePolicy};
pub use error::{TurnoError, TurnoResult};
pub use service::BookingService;
pub use slots::{TimeSlot, compute_available_slots};
