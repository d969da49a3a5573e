//! Google Calendar backend for turno.
//!
//! Reads busy time through the freeBusy endpoint and books meetings through
//! events.insert (with a Google Meet link), authenticating as the calendar
//! owner with an OAuth refresh token.

mod client;
mod config;
mod convert;
mod session;
mod types;

pub use client::GoogleCalendar;
pub use config::{DEFAULT_API_BASE, DEFAULT_TOKEN_URL, GoogleConfig};
