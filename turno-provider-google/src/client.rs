//! Google Calendar REST calls behind the [`CalendarBackend`] trait.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use tracing::debug;
use turno_core::{BusyInterval, BusyQuery, CalendarBackend, NewEvent, TurnoError, TurnoResult};
use url::Url;

use crate::config::GoogleConfig;
use crate::convert::{ToGoogle, busy_from_google};
use crate::session::Session;
use crate::types::{ExistingEvent, FreeBusyRequest, FreeBusyResponse, GoogleEvent};

const STATUS_CANCELLED: &str = "cancelled";
const STATUS_CONFIRMED: &str = "confirmed";

enum Inserted {
    Created,
    /// The id belonged to a cancelled event, which is live again
    Restored,
    /// A live event with this id and the same times is already on the calendar
    AlreadyExists,
}

impl ExistingEvent {
    fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some(STATUS_CANCELLED)
    }

    fn has_times(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let start_at = self.start.as_ref().and_then(|t| t.date_time);
        let end_at = self.end.as_ref().and_then(|t| t.date_time);
        start_at == Some(start) && end_at == Some(end)
    }
}

pub struct GoogleCalendar {
    http: reqwest::Client,
    api_base: Url,
    session: Session,
}

impl GoogleCalendar {
    pub fn new(config: &GoogleConfig) -> Result<Self> {
        let api_base = Url::parse(&config.api_base)
            .with_context(|| format!("Invalid Google API base URL: {}", config.api_base))?;

        if api_base.cannot_be_a_base() {
            anyhow::bail!("Google API base URL cannot be a base: {}", config.api_base);
        }

        let http = reqwest::Client::new();
        let session = Session::new(http.clone(), config);

        Ok(GoogleCalendar {
            http,
            api_base,
            session,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Google API base URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn query_free_busy(&self, query: &BusyQuery) -> Result<Vec<BusyInterval>> {
        let access_token = self.session.access_token().await?;
        let url = self.endpoint(&["freeBusy"])?;
        let body: FreeBusyRequest = query.to_google();

        debug!(calendar_id = %query.calendar_id, time_min = %query.time_min, time_max = %query.time_max, "querying free/busy");

        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .context("Failed to send freeBusy request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("freeBusy failed ({}): {}", status, error_text);
        }

        let free_busy: FreeBusyResponse = response
            .json()
            .await
            .context("Failed to parse freeBusy response")?;

        busy_from_google(free_busy, &query.calendar_id)
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<Inserted> {
        let access_token = self.session.access_token().await?;
        let url = self.endpoint(&["calendars", &event.calendar_id, "events"])?;
        let body: GoogleEvent = event.to_google();

        debug!(calendar_id = %event.calendar_id, event_id = %event.event_id, "inserting event");

        let response = self
            .http
            .post(url)
            .query(&[("conferenceDataVersion", "1"), ("sendUpdates", "all")])
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to create event: {}", event.summary))?;

        // Client-supplied ids stay reserved per calendar, even after the event is deleted
        if response.status() == StatusCode::CONFLICT {
            return self.resolve_conflict(event).await;
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to create event ({}): {}", status, error_text);
        }

        Ok(Inserted::Created)
    }

    /// Decide what an id collision means by looking at the event holding the id.
    async fn resolve_conflict(&self, event: &NewEvent) -> Result<Inserted> {
        let existing = self.get_event(&event.calendar_id, &event.event_id).await?;

        if existing.is_cancelled() {
            self.restore_event(event).await?;
            return Ok(Inserted::Restored);
        }

        if existing.has_times(event.start, event.end) {
            return Ok(Inserted::AlreadyExists);
        }

        anyhow::bail!(
            "Event {} already exists with different times",
            event.event_id
        )
    }

    async fn get_event(&self, calendar_id: &str, event_id: &str) -> Result<ExistingEvent> {
        let access_token = self.session.access_token().await?;
        let url = self.endpoint(&["calendars", calendar_id, "events", event_id])?;

        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .with_context(|| format!("Failed to fetch event {}", event_id))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to fetch event {} ({}): {}", event_id, status, error_text);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse event {}", event_id))
    }

    /// Bring a cancelled event back with the booking's current details.
    async fn restore_event(&self, event: &NewEvent) -> Result<()> {
        let access_token = self.session.access_token().await?;
        let url = self.endpoint(&["calendars", &event.calendar_id, "events", &event.event_id])?;
        let mut body: GoogleEvent = event.to_google();
        body.status = Some(STATUS_CONFIRMED.to_string());

        debug!(calendar_id = %event.calendar_id, event_id = %event.event_id, "restoring cancelled event");

        let response = self
            .http
            .patch(url)
            .query(&[("conferenceDataVersion", "1"), ("sendUpdates", "all")])
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to restore event: {}", event.summary))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to restore event ({}): {}", status, error_text);
        }

        Ok(())
    }
}

#[async_trait]
impl CalendarBackend for GoogleCalendar {
    async fn busy_intervals(&self, query: &BusyQuery) -> TurnoResult<Vec<BusyInterval>> {
        self.query_free_busy(query)
            .await
            .map_err(|e| TurnoError::Calendar(format!("{:#}", e)))
    }

    async fn create_event(&self, event: &NewEvent) -> TurnoResult<()> {
        match self.insert_event(event).await {
            Ok(Inserted::Created | Inserted::Restored) => Ok(()),
            Ok(Inserted::AlreadyExists) => Err(TurnoError::DuplicateEvent(event.event_id.clone())),
            Err(e) => Err(TurnoError::Calendar(format!("{:#}", e))),
        }
    }
}
