//! Entry points: list a day's slots and book one.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::booking::{BookingRequest, BookingResult, GENERIC_FAILURE, SLOT_TAKEN};
use crate::calendar::{BusyInterval, BusyQuery, CalendarBackend};
use crate::config::{BookingConfig, ReadFailurePolicy};
use crate::error::{TurnoError, TurnoResult};
use crate::slots::{TimeSlot, compute_available_slots};
use crate::time::{day_bounds, parse_date};

/// Availability and booking over one calendar.
///
/// Holds nothing but configuration and a handle to the calendar; every call
/// reads the calendar's current state, so concurrent callers need no locking.
#[derive(Clone)]
pub struct BookingService {
    config: BookingConfig,
    backend: Arc<dyn CalendarBackend>,
}

impl BookingService {
    pub fn new(config: BookingConfig, backend: Arc<dyn CalendarBackend>) -> TurnoResult<Self> {
        config.validate()?;
        Ok(BookingService { config, backend })
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    /// Slots for `date` (`YYYY-MM-DD`), flagged against the calendar's busy time.
    ///
    /// A malformed date is an error. A calendar that can't be read is an error
    /// only when the config says `fail_closed`; otherwise the day is treated as free.
    pub async fn available_slots(&self, date: &str, now: DateTime<Utc>) -> TurnoResult<Vec<TimeSlot>> {
        let date = parse_date(date)?;
        let busy = self.busy_for_day(date).await?;

        Ok(compute_available_slots(&self.config, date, now, &busy))
    }

    /// Create the calendar event for a booking.
    ///
    /// Malformed dates, times or attendee fields are errors. Everything that
    /// goes wrong on the calendar side comes back as a failed [`BookingResult`]
    /// with a generic message; the underlying error is only logged.
    pub async fn create_booking(
        &self,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> TurnoResult<BookingResult> {
        let booking = request.validate()?;
        let label = booking.time_label();

        if self.config.recheck_before_booking {
            let busy = match self.busy_for_day(booking.date).await {
                Ok(busy) => busy,
                Err(e) => {
                    error!(date = %booking.date, time = %label, error = %e, "availability re-check failed");
                    return Ok(BookingResult::failure(GENERIC_FAILURE));
                }
            };

            let slots = compute_available_slots(&self.config, booking.date, now, &busy);
            let free = slots.iter().any(|s| s.time == label && s.available);
            if !free {
                info!(date = %booking.date, time = %label, "requested slot is not available");
                return Ok(BookingResult::failure(SLOT_TAKEN));
            }
        }

        let event = booking.to_event(&self.config);

        match self.with_timeout(self.backend.create_event(&event)).await {
            Ok(()) => {
                info!(date = %booking.date, time = %label, event_id = %event.event_id, "booking created");
                Ok(BookingResult::success())
            }
            Err(TurnoError::DuplicateEvent(id)) => {
                info!(date = %booking.date, time = %label, event_id = %id, "booking already on the calendar, treating replay as success");
                Ok(BookingResult::success())
            }
            Err(e) => {
                error!(date = %booking.date, time = %label, error = %e, "error creating booking");
                Ok(BookingResult::failure(GENERIC_FAILURE))
            }
        }
    }

    /// Busy time for one business-local day, with the read-failure policy applied.
    async fn busy_for_day(&self, date: NaiveDate) -> TurnoResult<Vec<BusyInterval>> {
        let (time_min, time_max) = day_bounds(self.config.timezone, date);
        let query = BusyQuery {
            calendar_id: self.config.calendar_id.clone(),
            time_min,
            time_max,
            time_zone: self.config.timezone,
        };

        match self.with_timeout(self.backend.busy_intervals(&query)).await {
            Ok(busy) => Ok(busy),
            Err(e) => match self.config.read_failure {
                ReadFailurePolicy::FailOpen => {
                    warn!(
                        %date,
                        calendar_id = %query.calendar_id,
                        error = %e,
                        "error fetching busy times, treating day as free"
                    );
                    Ok(Vec::new())
                }
                ReadFailurePolicy::FailClosed => {
                    Err(TurnoError::CalendarUnavailable(e.to_string()))
                }
            },
        }
    }

    async fn with_timeout<T>(&self, fut: impl Future<Output = TurnoResult<T>>) -> TurnoResult<T> {
        let limit = self.config.calendar_timeout();
        timeout(limit, fut)
            .await
            .map_err(|_| TurnoError::CalendarTimeout(limit.as_secs()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::NewEvent;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;
    use std::sync::Mutex;

    enum Busy {
        Intervals(Vec<BusyInterval>),
        Fails,
        Hangs,
    }

    enum Create {
        Succeeds,
        Fails,
        Duplicate,
        Hangs,
    }

    struct FakeCalendar {
        busy: Busy,
        create: Create,
        queries: Mutex<Vec<BusyQuery>>,
        created: Mutex<Vec<NewEvent>>,
    }

    impl FakeCalendar {
        fn new(busy: Busy, create: Create) -> Arc<Self> {
            Arc::new(FakeCalendar {
                busy,
                create,
                queries: Mutex::new(Vec::new()),
                created: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CalendarBackend for FakeCalendar {
        async fn busy_intervals(&self, query: &BusyQuery) -> TurnoResult<Vec<BusyInterval>> {
            self.queries.lock().unwrap().push(query.clone());
            match &self.busy {
                Busy::Intervals(busy) => Ok(busy.clone()),
                Busy::Fails => Err(TurnoError::Calendar("403 Forbidden".into())),
                Busy::Hangs => std::future::pending().await,
            }
        }

        async fn create_event(&self, event: &NewEvent) -> TurnoResult<()> {
            match self.create {
                Create::Succeeds => {
                    self.created.lock().unwrap().push(event.clone());
                    Ok(())
                }
                Create::Fails => Err(TurnoError::Calendar("500 backendError: secret details".into())),
                Create::Duplicate => Err(TurnoError::DuplicateEvent(event.event_id.clone())),
                Create::Hangs => std::future::pending().await,
            }
        }
    }

    /// Keeps events by id the way Google does: deleting an event only marks it
    /// cancelled, its id stays taken, and cancelled events aren't busy.
    #[derive(Default)]
    struct ReservingCalendar {
        events: Mutex<HashMap<String, (NewEvent, bool)>>,
    }

    impl ReservingCalendar {
        fn cancel(&self, event_id: &str) {
            if let Some((_, cancelled)) = self.events.lock().unwrap().get_mut(event_id) {
                *cancelled = true;
            }
        }

        fn live_events(&self) -> usize {
            self.events
                .lock()
                .unwrap()
                .values()
                .filter(|(_, cancelled)| !cancelled)
                .count()
        }

        fn only_event_id(&self) -> String {
            let events = self.events.lock().unwrap();
            assert_eq!(events.len(), 1);
            events.keys().next().unwrap().clone()
        }
    }

    #[async_trait]
    impl CalendarBackend for ReservingCalendar {
        async fn busy_intervals(&self, _query: &BusyQuery) -> TurnoResult<Vec<BusyInterval>> {
            Ok(self
                .events
                .lock()
                .unwrap()
                .values()
                .filter(|(_, cancelled)| !cancelled)
                .map(|(event, _)| BusyInterval::new(event.start, event.end))
                .collect())
        }

        async fn create_event(&self, event: &NewEvent) -> TurnoResult<()> {
            let mut events = self.events.lock().unwrap();
            if let Some((stored, cancelled)) = events.get_mut(&event.event_id) {
                if !*cancelled {
                    return Err(TurnoError::DuplicateEvent(event.event_id.clone()));
                }
                *stored = event.clone();
                *cancelled = false;
                return Ok(());
            }
            events.insert(event.event_id.clone(), (event.clone(), false));
            Ok(())
        }
    }

    fn service(config: BookingConfig, calendar: Arc<FakeCalendar>) -> BookingService {
        BookingService::new(config, calendar).unwrap()
    }

    /// Sunday before the test Monday, so the notice window never interferes
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 14, 12, 0, 0).unwrap()
    }

    /// 10:00-10:30 in Buenos Aires on Monday 2024-01-15
    fn ten_to_half_past() -> BusyInterval {
        BusyInterval::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 13, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 13, 30, 0).unwrap(),
        )
    }

    fn request(time: &str) -> BookingRequest {
        BookingRequest {
            date: "2024-01-15".to_string(),
            time: time.to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            reason: "Chat".to_string(),
        }
    }

    fn availability(slots: &[TimeSlot], time: &str) -> bool {
        slots.iter().find(|s| s.time == time).map(|s| s.available).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = BookingConfig {
            work_start_hour: 10,
            work_end_hour: 10,
            ..BookingConfig::default()
        };
        let calendar = FakeCalendar::new(Busy::Intervals(vec![]), Create::Succeeds);
        assert!(matches!(
            BookingService::new(config, calendar),
            Err(TurnoError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_available_slots_queries_one_local_day() {
        let calendar = FakeCalendar::new(Busy::Intervals(vec![ten_to_half_past()]), Create::Succeeds);
        let service = service(BookingConfig::default(), calendar.clone());

        let slots = service.available_slots("2024-01-15", now()).await.unwrap();
        assert_eq!(slots.len(), 18);
        assert!(!availability(&slots, "09:30"));
        assert!(availability(&slots, "10:30"));

        let queries = calendar.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].calendar_id, "primary");
        assert_eq!(queries[0].time_zone, chrono_tz::America::Argentina::Buenos_Aires);
        assert_eq!(
            queries[0].time_min,
            Utc.with_ymd_and_hms(2024, 1, 15, 3, 0, 0).unwrap()
        );
        assert_eq!(
            queries[0].time_max,
            Utc.with_ymd_and_hms(2024, 1, 16, 3, 0, 0).unwrap() - Duration::milliseconds(1)
        );
    }

    #[tokio::test]
    async fn test_available_slots_rejects_malformed_date() {
        let calendar = FakeCalendar::new(Busy::Intervals(vec![]), Create::Succeeds);
        let service = service(BookingConfig::default(), calendar.clone());

        let err = service.available_slots("2024/01/15", now()).await.unwrap_err();
        assert!(matches!(err, TurnoError::InvalidDate(_)));
        assert!(calendar.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_fails_open() {
        let calendar = FakeCalendar::new(Busy::Fails, Create::Succeeds);
        let service = service(BookingConfig::default(), calendar);

        let slots = service.available_slots("2024-01-15", now()).await.unwrap();
        assert_eq!(slots.len(), 18);
        // Everything but the slot that runs past 18:00
        assert_eq!(slots.iter().filter(|s| s.available).count(), 17);
        assert!(!availability(&slots, "17:30"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout_fails_open() {
        let calendar = FakeCalendar::new(Busy::Hangs, Create::Succeeds);
        let service = service(BookingConfig::default(), calendar);

        let slots = service.available_slots("2024-01-15", now()).await.unwrap();
        assert_eq!(slots.iter().filter(|s| s.available).count(), 17);
    }

    #[tokio::test]
    async fn test_read_failure_fail_closed() {
        let config = BookingConfig {
            read_failure: ReadFailurePolicy::FailClosed,
            ..BookingConfig::default()
        };
        let calendar = FakeCalendar::new(Busy::Fails, Create::Succeeds);
        let service = service(config, calendar);

        let err = service.available_slots("2024-01-15", now()).await.unwrap_err();
        assert!(matches!(err, TurnoError::CalendarUnavailable(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_create_booking_success() {
        let calendar = FakeCalendar::new(Busy::Intervals(vec![ten_to_half_past()]), Create::Succeeds);
        let service = service(BookingConfig::default(), calendar.clone());

        let result = service.create_booking(&request("10:30"), now()).await.unwrap();
        assert_eq!(result, BookingResult::success());
        assert!(result.error_detail.is_none());

        let created = calendar.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].summary, "Meeting with Ada");
        assert_eq!(
            created[0].start,
            Utc.with_ymd_and_hms(2024, 1, 15, 13, 30, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_create_booking_failure_is_generic() {
        let calendar = FakeCalendar::new(Busy::Intervals(vec![]), Create::Fails);
        let service = service(BookingConfig::default(), calendar);

        let result = service.create_booking(&request("10:30"), now()).await.unwrap();
        assert!(!result.success);
        let detail = result.error_detail.unwrap();
        assert_eq!(detail, GENERIC_FAILURE);
        assert!(!detail.contains("secret"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_booking_timeout_is_failure() {
        let calendar = FakeCalendar::new(Busy::Intervals(vec![]), Create::Hangs);
        let service = service(BookingConfig::default(), calendar);

        let result = service.create_booking(&request("10:30"), now()).await.unwrap();
        assert_eq!(result, BookingResult::failure(GENERIC_FAILURE));
    }

    #[tokio::test]
    async fn test_create_booking_replay_is_success() {
        let calendar = FakeCalendar::new(Busy::Intervals(vec![]), Create::Duplicate);
        let service = service(BookingConfig::default(), calendar);

        let result = service.create_booking(&request("10:30"), now()).await.unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_rebooking_a_cancelled_meeting_creates_a_live_event() {
        let calendar = Arc::new(ReservingCalendar::default());
        let service = BookingService::new(BookingConfig::default(), calendar.clone()).unwrap();

        let first = service.create_booking(&request("10:30"), now()).await.unwrap();
        assert!(first.success);
        assert_eq!(calendar.live_events(), 1);

        calendar.cancel(&calendar.only_event_id());
        assert_eq!(calendar.live_events(), 0);

        let slots = service.available_slots("2024-01-15", now()).await.unwrap();
        assert!(availability(&slots, "10:30"));

        let again = service.create_booking(&request("10:30"), now()).await.unwrap();
        assert!(again.success);
        assert_eq!(calendar.live_events(), 1);
    }

    #[tokio::test]
    async fn test_replay_of_live_booking() {
        let calendar = Arc::new(ReservingCalendar::default());
        let service = BookingService::new(BookingConfig::default(), calendar.clone()).unwrap();

        assert!(service.create_booking(&request("10:30"), now()).await.unwrap().success);

        // The re-check sees the first booking's own event
        let replay = service.create_booking(&request("10:30"), now()).await.unwrap();
        assert_eq!(replay, BookingResult::failure(SLOT_TAKEN));

        let config = BookingConfig {
            recheck_before_booking: false,
            ..BookingConfig::default()
        };
        let service = BookingService::new(config, calendar.clone()).unwrap();
        let replay = service.create_booking(&request("10:30"), now()).await.unwrap();
        assert!(replay.success);
        assert_eq!(calendar.live_events(), 1);
    }

    #[tokio::test]
    async fn test_create_booking_rechecks_slot() {
        let calendar = FakeCalendar::new(Busy::Intervals(vec![ten_to_half_past()]), Create::Succeeds);
        let service = service(BookingConfig::default(), calendar.clone());

        let result = service.create_booking(&request("09:30"), now()).await.unwrap();
        assert_eq!(result, BookingResult::failure(SLOT_TAKEN));

        // Off-grid times aren't slots at all
        let result = service.create_booking(&request("10:15"), now()).await.unwrap();
        assert_eq!(result, BookingResult::failure(SLOT_TAKEN));

        assert!(calendar.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_booking_without_recheck_writes_directly() {
        let config = BookingConfig {
            recheck_before_booking: false,
            ..BookingConfig::default()
        };
        let calendar = FakeCalendar::new(Busy::Intervals(vec![ten_to_half_past()]), Create::Succeeds);
        let service = service(config, calendar.clone());

        let result = service.create_booking(&request("09:30"), now()).await.unwrap();
        assert!(result.success);
        assert!(calendar.queries.lock().unwrap().is_empty());
        assert_eq!(calendar.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_booking_recheck_fails_open() {
        let calendar = FakeCalendar::new(Busy::Fails, Create::Succeeds);
        let service = service(BookingConfig::default(), calendar.clone());

        let result = service.create_booking(&request("10:30"), now()).await.unwrap();
        assert!(result.success);
        assert_eq!(calendar.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_booking_recheck_fail_closed() {
        let config = BookingConfig {
            read_failure: ReadFailurePolicy::FailClosed,
            ..BookingConfig::default()
        };
        let calendar = FakeCalendar::new(Busy::Fails, Create::Succeeds);
        let service = service(config, calendar.clone());

        let result = service.create_booking(&request("10:30"), now()).await.unwrap();
        assert_eq!(result, BookingResult::failure(GENERIC_FAILURE));
        assert!(calendar.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_booking_invalid_input_is_error() {
        let calendar = FakeCalendar::new(Busy::Intervals(vec![]), Create::Succeeds);
        let service = service(BookingConfig::default(), calendar.clone());

        let mut req = request("10:30");
        req.time = "25:00".to_string();
        assert!(matches!(
            service.create_booking(&req, now()).await,
            Err(TurnoError::InvalidTime(_))
        ));

        let mut req = request("10:30");
        req.email = "not-an-email".to_string();
        assert!(matches!(
            service.create_booking(&req, now()).await,
            Err(TurnoError::InvalidRequest(_))
        ));

        assert!(calendar.queries.lock().unwrap().is_empty());
        assert!(calendar.created.lock().unwrap().is_empty());
    }
}
