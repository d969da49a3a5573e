use std::sync::Arc;

use anyhow::Result;
use turno_core::{BookingConfig, BookingService, CalendarBackend};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    service: BookingService,
}

impl AppState {
    pub fn new(config: BookingConfig, backend: Arc<dyn CalendarBackend>) -> Result<Self> {
        let service = BookingService::new(config, backend)?;
        Ok(AppState { service })
    }

    pub fn service(&self) -> &BookingService {
        &self.service
    }
}
