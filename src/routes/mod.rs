pub mod availability;
pub mod bookings;
pub mod health;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;
use turno_core::TurnoError;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of every 503; upstream detail only goes to the log
const CALENDAR_UNAVAILABLE: &str = "Calendar is unavailable";

/// Body of any other 5xx
const INTERNAL_ERROR: &str = "Internal server error";

/// Convert anyhow errors to HTTP responses
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<TurnoError>() {
            Some(
                TurnoError::InvalidDate(_)
                | TurnoError::InvalidTime(_)
                | TurnoError::InvalidRequest(_),
            ) => StatusCode::BAD_REQUEST,
            Some(TurnoError::CalendarUnavailable(_) | TurnoError::CalendarTimeout(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match status {
            StatusCode::SERVICE_UNAVAILABLE => CALENDAR_UNAVAILABLE.to_string(),
            s if s.is_server_error() => INTERNAL_ERROR.to_string(),
            _ => self.0.to_string(),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %format!("{:#}", self.0), "request failed");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
