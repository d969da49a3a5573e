//! Booking endpoint

use axum::{Json, Router, extract::State, routing::post};
use chrono::Utc;
use turno_core::{BookingRequest, BookingResult};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/bookings", post(create_booking))
}

/// POST /bookings - Book a slot
///
/// Calendar-side failures come back as `200 {"success": false, ...}`; only
/// malformed requests are HTTP errors.
async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<BookingResult>, AppError> {
    let result = state
        .service()
        .create_booking(&request, Utc::now())
        .await?;

    Ok(Json(result))
}
