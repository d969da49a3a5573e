//! Slot listing endpoint

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use turno_core::TimeSlot;

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/availability", get(list_slots))
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    /// `YYYY-MM-DD`, interpreted in the business timezone
    pub date: String,
}

/// GET /availability?date=YYYY-MM-DD - Every candidate slot of the day with its availability
async fn list_slots(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<TimeSlot>>, AppError> {
    let slots = state
        .service()
        .available_slots(&query.date, Utc::now())
        .await?;

    Ok(Json(slots))
}
