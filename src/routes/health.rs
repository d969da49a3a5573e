use axum::{Router, routing::get};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// GET /health - Liveness check, never touches the calendar
async fn health() -> &'static str {
    "ok"
}
