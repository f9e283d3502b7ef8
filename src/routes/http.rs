//! HTTP endpoint handlers. Thin wrappers around the shared state; the game
//! itself only runs over WebSocket.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::protocol::{ClearScoresOut, HealthOut, ScoresOut};
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_scores(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let scores = state.scores().await;
  info!(target: "square_detective", count = scores.len(), "HTTP scores served");
  Json(ScoresOut { scores })
}

#[instrument(level = "info", skip(state))]
pub async fn http_clear_scores(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  state.clear_scores().await;
  Json(ClearScoresOut { cleared: true })
}
