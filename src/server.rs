//! HTTP surface
//!
//! A thin axum shell over the pipeline: one generation route, one
//! liveness probe, permissive CORS for the mobile client. Requests are
//! stateless and independent; the only shared state is the optional
//! Claude client.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::llm::ClaudeClient;
use crate::models::schedule::{GenerateRequest, Schedule};
use crate::pipeline;

#[derive(Clone)]
pub struct AppState {
  pub client: Option<Arc<ClaudeClient>>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
  pub ok: bool,
  pub error: String,
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/generate", post(generate))
    .route("/health", get(health))
    .layer(CorsLayer::permissive())
    .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
  Json(serde_json::json!({"ok": true}))
}

/// The only eager validation is an empty text body; everything else
/// resolves to a schedule through the pipeline's fallback chain.
async fn generate(
  State(state): State<AppState>,
  Json(req): Json<GenerateRequest>,
) -> Result<Json<Schedule>, (StatusCode, Json<ErrorBody>)> {
  if req.text.trim().is_empty() {
    return Err((
      StatusCode::BAD_REQUEST,
      Json(ErrorBody {
        ok: false,
        error: "text is required".to_string(),
      }),
    ));
  }

  let level = req.user.as_ref().map(|u| u.level);
  let schedule = pipeline::generate(state.client.as_deref(), &req.text, level).await;
  tracing::info!(
    mode = %schedule.debug.inferred_mode,
    used_ai = schedule.debug.used_ai,
    total_minutes = schedule.total_minutes,
    "generated schedule"
  );
  Ok(Json(schedule))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
