//! API route handlers.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::models::{HealthResponse, PredictRequest, PredictResponse};
use crate::state::AppState;

/// POST /predict - Classify a URL.
pub async fn predict(
    State(state): State<AppState>,
    body: std::result::Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    debug!(url_len = req.url.as_ref().map(|u| u.len()), "Checking URL");

    let start = Instant::now();
    let verdict = state.pipeline.classify_field(req.url.as_deref())?;

    info!(
        prediction = %verdict.label,
        confidence = verdict.confidence,
        source = ?verdict.source,
        rule = verdict.rule.map(|r| r.name()),
        latency_us = start.elapsed().as_micros() as u64,
        "URL classified"
    );

    Ok(Json(verdict.into()))
}

/// GET /health - Report liveness and the loaded model.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        classifier: state.pipeline.model_name(),
        model: state.model_info.as_deref().cloned(),
    })
}
