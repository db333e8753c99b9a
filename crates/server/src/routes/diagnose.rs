//! `POST /api/diagnose`.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use chrono::SecondsFormat;
use instadiag_core::rate_limit::UNKNOWN_IP;
use instadiag_core::{DiagnosisKey, Error, Mode, RateDecision};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Access log endpoint name for this route.
pub const ENDPOINT: &str = "diagnose";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseRequest {
    pub username: Option<String>,
    /// mild, medium or spicy (default medium).
    pub mode: Option<String>,
    pub competitor_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseResponse {
    pub result: String,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// First `X-Forwarded-For` hop, or the shared unknown bucket.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_IP)
        .to_string()
}

pub async fn diagnose(
    State(state): State<Arc<AppState>>, headers: HeaderMap, payload: Result<Json<DiagnoseRequest>, JsonRejection>,
) -> Result<Json<DiagnoseResponse>, ApiError> {
    let ip = client_ip(&headers);
    if let RateDecision::Denied { retry_after } = state.limiter.check_and_record(&ip, ENDPOINT).await {
        return Err(Error::RateLimited { retry_after_secs: retry_after.as_secs() }.into());
    }

    let Json(req) = payload.map_err(|e| Error::InvalidInput(format!("invalid request body: {}", e.body_text())))?;

    let username = req
        .username
        .as_deref()
        .ok_or_else(|| Error::InvalidInput("username is required".into()))?;
    let mode = match req.mode.as_deref() {
        Some(raw) => raw.parse::<Mode>()?,
        None => Mode::default(),
    };
    let key = DiagnosisKey::new(username, mode, req.competitor_id.as_deref())?;

    tracing::info!(
        ip = %ip, username = %key.username, mode = %key.mode, competitor = ?key.competitor,
        "diagnosis requested"
    );

    let work = state.gate.get_or_create(&key, || state.pipeline.run(&key));
    let diagnosis = tokio::time::timeout(state.request_timeout, work)
        .await
        .map_err(|_| Error::UpstreamTimeout(format!("diagnosis exceeded {:?}", state.request_timeout)))??;

    Ok(Json(DiagnoseResponse {
        result: diagnosis.result,
        cached: diagnosis.cached,
        created_at: diagnosis
            .created_at
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    }))
}
