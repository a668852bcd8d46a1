// Hate speech handlers.
//
// POST /ia/hate_speech/detect  — boolean verdict
// POST /ia/hate_speech/analyze — full analysis report
//
// Both take `{"text": "..."}` with 1 to 5000 characters. Length violations
// are rejected with 422; whitespace-only text passes validation and gets the
// service's structured `success: false` answer.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::web::{api_error, AppState};

/// Longest text accepted for hate speech analysis, in characters.
pub const MAX_TEXT_CHARS: u64 = 5000;

#[derive(Debug, Deserialize, Validate)]
pub struct HateSpeechRequest {
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
}

/// POST /ia/hate_speech/detect
pub async fn detect(State(state): State<AppState>, Json(body): Json<HateSpeechRequest>) -> Response {
    if let Err(e) = body.validate() {
        return api_error(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string());
    }
    info!(text_len = body.text.chars().count(), "Detection request received");

    Json(state.service.detect(&body.text).await).into_response()
}

/// POST /ia/hate_speech/analyze
pub async fn analyze(State(state): State<AppState>, Json(body): Json<HateSpeechRequest>) -> Response {
    if let Err(e) = body.validate() {
        return api_error(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string());
    }
    info!(text_len = body.text.chars().count(), "Analysis request received");

    Json(state.service.analyze(&body.text).await).into_response()
}
