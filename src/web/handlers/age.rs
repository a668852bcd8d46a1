// POST /ia/age_classification — minimum recommended age for a text.
//
// Responds `{"rating": "12+"}`. Blank text is rejected with 422; model
// failures never surface here because the estimator falls back on its own.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::error::ModerationError;
use crate::web::{api_error, AppState};

#[derive(Debug, Deserialize)]
pub struct AgeRatingRequest {
    pub text: String,
}

pub async fn classify_age(State(state): State<AppState>, Json(body): Json<AgeRatingRequest>) -> Response {
    match state.service.classify_age(&body.text).await {
        Ok(rating) => Json(rating).into_response(),
        Err(e @ (ModerationError::EmptyText | ModerationError::InvalidRating(_))) => {
            api_error(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "Age classification failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
