//! HTTP endpoint handlers. Thin wrappers that forward to the pipeline.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, response::Response, Json};
use tracing::{info, instrument, warn};

use crate::error::QuizError;
use crate::protocol::{to_out, ErrorOut, GenerateIn, HealthOut};
use crate::quiz::generate_quiz;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateIn>,
) -> Response {
    let question = body.question.unwrap_or_default();
    let question = question.trim();
    if question.is_empty() {
        return error_response(QuizError::MissingQuestion);
    }

    match generate_quiz(&state, question).await {
        Ok(item) => {
            info!(target: "quiz", correct_label = %item.correct_label, "HTTP quiz item served");
            Json(to_out(item)).into_response()
        }
        Err(e) => {
            warn!(target: "quiz", error = %e, "HTTP quiz generation failed");
            error_response(e)
        }
    }
}

fn error_response(e: QuizError) -> Response {
    (e.status_code(), Json(ErrorOut { error: e.to_string() })).into_response()
}
