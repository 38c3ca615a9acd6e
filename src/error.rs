//! Request-scoped error taxonomy.
//!
//! Every failure is scoped to a single request and serializes as an
//! `{"error": "..."}` payload. Only a missing/empty question field maps to
//! HTTP 400; every pipeline failure is delivered with HTTP 200 and callers
//! must inspect the body.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizError {
  #[error("please provide a non-empty 'question' field in the request body")]
  MissingQuestion,

  #[error("unsupported language: the question's language could not be detected")]
  UnknownLanguage,

  #[error("invalid question detected: it is personal, incomplete, or not answerable")]
  InvalidQuestion,

  #[error("the model returned an empty response")]
  EmptyCompletion,

  #[error("failed to generate a correct answer after {attempts} attempts")]
  NoCorrectAnswer { attempts: u32 },

  #[error("unable to generate enough distractors even after regeneration (got {got} of 3)")]
  NotEnoughDistractors { got: usize },

  #[error("quiz generation is not configured: GROQ_API_KEY is missing")]
  Unavailable,

  #[error("model request failed: {0}")]
  Upstream(String),
}

impl QuizError {
  /// HTTP status carried by the error payload.
  pub fn status_code(&self) -> StatusCode {
    match self {
      QuizError::MissingQuestion => StatusCode::BAD_REQUEST,
      _ => StatusCode::OK,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_the_missing_field_maps_to_http_400() {
    assert_eq!(QuizError::MissingQuestion.status_code(), StatusCode::BAD_REQUEST);
    for e in [
      QuizError::UnknownLanguage,
      QuizError::InvalidQuestion,
      QuizError::EmptyCompletion,
      QuizError::NoCorrectAnswer { attempts: 3 },
      QuizError::NotEnoughDistractors { got: 1 },
      QuizError::Unavailable,
      QuizError::Upstream("HTTP 500".into()),
    ] {
      assert_eq!(e.status_code(), StatusCode::OK, "{e}");
    }
  }

  #[test]
  fn messages_are_human_readable() {
    let e = QuizError::NotEnoughDistractors { got: 2 };
    assert!(e.to_string().contains("2 of 3"));
    let e = QuizError::NoCorrectAnswer { attempts: 3 };
    assert!(e.to_string().contains("3 attempts"));
  }
}
