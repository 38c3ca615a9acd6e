//! Minimal Groq client for our use-cases (OpenAI-compatible wire format).
//!
//! We only call chat.completions and always request plain text. Calls are
//! instrumented and log model names, latencies, and token usage (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::Prompts;
use crate::error::QuizError;
use crate::util::{fill_template, trunc_for_log};

#[derive(Clone)]
pub struct Groq {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl Groq {
  /// Construct the client if we find GROQ_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("GROQ_API_KEY").ok()?;
    let base_url =
      std::env::var("GROQ_BASE_URL").unwrap_or_else(|_| "https://api.groq.com/openai/v1".into());
    let model = std::env::var("GROQ_MODEL")
      .unwrap_or_else(|_| "meta-llama/llama-4-scout-17b-16e-instruct".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// Plain-text chat completion. All pipeline calls go through here.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model, user_len = user.len()))]
  async fn chat_plain(
    &self,
    system: Option<&str>,
    user: &str,
    temperature: f32,
    max_tokens: u32,
  ) -> Result<String, QuizError> {
    let url = format!("{}/chat/completions", self.base_url);
    let mut messages = Vec::with_capacity(2);
    if let Some(s) = system {
      messages.push(ChatMessageReq { role: "system".into(), content: s.into() });
    }
    messages.push(ChatMessageReq { role: "user".into(), content: user.into() });
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages,
      temperature,
      max_tokens,
    };

    let start = std::time::Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "quizgen-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| QuizError::Upstream(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_provider_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      return Err(QuizError::Upstream(format!("HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse =
      res.json().await.map_err(|e| QuizError::Upstream(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(
        prompt_tokens = ?usage.prompt_tokens,
        completion_tokens = ?usage.completion_tokens,
        total_tokens = ?usage.total_tokens,
        elapsed = ?start.elapsed(),
        "Groq usage"
      );
    }
    let text = body.choices.get(0)
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();

    debug!(response_len = text.len(), "Groq completion received");
    Ok(text)
  }

  // --- High-level helpers (prompt-specialized) ---

  /// Ask the model whether a question is unusable for a quiz
  /// (personal, incomplete, nonsensical, unanswerable).
  /// Returns true when the completion contains "true".
  #[instrument(level = "info", skip(self, prompts, question), fields(question_len = question.len()))]
  pub async fn is_invalid_question(
    &self,
    prompts: &Prompts,
    question: &str,
  ) -> Result<bool, QuizError> {
    let user = fill_template(&prompts.classifier_user_template, &[("question", question)]);
    let content = self.chat_plain(None, &user, 0.0, 10).await?;
    Ok(content.to_lowercase().contains("true"))
  }

  /// One-shot MCQ generation. Returns the raw completion text; parsing is
  /// the caller's job (see `parse::parse_mcq`).
  #[instrument(level = "info", skip(self, prompts, question), fields(question_len = question.len()))]
  pub async fn generate_mcq(
    &self,
    prompts: &Prompts,
    question: &str,
  ) -> Result<String, QuizError> {
    let user = fill_template(&prompts.generation_user_template, &[("question", question)]);
    self.chat_plain(Some(&prompts.generation_system), &user, 0.7, 200).await
  }

  /// Fresh single-answer generation, used when the MCQ completion carried
  /// no usable `Correct Answer:` line.
  #[instrument(level = "info", skip(self, prompts, question), fields(question_len = question.len()))]
  pub async fn regenerate_correct_answer(
    &self,
    prompts: &Prompts,
    question: &str,
  ) -> Result<String, QuizError> {
    let user = fill_template(&prompts.correct_answer_user_template, &[("question", question)]);
    self.chat_plain(None, &user, 0.7, 100).await
  }

  /// Request `needed` additional distractors, excluding the correct answer
  /// and every distractor we already hold.
  #[instrument(level = "info", skip(self, prompts, question, correct, held), fields(held = held.len(), needed))]
  pub async fn regenerate_distractors(
    &self,
    prompts: &Prompts,
    question: &str,
    correct: &str,
    held: &[String],
    needed: usize,
  ) -> Result<String, QuizError> {
    let held_joined = held.join(", ");
    let needed_str = needed.to_string();
    let user = fill_template(
      &prompts.distractor_user_template,
      &[
        ("question", question),
        ("correct_answer", correct),
        ("held", &held_joined),
        ("needed", &needed_str),
      ],
    );
    self.chat_plain(None, &user, 0.7, 100).await
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  max_tokens: u32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from a provider error body.
fn extract_provider_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn provider_error_bodies_are_unwrapped() {
    let body = r#"{"error": {"message": "invalid api key", "type": "auth"}}"#;
    assert_eq!(extract_provider_error(body).as_deref(), Some("invalid api key"));
    assert_eq!(extract_provider_error("not json"), None);
  }

  #[test]
  fn request_serializes_to_the_openai_wire_shape() {
    let req = ChatCompletionRequest {
      model: "m".into(),
      messages: vec![ChatMessageReq { role: "user".into(), content: "hi".into() }],
      temperature: 0.7,
      max_tokens: 200,
    };
    let v = serde_json::to_value(&req).expect("serialize");
    assert_eq!(v["model"], "m");
    assert_eq!(v["messages"][0]["role"], "user");
    assert_eq!(v["max_tokens"], 200);
  }
}
