//! Loading service configuration (prompt overrides) from TOML.
//!
//! Every prompt the pipeline sends has a compiled-in default below; a TOML
//! file named by QUIZGEN_CONFIG_PATH may override any of them. Templates use
//! `{key}` placeholders filled by `util::fill_template`.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ServiceConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompts used by the Groq client. Defaults match the behavior of the
/// deployed service; override in TOML if you need to tune tone/strictness.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  // Validity classification
  pub classifier_user_template: String,
  // One-shot MCQ generation
  pub generation_system: String,
  pub generation_user_template: String,
  // Repairs
  pub correct_answer_user_template: String,
  pub distractor_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      classifier_user_template: r#"A question is considered invalid if:
1. It is personal, like asking about one's own name or location (e.g. "What's my name?").
2. It is unclear or ambiguous, such as "What is this?", "Tell me more", or "Explain this.".
3. It is a joke or has no meaningful context, such as "Why did the chicken cross the road?".
4. It is nonsense that does not have an answer.
5. It is incomplete in any part (e.g. "Where is ?" or "old are").
6. It is a rhetorical question used to express confusion or an unclear situation.
7. A human could not understand it for lack of context.

Classify the following question as:
- True -> if it matches any of the invalid types above.
- False -> if it is a valid question that can be used for a quiz.

Question: "{question}"
Response:"#
        .into(),
      generation_system:
        "You generate multiple-choice quiz questions in plain text format, always using the same language as the question."
          .into(),
      generation_user_template: r#"You are a multilingual multiple-choice question generator.
Given the question: "{question}", generate:
1. The correct answer
2. Three incorrect but plausible distractors.

Make sure to only generate one correct answer.
The distractors should be closely related to the correct answer - similar in meaning, structure, or concept - so the quiz taker must consider the choice carefully. Aim for medium to difficult, not impossible.
Return the response in the same language as the question.
The correct answer and the distractors should be short and direct. Do not include explanations or details.
Do not start the distractors with the same two words.
The correct answer and the distractors should be a maximum of 10 words each.

Format the response as:
Question: <question>
Correct Answer: <correct answer>
Distractors: <distractor 1>, <distractor 2>, <distractor 3>"#
        .into(),
      correct_answer_user_template: r#"You are a smart quiz assistant.
Given the question: "{question}", generate the correct answer.

Generate exactly one correct answer with one correct piece of information.
The correct answer should be factual and directly related to the question.
The correct answer should be short and direct. Do not include explanations or details.
The correct answer should be a maximum of 10 words.

Avoid ambiguity.

Return only the correct answer, no distractors."#
        .into(),
      distractor_user_template: r#"You are a smart quiz assistant.

The question is: "{question}"
The correct answer is: "{correct_answer}"
Current distractors are: {held}.

Please generate {needed} additional plausible distractors.
Do not repeat existing distractors or the correct answer.
The distractors should be short and direct. Do not include explanations or details.
Do not start the distractors with the same two words.
The distractors should be a maximum of 10 words each.

Return them in this format:
Distractors: <d1>, <d2>"#
        .into(),
    }
  }
}

/// Attempt to load `ServiceConfig` from QUIZGEN_CONFIG_PATH. On any parsing/IO
/// error, returns None and the compiled-in defaults are used.
pub fn load_service_config_from_env() -> Option<ServiceConfig> {
  let path = std::env::var("QUIZGEN_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<ServiceConfig>(&s) {
      Ok(cfg) => {
        info!(target: "quizgen_backend", %path, "Loaded service config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "quizgen_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "quizgen_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
