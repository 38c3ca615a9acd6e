//! The generation pipeline, strictly linear per request:
//!
//!   classify -> detect language -> generate -> parse -> repair-if-needed
//!   -> shuffle -> label -> quiz item
//!
//! Both repair paths (missing correct answer, short distractor set) run
//! through one retry-with-budget helper parameterized by an acceptance
//! predicate. Worst case per request: 1 classification + 1 generation +
//! 3 + 3 repair calls; language detection is local.

use std::collections::BTreeMap;
use std::future::Future;

use rand::seq::SliceRandom;
use tracing::{info, instrument, warn};

use crate::config::Prompts;
use crate::error::QuizError;
use crate::groq::Groq;
use crate::language::{detect_language, label_alphabet};
use crate::parse::{clean_choice, parse_mcq, split_distractors};
use crate::state::AppState;

/// Exactly this many distractors accompany the correct answer.
pub const DISTRACTOR_TARGET: usize = 3;
/// Attempts allowed per repair path. No backoff, no retries elsewhere.
pub const REPAIR_BUDGET: u32 = 3;

/// Fully assembled quiz item, ready for serialization.
#[derive(Debug)]
pub struct QuizItem {
  pub question: String,
  pub choices: BTreeMap<String, String>,
  pub correct_label: String,
}

/// Thread `state` through up to `budget` attempts, stopping as soon as
/// `accept` holds. The final state is returned either way; the caller
/// decides what a spent budget means.
pub async fn retry_with_budget<S, F, Fut, P>(
  budget: u32,
  mut state: S,
  accept: P,
  mut attempt: F,
) -> S
where
  F: FnMut(u32, S) -> Fut,
  Fut: Future<Output = S>,
  P: Fn(&S) -> bool,
{
  for n in 1..=budget {
    if accept(&state) {
      break;
    }
    state = attempt(n, state).await;
  }
  state
}

/// Run the whole pipeline for one question.
#[instrument(level = "info", skip(state, question), fields(question_len = question.len()))]
pub async fn generate_quiz(state: &AppState, question: &str) -> Result<QuizItem, QuizError> {
  let groq = state.groq.as_ref().ok_or(QuizError::Unavailable)?;
  let prompts = &state.prompts;

  // Fail-open classifier: a transport or parsing failure must not block
  // generation; only an explicit "invalid" verdict does.
  match groq.is_invalid_question(prompts, question).await {
    Ok(true) => {
      info!(target: "quiz", "question rejected by validity classifier");
      return Err(QuizError::InvalidQuestion);
    }
    Ok(false) => {}
    Err(e) => {
      warn!(target: "quiz", error = %e, "validity classification failed; treating question as valid")
    }
  }

  // Local detection; unknown language aborts before any generation call.
  let lang = detect_language(question).ok_or(QuizError::UnknownLanguage)?;
  info!(target: "quiz", %lang, "language detected");

  let completion = groq.generate_mcq(prompts, question).await?;
  if completion.is_empty() {
    return Err(QuizError::EmptyCompletion);
  }
  let draft = parse_mcq(&completion, question);
  info!(
    target: "quiz",
    has_correct = draft.correct_answer.is_some(),
    distractors = draft.distractors.len(),
    "MCQ completion parsed"
  );

  let correct_answer = match draft.correct_answer {
    Some(a) => a,
    None => repair_correct_answer(groq, prompts, &draft.question).await?,
  };

  // Draft distractors were already deduplicated against the draft's own
  // correct answer; re-filter in case the answer came from a repair call.
  let mut distractors = draft.distractors;
  distractors.retain(|d| d != &correct_answer);
  if distractors.len() != DISTRACTOR_TARGET {
    distractors =
      repair_distractors(groq, prompts, &draft.question, &correct_answer, distractors).await;
    distractors.truncate(DISTRACTOR_TARGET);
    if distractors.len() < DISTRACTOR_TARGET {
      return Err(QuizError::NotEnoughDistractors { got: distractors.len() });
    }
  }

  Ok(assemble(draft.question, correct_answer, distractors, lang))
}

/// Up to REPAIR_BUDGET fresh single-answer prompts; first non-empty cleaned
/// completion wins. All attempts empty fails the request.
async fn repair_correct_answer(
  groq: &Groq,
  prompts: &Prompts,
  question: &str,
) -> Result<String, QuizError> {
  let seeded: Option<String> = None;
  let outcome = retry_with_budget(
    REPAIR_BUDGET,
    seeded,
    |found: &Option<String>| found.is_some(),
    |attempt, found| async move {
      match groq.regenerate_correct_answer(prompts, question).await {
        Ok(text) => {
          let cleaned = clean_choice(&text);
          if cleaned.is_empty() {
            warn!(target: "quiz", attempt, "correct-answer regeneration returned empty text");
            found
          } else {
            Some(cleaned)
          }
        }
        Err(e) => {
          warn!(target: "quiz", attempt, error = %e, "correct-answer regeneration failed");
          found
        }
      }
    },
  )
  .await;

  outcome.ok_or(QuizError::NoCorrectAnswer { attempts: REPAIR_BUDGET })
}

/// Up to REPAIR_BUDGET rounds, each asking only for the still-missing count
/// and excluding everything we already hold. Accumulates novel distractors
/// across rounds; stops early at the target.
async fn repair_distractors(
  groq: &Groq,
  prompts: &Prompts,
  question: &str,
  correct: &str,
  held: Vec<String>,
) -> Vec<String> {
  retry_with_budget(
    REPAIR_BUDGET,
    held,
    |held: &Vec<String>| held.len() >= DISTRACTOR_TARGET,
    |attempt, mut held| async move {
      let needed = DISTRACTOR_TARGET - held.len();
      match groq.regenerate_distractors(prompts, question, correct, &held, needed).await {
        Ok(text) => {
          let stripped = text.replace("Distractors:", "");
          for d in split_distractors(stripped.trim()) {
            let d = clean_choice(&d);
            if d.is_empty() || d == correct || held.iter().any(|h| h == &d) {
              continue;
            }
            held.push(d);
          }
          info!(target: "quiz", attempt, total = held.len(), "distractor repair round done");
        }
        Err(e) => {
          warn!(target: "quiz", attempt, error = %e, "distractor regeneration failed");
        }
      }
      held
    },
  )
  .await
}

/// Shuffle correct + distractors uniformly, then assign labels by position
/// from the language alphabet. The correct label is found by value equality,
/// which is safe because the four choices are distinct by construction.
fn assemble(
  question: String,
  correct: String,
  distractors: Vec<String>,
  lang: &str,
) -> QuizItem {
  let mut pool: Vec<String> = Vec::with_capacity(1 + distractors.len());
  pool.push(correct.clone());
  pool.extend(distractors);
  pool.shuffle(&mut rand::thread_rng());

  let labels = label_alphabet(lang);
  let mut choices = BTreeMap::new();
  let mut correct_label = String::new();
  for (label, choice) in labels.iter().zip(pool) {
    if choice == correct {
      correct_label = (*label).to_string();
    }
    choices.insert((*label).to_string(), choice);
  }

  QuizItem { question, choices, correct_label }
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  use axum::{extract::State, routing::post, Json, Router};

  type StubState = (Arc<Vec<String>>, Arc<AtomicUsize>);

  async fn stub_completion(State((replies, calls)): State<StubState>) -> Json<serde_json::Value> {
    let n = calls.fetch_add(1, Ordering::SeqCst);
    let content = replies.get(n).cloned().unwrap_or_default();
    Json(serde_json::json!({
      "choices": [{"message": {"content": content}}]
    }))
  }

  /// Serve canned completions, one per call, on an ephemeral local port.
  /// Returns the base URL and the call counter.
  async fn spawn_stub(replies: &[&str]) -> (String, Arc<AtomicUsize>) {
    let replies: Arc<Vec<String>> = Arc::new(replies.iter().map(|s| s.to_string()).collect());
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
      .route("/chat/completions", post(stub_completion))
      .with_state((replies, calls.clone()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
      axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}"), calls)
  }

  fn stub_state(base_url: String) -> AppState {
    let groq = Groq {
      client: reqwest::Client::new(),
      api_key: "test-key".into(),
      base_url,
      model: "stub-model".into(),
    };
    AppState { groq: Some(groq), prompts: Prompts::default() }
  }

  const QUESTION: &str = "What is the capital of France?";

  #[tokio::test]
  async fn short_distractor_set_triggers_repair_and_completes_at_three() {
    // Generation yields two distractors; the repair round echoes the correct
    // answer and a duplicate, plus one novel entry. Exactly 3 must survive.
    let (base_url, calls) = spawn_stub(&[
      "False",
      "Question: What is the capital of France?\nCorrect Answer: Paris\nDistractors: Lyon, Marseille",
      "Distractors: Paris, Lyon, Toulouse",
    ])
    .await;
    let state = stub_state(base_url);

    let item = generate_quiz(&state, QUESTION).await.expect("quiz");
    assert_eq!(item.choices.len(), 4);
    assert_eq!(item.choices[&item.correct_label], "Paris");
    let mut values: Vec<&String> = item.choices.values().collect();
    values.sort();
    values.dedup();
    assert_eq!(values.len(), 4);
    // classifier + generation + a single repair round (early stop at 3)
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn failed_repair_reports_an_error_never_one_or_two_distractors() {
    // Repair rounds return nothing usable: the request must fail with the
    // held count, not succeed with a short choice set.
    let (base_url, calls) = spawn_stub(&[
      "False",
      "Question: What is the capital of France?\nCorrect Answer: Paris\nDistractors: Lyon, Marseille",
      "",
      "",
      "",
    ])
    .await;
    let state = stub_state(base_url);

    let err = generate_quiz(&state, QUESTION).await.expect_err("must fail");
    assert!(
      matches!(err, QuizError::NotEnoughDistractors { got: 2 }),
      "unexpected outcome: {err}"
    );
    // classifier + generation + the full repair budget
    assert_eq!(calls.load(Ordering::SeqCst), 2 + REPAIR_BUDGET as usize);
  }

  #[tokio::test]
  async fn repaired_correct_answer_is_refiltered_out_of_the_distractors() {
    // No "Correct Answer:" line, and the repaired answer ("Paris") also sits
    // in the parsed distractors. It must be filtered back out, leaving a
    // short set that a distractor repair then fills.
    let (base_url, calls) = spawn_stub(&[
      "False",
      "Question: What is the capital of France?\nDistractors: Paris, Lyon, Marseille",
      "Paris",
      "Distractors: Toulouse",
    ])
    .await;
    let state = stub_state(base_url);

    let item = generate_quiz(&state, QUESTION).await.expect("quiz");
    assert_eq!(item.choices.len(), 4);
    assert_eq!(item.choices[&item.correct_label], "Paris");
    assert_eq!(item.choices.values().filter(|c| c.as_str() == "Paris").count(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
  }

  #[tokio::test]
  async fn empty_correct_answer_repairs_exhaust_the_budget_then_fail() {
    let (base_url, calls) = spawn_stub(&[
      "False",
      "Question: What is the capital of France?\nDistractors: Lyon, Marseille, Toulouse",
      "",
      "",
      "",
    ])
    .await;
    let state = stub_state(base_url);

    let err = generate_quiz(&state, QUESTION).await.expect_err("must fail");
    assert!(
      matches!(err, QuizError::NoCorrectAnswer { attempts: REPAIR_BUDGET }),
      "unexpected outcome: {err}"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2 + REPAIR_BUDGET as usize);
  }

  #[tokio::test]
  async fn rejected_question_never_reaches_the_generator() {
    let (base_url, calls) = spawn_stub(&["True"]).await;
    let state = stub_state(base_url);

    let err = generate_quiz(&state, QUESTION).await.expect_err("must fail");
    assert!(matches!(err, QuizError::InvalidQuestion), "unexpected outcome: {err}");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  fn distractors() -> Vec<String> {
    vec!["Lyon".to_string(), "Marseille".to_string(), "Toulouse".to_string()]
  }

  #[test]
  fn assembled_item_has_four_distinct_labeled_choices() {
    let item = assemble("Capital of France?".into(), "Paris".into(), distractors(), "en");
    assert_eq!(item.choices.len(), 4);
    let mut values: Vec<&String> = item.choices.values().collect();
    values.sort();
    values.dedup();
    assert_eq!(values.len(), 4);
    for label in ["A", "B", "C", "D"] {
      assert!(item.choices.contains_key(label), "missing label {label}");
    }
  }

  #[test]
  fn correct_label_always_resolves_to_the_correct_answer() {
    // Labels are assigned after shuffling, so exercise many permutations.
    for _ in 0..200 {
      let item = assemble("Capital of France?".into(), "Paris".into(), distractors(), "en");
      assert_eq!(item.choices[&item.correct_label], "Paris");
    }
  }

  #[test]
  fn arabic_questions_get_arabic_labels() {
    let ds = vec!["دمشق".to_string(), "بيروت".to_string(), "عمان".to_string()];
    let item = assemble("ما هي عاصمة فرنسا؟".into(), "باريس".into(), ds, "ar");
    for label in ["أ", "ب", "ج", "د"] {
      assert!(item.choices.contains_key(label), "missing label {label}");
    }
    assert_eq!(item.choices[&item.correct_label], "باريس");
  }

  #[tokio::test]
  async fn retry_stops_at_first_acceptance() {
    let trace = retry_with_budget(
      5,
      Vec::<u32>::new(),
      |t: &Vec<u32>| t.len() >= 2,
      |n, mut t| async move {
        t.push(n);
        t
      },
    )
    .await;
    assert_eq!(trace, vec![1, 2]);
  }

  #[tokio::test]
  async fn retry_skips_attempts_when_already_accepted() {
    let trace = retry_with_budget(
      3,
      vec![0u32],
      |t: &Vec<u32>| !t.is_empty(),
      |n, mut t| async move {
        t.push(n);
        t
      },
    )
    .await;
    assert_eq!(trace, vec![0]);
  }

  #[tokio::test]
  async fn retry_spends_the_whole_budget_without_acceptance() {
    let trace = retry_with_budget(
      3,
      Vec::<u32>::new(),
      |_: &Vec<u32>| false,
      |n, mut t| async move {
        t.push(n);
        t
      },
    )
    .await;
    assert_eq!(trace, vec![1, 2, 3]);
  }
}
