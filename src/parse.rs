//! Typed parsing of the fixed plain-text MCQ completion format:
//!
//! ```text
//! Question: <question>
//! Correct Answer: <correct answer>
//! Distractors: <d1>, <d2>, <d3>
//! ```
//!
//! Lines are matched by prefix and may appear in any order; a missing prefix
//! leaves a typed gap (`None` / empty vec) rather than an empty string, so
//! the repair triggers downstream are exact rather than string-shaped.

/// Parse outcome of one generation completion. Possibly incomplete.
#[derive(Debug, Clone)]
pub struct McqDraft {
  pub question: String,
  /// `None` when the `Correct Answer:` line is absent or empty after cleaning.
  pub correct_answer: Option<String>,
  /// Deduplicated, cleaned, and filtered against the correct answer.
  pub distractors: Vec<String>,
}

/// Removes leading `<n>. ` numbering and trims whitespace from a choice.
pub fn clean_choice(raw: &str) -> String {
  let s = raw.trim();
  let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
  if digits > 0 {
    if let Some(rest) = s[digits..].strip_prefix('.') {
      return rest.trim_start().to_string();
    }
  }
  s.to_string()
}

/// Splits a distractor line into individual answers.
/// Accepts the ASCII comma and the Arabic comma `،`; drops empty segments.
pub fn split_distractors(text: &str) -> Vec<String> {
  text
    .split(|c| c == ',' || c == '،')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

/// Cleans numbering, drops stray `Correct Answer:` echoes, removes
/// duplicates, and filters out the correct answer itself.
pub fn tidy_distractors(raw: Vec<String>, correct: Option<&str>) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  for d in raw {
    if d.contains("Correct Answer:") {
      continue;
    }
    let d = clean_choice(&d);
    if d.is_empty() {
      continue;
    }
    if correct.map_or(false, |c| c == d) {
      continue;
    }
    if out.iter().any(|held| held == &d) {
      continue;
    }
    out.push(d);
  }
  out
}

/// Parse one MCQ completion. `fallback_question` is used when the model did
/// not echo a `Question:` line back.
pub fn parse_mcq(completion: &str, fallback_question: &str) -> McqDraft {
  let mut question = fallback_question.trim().to_string();
  let mut correct_answer: Option<String> = None;
  let mut distractors: Vec<String> = Vec::new();

  for line in completion.lines() {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix("Question:") {
      let q = rest.trim();
      if !q.is_empty() {
        question = q.to_string();
      }
    } else if let Some(rest) = line.strip_prefix("Correct Answer:") {
      let cleaned = clean_choice(rest);
      if !cleaned.is_empty() {
        correct_answer = Some(cleaned);
      }
    } else if let Some(rest) = line.strip_prefix("Distractors:") {
      distractors = split_distractors(rest);
    }
  }

  let distractors = tidy_distractors(distractors, correct_answer.as_deref());
  McqDraft { question, correct_answer, distractors }
}
