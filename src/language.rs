//! Language detection and choice-label alphabets.
//!
//! Detection is local (whatlang), never a network call. A `None` from
//! `detect_language` short-circuits the whole pipeline: we refuse to
//! generate quizzes for text we cannot attribute to a language.

use whatlang::Lang;

/// Best-effort language tag for the question text.
pub fn detect_language(text: &str) -> Option<&'static str> {
  whatlang::detect(text).map(|info| short_tag(info.lang()))
}

/// Two-letter tags for the languages the label table knows about;
/// ISO 639-3 for the long tail (which all fall back to Latin labels anyway).
fn short_tag(lang: Lang) -> &'static str {
  match lang {
    Lang::Eng => "en",
    Lang::Ara => "ar",
    Lang::Spa => "es",
    Lang::Fra => "fr",
    Lang::Deu => "de",
    Lang::Ita => "it",
    other => other.code(),
  }
}

/// Ordered choice labels for a detected language tag.
/// Arabic gets its own alphabet; everything else defaults to Latin A-D.
pub fn label_alphabet(lang: &str) -> [&'static str; 4] {
  match lang {
    "ar" => ["أ", "ب", "ج", "د"],
    _ => ["A", "B", "C", "D"],
  }
}
