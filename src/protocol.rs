//! Public request/response DTOs for the HTTP endpoint (serde ready).
//! Keep this small and stable so clients can evolve independently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::quiz::QuizItem;

#[derive(Debug, Deserialize)]
pub struct GenerateIn {
    // Option so a missing field becomes our 400 payload instead of a
    // framework deserialization rejection.
    #[serde(default)]
    pub question: Option<String>,
}

/// Success payload: labeled choices plus the label holding the correct answer.
#[derive(Debug, Serialize)]
pub struct QuizOut {
    pub question: String,
    pub choices: BTreeMap<String, String>,
    pub correct_label: String,
}

/// Convert the internal `QuizItem` to the public DTO.
pub fn to_out(item: QuizItem) -> QuizOut {
    QuizOut {
        question: item.question,
        choices: item.choices,
        correct_label: item.correct_label,
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
