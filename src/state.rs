//! Application state: prompts and the optional Groq client.
//!
//! The service is stateless per request; this struct only carries read-only
//! shared configuration. The API credential is injected here at construction
//! and never read from a module-level constant.

use tracing::{info, instrument};

use crate::config::{load_service_config_from_env, Prompts};
use crate::groq::Groq;

#[derive(Clone)]
pub struct AppState {
    pub groq: Option<Groq>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load prompt overrides, init the Groq client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let prompts = load_service_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();

        let groq = Groq::from_env();
        if let Some(g) = &groq {
            info!(target: "quizgen_backend", base_url = %g.base_url, model = %g.model, "Groq enabled.");
        } else {
            info!(
                target: "quizgen_backend",
                "Groq disabled (no GROQ_API_KEY). Generation requests will return an error payload."
            );
        }

        Self { groq, prompts }
    }
}
