//! Quizgen · Multiple-Choice Quiz Backend
//!
//! - Axum HTTP API with a single generation endpoint
//! - Groq chat-completions integration (via environment variables)
//!
//! Important env variables:
//!   PORT                : u16 (default 5001)
//!   GROQ_API_KEY        : enables quiz generation if present
//!   GROQ_BASE_URL       : default "https://api.groq.com/openai/v1"
//!   GROQ_MODEL          : default "meta-llama/llama-4-scout-17b-16e-instruct"
//!   QUIZGEN_CONFIG_PATH : path to TOML config (prompt overrides)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod config;
mod error;
mod language;
mod parse;
mod groq;
mod quiz;
mod protocol;
mod state;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (prompts + optional Groq client).
  let state = Arc::new(AppState::new());

  // HTTP router with routes, CORS and tracing layers.
  let app = build_router(state);

  // Read port from env or default to 5001.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 5001)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "quizgen_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
