//! # Aegis Proxy
//!
//! The OpenAI-compatible HTTP surface: `POST /v1/chat/completions` and
//! `GET /health`. Wires the Lens/Shield security middleware around an
//! async-parallel race between the ML guardrail classifier and the
//! upstream LLM call, so the guardrail adds zero latency on the happy
//! path.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          AEGIS PROXY                              │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  POST /v1/chat/completions                                       │
//! │     │                                                             │
//! │     ▼                                                             │
//! │  SecurityMiddleware::process_ingress (Lens + Shield)              │
//! │     │                                                             │
//! │     ├──────────────┬──────────────────────────┐                  │
//! │     ▼              ▼                          │                  │
//! │  guardrail.classify()   forward_to_upstream()  │ race, cancel     │
//! │     │              │                           │ loser on block  │
//! │     └──────┬───────┘                           │                  │
//! │            ▼                                                      │
//! │  output_safety.classify_async() (optional)                        │
//! │            │                                                      │
//! │            ▼                                                      │
//! │  SecurityMiddleware::process_egress (Shield)                      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

mod middleware;
mod models;
mod routes;
mod upstream;

pub use middleware::{IngressContext, SecurityMiddleware};
pub use models::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, HealthResponse, Role,
};
pub use routes::AppState;
pub use upstream::UpstreamError;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Builds the full axum router: routes, shared state, and the tracing
/// layer. The caller binds a listener and calls `axum::serve`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route("/v1/chat/completions", post(routes::chat_completions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
