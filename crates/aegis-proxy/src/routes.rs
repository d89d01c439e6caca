//! Route handlers: `GET /health` and `POST /v1/chat/completions`.
//!
//! The chat completions handler races the ML guardrail classifier
//! against the upstream LLM call. Whichever resolves first decides the
//! outcome: if the guardrail blocks, the LLM call is cancelled outright
//! to save compute; if the LLM finishes first, the handler still waits
//! on the guardrail before releasing a response.

use std::collections::HashMap;
use std::sync::Arc;

use aegis_core::AegisConfig;
use aegis_guardrail::{OutputSafetyClassifier, PromptInjectionClassifier};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info, warn};

use crate::middleware::SecurityMiddleware;
use crate::models::{ChatCompletionRequest, ChatCompletionResponse, HealthResponse};
use crate::upstream::forward_to_upstream;

pub struct AppState {
    pub config: AegisConfig,
    pub middleware: SecurityMiddleware,
    pub guardrail: PromptInjectionClassifier,
    pub output_safety: OutputSafetyClassifier,
}

impl AppState {
    pub fn new(config: AegisConfig) -> Self {
        let middleware = SecurityMiddleware::new(config.canary_prefix.clone());
        let guardrail = PromptInjectionClassifier::new(
            config.guardrail_model.clone(),
            backend_pref_str(config.guardrail_backend),
            config.guardrail_remote_key.clone(),
            config.injection_threshold,
            config.jailbreak_threshold,
        );
        let output_safety = OutputSafetyClassifier::new(config.output_safety_key.clone());
        Self {
            config,
            middleware,
            guardrail,
            output_safety,
        }
    }
}

fn backend_pref_str(pref: aegis_core::GuardrailBackendPreference) -> &'static str {
    use aegis_core::GuardrailBackendPreference::*;
    match pref {
        Auto => "auto",
        RemoteApi => "remote-api",
        LocalAccelerated => "local-accelerated",
        LocalReference => "local-reference",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("no upstream LLM URL configured")]
    NoUpstreamConfigured,
    #[error(transparent)]
    Upstream(#[from] crate::upstream::UpstreamError),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = match self {
            RouteError::NoUpstreamConfigured => StatusCode::BAD_GATEWAY,
            RouteError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        (status, self.to_string()).into_response()
    }
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut components = HashMap::new();
    components.insert("shield".to_string(), "active".to_string());
    components.insert("lens".to_string(), "active".to_string());
    components.insert("proxy".to_string(), "active".to_string());
    components.insert(
        "guardrail".to_string(),
        if state.guardrail.is_available() {
            format!("active ({})", state.guardrail.backend_name())
        } else {
            "disabled (no backend)".to_string()
        },
    );
    components.insert(
        "output_safety".to_string(),
        if state.output_safety.is_available() {
            "active (LLaMA Guard 4)".to_string()
        } else {
            "disabled (no Groq key)".to_string()
        },
    );

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        components,
    })
}

pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatCompletionRequest>,
) -> Result<Json<ChatCompletionResponse>, Response> {
    if let Err(reason) = request.validate() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, reason).into_response());
    }

    info!(model = %request.model, "chat completion request");

    let upstream_url = state.config.upstream_url.trim_end_matches('/').to_string();
    if upstream_url.is_empty() {
        return Err(RouteError::NoUpstreamConfigured.into_response());
    }

    let (hardened_messages, mut context) = state.middleware.process_ingress(&request);
    let guardrail_text = request.latest_user_content().to_string();

    let mut guardrail_task = {
        let guardrail_text = guardrail_text.clone();
        let state = state.clone();
        tokio::spawn(async move { state.guardrail.classify(&guardrail_text).await })
    };

    let mut llm_task = {
        let upstream_url = upstream_url.clone();
        let api_key = state.config.upstream_api_key.clone();
        let model = request.model.clone();
        let temperature = request.temperature;
        let max_tokens = request.max_tokens;
        tokio::spawn(async move {
            forward_to_upstream(&upstream_url, &api_key, &hardened_messages, &model, temperature, max_tokens).await
        })
    };

    let guardrail_result;
    let llm_response_text;

    tokio::select! {
        guardrail_outcome = &mut guardrail_task => {
            let result = guardrail_outcome.expect("guardrail task panicked");
            if result.threshold_exceeded {
                llm_task.abort();
                warn!(label = result.label.as_str(), score = result.score, "request blocked by guardrail");
                context.shield_context.guardrail_result = Some(result.clone());
                return Ok(Json(state.middleware.build_blocked_response(&context, &result)));
            }
            guardrail_result = result;
            llm_response_text = match llm_task.await {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => return Err(RouteError::from(e).into_response()),
                Err(e) => {
                    error!(error = %e, "llm task panicked or was cancelled");
                    return Err(RouteError::NoUpstreamConfigured.into_response());
                }
            };
        }
        llm_outcome = &mut llm_task => {
            let text = match llm_outcome.expect("llm task panicked") {
                Ok(text) => text,
                Err(e) => return Err(RouteError::from(e).into_response()),
            };
            let result = (&mut guardrail_task).await.expect("guardrail task panicked");
            if result.threshold_exceeded {
                warn!(label = result.label.as_str(), "request blocked by guardrail (post-llm)");
                context.shield_context.guardrail_result = Some(result.clone());
                return Ok(Json(state.middleware.build_blocked_response(&context, &result)));
            }
            guardrail_result = result;
            llm_response_text = text;
        }
    }

    context.shield_context.guardrail_result = Some(guardrail_result.clone());

    if state.output_safety.is_available() {
        let safety_result = state
            .output_safety
            .classify_async(&llm_response_text, &guardrail_text)
            .await;

        if !safety_result.safe {
            warn!(categories = ?safety_result.categories, "output blocked by llama guard");
            let mut report = aegis_core::SecurityReport::new();
            report.verdict = aegis_core::SecurityVerdict::Block;
            report.input_guardrail_label = guardrail_result.label.as_str().to_string();
            report.input_guardrail_score = guardrail_result.score;
            report.output_moderation_flagged = true;
            report.add_alert(format!(
                "Output safety violation: {}",
                safety_result.category_names.join(", ")
            ));
            return Ok(Json(ChatCompletionResponse::blocked(
                format!(
                    "Response blocked, unsafe content detected: {}",
                    safety_result.category_names.join(", ")
                ),
                report,
            )));
        }
    }

    let response = state.middleware.process_egress(&llm_response_text, &context, &request);
    info!(verdict = ?response.security.verdict, "response ready");
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_pref_str_covers_every_variant() {
        use aegis_core::GuardrailBackendPreference::*;
        assert_eq!(backend_pref_str(Auto), "auto");
        assert_eq!(backend_pref_str(RemoteApi), "remote-api");
        assert_eq!(backend_pref_str(LocalAccelerated), "local-accelerated");
        assert_eq!(backend_pref_str(LocalReference), "local-reference");
    }

    #[tokio::test]
    async fn health_check_reports_disabled_without_backends() {
        let state = Arc::new(AppState::new(AegisConfig::default()));
        let Json(health) = health_check(State(state)).await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.components["guardrail"], "disabled (no backend)");
        assert_eq!(health.components["output_safety"], "disabled (no Groq key)");
    }

    #[test]
    fn no_upstream_configured_maps_to_bad_gateway() {
        let response = RouteError::NoUpstreamConfigured.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
