// Copyright 2025 Rebuttal (https://github.com/rebuttal)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Rebuttal Server
//!
//! HTTP transport and wiring for the concession engine.

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod api;
pub mod config;
pub mod repo;
pub mod service;

use api::AppState;
use config::ServerConfig;
use repo::InMemoryMessageRepo;
use service::MessageService;

use rebuttal_core::ConcessionPolicy;
use rebuttal_engine::{
    AnthropicAdapter, ConcessionOrchestrator, Difficulty, DummyLlm, FallbackLlm,
    InMemoryDebateStore, LlmAdapter, OpenAiAdapter, Provider,
};
use rebuttal_nli::{NliProvider, RemoteNliProvider};

fn build_adapter(
    provider: Provider,
    model: &str,
    difficulty: Difficulty,
    config: &config::LlmConfig,
) -> Result<Arc<dyn LlmAdapter>> {
    let adapter: Arc<dyn LlmAdapter> = match provider {
        Provider::OpenAi => {
            let key = config
                .openai_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is required for provider=openai"))?;
            let model = if model.is_empty() {
                rebuttal_engine::prompts::OPENAI_DEFAULT_MODEL
            } else {
                model
            };
            Arc::new(OpenAiAdapter::new(key, model.to_string(), difficulty))
        }
        Provider::Anthropic => {
            let key = config.anthropic_api_key.clone().ok_or_else(|| {
                anyhow::anyhow!("ANTHROPIC_API_KEY is required for provider=anthropic")
            })?;
            let model = if model.is_empty() {
                rebuttal_engine::prompts::ANTHROPIC_DEFAULT_MODEL
            } else {
                model
            };
            Arc::new(AnthropicAdapter::new(key, model.to_string(), difficulty))
        }
        Provider::Dummy => Arc::new(DummyLlm::new()),
    };
    Ok(adapter)
}

/// Construct the LLM stack from config: a single adapter, or the sequential
/// fallback composite when a second arm is configured.
pub fn build_llm(config: &config::LlmConfig) -> Result<Arc<dyn LlmAdapter>> {
    let difficulty: Difficulty = config.difficulty.parse()?;
    let primary_provider: Provider = config.provider.parse()?;
    let primary = build_adapter(primary_provider, &config.model, difficulty, config)?;

    let Some(fallback_provider) = &config.fallback_provider else {
        return Ok(primary);
    };
    let secondary_provider: Provider = fallback_provider.parse()?;
    let secondary = build_adapter(
        secondary_provider,
        config.fallback_model.as_deref().unwrap_or(""),
        difficulty,
        config,
    )?;
    Ok(Arc::new(FallbackLlm::new(
        primary,
        secondary,
        Duration::from_secs_f64(config.per_provider_timeout_secs),
    )))
}

/// Assemble the application state from configuration.
pub fn build_state(config: &ServerConfig) -> Result<AppState> {
    let nli: Arc<dyn NliProvider> = {
        let mut provider = RemoteNliProvider::new(config.nli.endpoint.clone())
            .with_max_length(config.nli.max_length);
        if let Some(token) = &config.nli.api_token {
            provider = provider.with_api_token(token.clone());
        }
        Arc::new(provider)
    };
    let llm = build_llm(&config.llm)?;

    let orchestrator = Arc::new(ConcessionOrchestrator::new(
        nli,
        llm,
        Arc::new(InMemoryDebateStore::new()),
        config.scoring.clone(),
        config.policy.clone(),
    ));

    let end_policy = ConcessionPolicy {
        total_min_positives: config.debate.required_positive_judgements,
        min_assistant_turns: config.debate.min_assistant_turns_before_verdict,
        ..ConcessionPolicy::default()
    };

    let repo = Arc::new(InMemoryMessageRepo::new(config.debate.expires_minutes));
    let service = Arc::new(MessageService::new(
        repo,
        orchestrator,
        config.debate.history_limit,
        config.debate.default_lang.clone(),
        end_policy,
    ));

    Ok(AppState {
        service,
        request_timeout: Duration::from_secs(config.server.request_timeout_secs),
    })
}

/// Build the router with tracing and optional CORS.
pub fn build_router(state: AppState, enable_cors: bool) -> Router {
    let mut router = Router::new()
        .route("/messages", post(api::messages::post_messages))
        .route("/health", get(api::health::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state);
    if enable_cors {
        router = router.layer(CorsLayer::permissive());
    }
    router
}

/// Validate the config, bind, and serve until shutdown.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    config.validate()?;
    let addr = config.socket_addr()?;
    let state = build_state(&config)?;
    let router = build_router(state, config.server.enable_cors);

    info!(%addr, "rebuttal server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
