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

//! Concrete LLM adapters: OpenAI and Anthropic over their JSON chat APIs,
//! plus a deterministic offline adapter.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::llm::{ChatMessage, LlmAdapter, ResponseMode};
use crate::prompts::{self, Difficulty};
use rebuttal_core::{Conversation, DebateError, DebateState};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

fn opening_user_message(conversation: &Conversation) -> ChatMessage {
    ChatMessage::user(format!(
        "Topic: {}. You argue {}. Open the debate.",
        conversation.topic, conversation.stance
    ))
}

/// OpenAI chat-completions adapter.
pub struct OpenAiAdapter {
    api_key: String,
    model: String,
    difficulty: Difficulty,
    temperature: f64,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiAdapter {
    pub fn new(api_key: String, model: String, difficulty: Difficulty) -> Self {
        Self {
            api_key,
            model,
            difficulty,
            temperature: 0.3,
            base_url: OPENAI_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn chat(&self, system: String, messages: &[ChatMessage]) -> Result<String, DebateError> {
        let mut wire = vec![json!({"role": "system", "content": system})];
        for m in messages {
            wire.push(json!({"role": m.role, "content": m.content}));
        }
        let request = json!({
            "model": self.model,
            "messages": wire,
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| DebateError::LlmServiceError(format!("openai request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DebateError::LlmServiceError(format!(
                "openai returned {}: {}",
                status, error_text
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DebateError::LlmServiceError(format!("openai body unreadable: {}", e)))?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| DebateError::LlmServiceError("openai reply missing content".into()))
    }
}

#[async_trait]
impl LlmAdapter for OpenAiAdapter {
    async fn generate(
        &self,
        conversation: &Conversation,
        state: &DebateState,
    ) -> Result<String, DebateError> {
        let system = prompts::system_prompt(
            self.difficulty,
            state,
            "Open the debate: state your stance in one sentence, support it briefly, \
             and end with one probing question.",
            ResponseMode::Defend.as_str(),
        );
        debug!(model = %self.model, "openai generate");
        self.chat(system, &[opening_user_message(conversation)]).await
    }

    async fn debate(
        &self,
        messages: &[ChatMessage],
        state: &DebateState,
        guidance: &str,
        mode: ResponseMode,
    ) -> Result<String, DebateError> {
        let system = prompts::system_prompt(self.difficulty, state, guidance, mode.as_str());
        debug!(model = %self.model, mode = mode.as_str(), "openai debate");
        self.chat(system, messages).await
    }
}

/// Anthropic messages adapter.
pub struct AnthropicAdapter {
    api_key: String,
    model: String,
    difficulty: Difficulty,
    temperature: f64,
    max_output_tokens: u32,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicAdapter {
    pub fn new(api_key: String, model: String, difficulty: Difficulty) -> Self {
        Self {
            api_key,
            model,
            difficulty,
            temperature: 0.3,
            max_output_tokens: 300,
            base_url: ANTHROPIC_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn chat(&self, system: String, messages: &[ChatMessage]) -> Result<String, DebateError> {
        let wire: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();
        let request = json!({
            "model": self.model,
            "max_tokens": self.max_output_tokens,
            "system": system,
            "messages": wire,
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                DebateError::LlmServiceError(format!("anthropic request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DebateError::LlmServiceError(format!(
                "anthropic returned {}: {}",
                status, error_text
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            DebateError::LlmServiceError(format!("anthropic body unreadable: {}", e))
        })?;

        body["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| DebateError::LlmServiceError("anthropic reply missing content".into()))
    }
}

#[async_trait]
impl LlmAdapter for AnthropicAdapter {
    async fn generate(
        &self,
        conversation: &Conversation,
        state: &DebateState,
    ) -> Result<String, DebateError> {
        let system = prompts::system_prompt(
            self.difficulty,
            state,
            "Open the debate: state your stance in one sentence, support it briefly, \
             and end with one probing question.",
            ResponseMode::Defend.as_str(),
        );
        debug!(model = %self.model, "anthropic generate");
        self.chat(system, &[opening_user_message(conversation)]).await
    }

    async fn debate(
        &self,
        messages: &[ChatMessage],
        state: &DebateState,
        guidance: &str,
        mode: ResponseMode,
    ) -> Result<String, DebateError> {
        let system = prompts::system_prompt(self.difficulty, state, guidance, mode.as_str());
        debug!(model = %self.model, mode = mode.as_str(), "anthropic debate");
        self.chat(system, messages).await
    }
}

/// Deterministic adapter for tests and offline runs. Replies are canned and
/// vary only with the response mode.
#[derive(Default)]
pub struct DummyLlm;

impl DummyLlm {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmAdapter for DummyLlm {
    async fn generate(
        &self,
        conversation: &Conversation,
        _state: &DebateState,
    ) -> Result<String, DebateError> {
        Ok(format!(
            "I will gladly take the {} stance on \"{}\". It rests on solid ground. \
             What is your strongest objection?",
            conversation.stance, conversation.topic
        ))
    }

    async fn debate(
        &self,
        _messages: &[ChatMessage],
        _state: &DebateState,
        _guidance: &str,
        mode: ResponseMode,
    ) -> Result<String, DebateError> {
        let reply = match mode {
            ResponseMode::Defend => {
                "That argument does not hold: the causal link is missing. \
                 What evidence would change your mind?"
            }
            ResponseMode::SoftConcede => {
                "There is some merit in that, but the core of my position stands. \
                 How do you address the stronger counterexample?"
            }
            ResponseMode::PartialConcede => {
                "You are right on that specific point; still, the broader claim holds. \
                 What about the remaining trade-off?"
            }
            ResponseMode::FullConcede => {
                "That argument is persuasive and I cannot rebut it on the merits."
            }
        };
        Ok(reply.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rebuttal_core::Stance;

    fn conversation() -> Conversation {
        Conversation {
            id: 1,
            topic: "Dogs are humans' best friend".into(),
            stance: Stance::Pro,
            expires_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn dummy_opening_states_the_stance() {
        let llm = DummyLlm::new();
        let state = DebateState::new(Stance::Pro, "Dogs are humans' best friend", "auto");
        let reply = llm.generate(&conversation(), &state).await.unwrap();
        assert!(reply.contains("PRO"));
        assert!(reply.contains("Dogs are humans' best friend"));
    }

    #[tokio::test]
    async fn dummy_debate_varies_with_mode() {
        let llm = DummyLlm::new();
        let state = DebateState::new(Stance::Pro, "t", "en");
        let defend = llm
            .debate(&[], &state, "g", ResponseMode::Defend)
            .await
            .unwrap();
        let full = llm
            .debate(&[], &state, "g", ResponseMode::FullConcede)
            .await
            .unwrap();
        assert_ne!(defend, full);
        // The dummy never utters an end marker either.
        assert!(!full.to_lowercase().contains("match concluded"));
    }
}
