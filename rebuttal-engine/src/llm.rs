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

//! The LLM adapter surface.
//!
//! One versioned interface with the steering fields always present; an
//! adapter that ignores `guidance` or `response_mode` is still conforming.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use rebuttal_core::{ConcessionTier, Conversation, DebateError, DebateState, Message, Role};

/// A chat turn in provider wire terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Map stored history onto provider roles, oldest first.
pub fn map_history(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|m| ChatMessage {
            role: match m.role {
                Role::Bot => "assistant".to_string(),
                Role::User => "user".to_string(),
            },
            content: m.text.clone(),
        })
        .collect()
}

/// How the reply should yield, derived from the turn's tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    Defend,
    SoftConcede,
    PartialConcede,
    FullConcede,
}

impl ResponseMode {
    pub fn for_tier(tier: ConcessionTier) -> Self {
        match tier {
            ConcessionTier::None => ResponseMode::Defend,
            ConcessionTier::Soft => ResponseMode::SoftConcede,
            ConcessionTier::Partial => ResponseMode::PartialConcede,
            ConcessionTier::Full => ResponseMode::FullConcede,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Defend => "defend",
            ResponseMode::SoftConcede => "soft_concede",
            ResponseMode::PartialConcede => "partial_concede",
            ResponseMode::FullConcede => "full_concede",
        }
    }
}

/// Natural-language steering directive for the tier.
pub fn steering_guidance(tier: ConcessionTier) -> &'static str {
    match tier {
        ConcessionTier::None => {
            "Hold your stance. Rebut the user's latest point with one concise \
             counterargument and end with one new probing question."
        }
        ConcessionTier::Soft => {
            "Acknowledge the partial merit of the user's latest point without \
             conceding, then defend your stance from a new angle and end with \
             one probing question."
        }
        ConcessionTier::Partial => {
            "Concede the specific point the user just made while maintaining \
             your overall stance. Name what they got right, then give your \
             strongest remaining argument."
        }
        ConcessionTier::Full => {
            "You are persuaded. Briefly explain which argument changed your \
             mind. Do not declare the match over; the server does that."
        }
    }
}

/// Parse a leading `LANGUAGE: xx` header off an opening reply. Returns the
/// detected code and the remaining body.
pub fn parse_language_header(reply: &str) -> (Option<String>, String) {
    let trimmed = reply.trim_start();
    let (first_line, rest) = match trimmed.split_once('\n') {
        Some((line, rest)) => (line, rest),
        None => (trimmed, ""),
    };

    let lower = first_line.trim().to_ascii_lowercase();
    if let Some(code) = lower.strip_prefix("language:") {
        let code = code.trim();
        if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            return (Some(code.to_string()), rest.trim_start().to_string());
        }
    }
    (None, reply.to_string())
}

/// Language-model port of the engine. `generate` opens the debate, `debate`
/// continues it under steering.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Opening reply. May begin with a `LANGUAGE: xx` header line that the
    /// orchestrator parses off to lock the conversation language.
    async fn generate(
        &self,
        conversation: &Conversation,
        state: &DebateState,
    ) -> Result<String, DebateError>;

    /// Continuation reply steered by tier-derived guidance.
    async fn debate(
        &self,
        messages: &[ChatMessage],
        state: &DebateState,
        guidance: &str,
        mode: ResponseMode,
    ) -> Result<String, DebateError>;
}
