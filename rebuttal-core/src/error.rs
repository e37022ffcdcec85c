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

//! Domain error taxonomy shared by every crate in the workspace.

use thiserror::Error;

/// Result type for debate operations
pub type Result<T> = std::result::Result<T, DebateError>;

/// Business and infrastructure failures visible at the service boundary.
///
/// The transport maps these onto HTTP statuses; `code()` is the stable
/// machine-readable identifier carried in error payloads.
#[derive(Debug, Error)]
pub enum DebateError {
    /// First message is missing markers, malformed, or overlong
    #[error("invalid start message: {0}")]
    InvalidStartMessage(String),

    /// Continuation message is empty or re-states Topic:/Side: markers
    #[error("invalid continuation message: {0}")]
    InvalidContinuationMessage(String),

    /// Conversation id unknown
    #[error("conversation not found: {0}")]
    ConversationNotFound(i64),

    /// Conversation exists but its TTL elapsed
    #[error("conversation expired: {0}")]
    ConversationExpired(i64),

    /// LLM provider(s) did not answer in time
    #[error("llm timeout: {0}")]
    LlmTimeout(String),

    /// LLM provider(s) failed for a non-timeout reason
    #[error("llm service error: {0}")]
    LlmServiceError(String),

    /// NLI scoring failed; surfaced unretried
    #[error("nli failure: {0}")]
    NliFailure(String),

    /// Conversation exists but its debate state is gone. Policy bug.
    #[error("debate state missing for conversation {0}")]
    StateMissing(i64),

    /// Attempt to create debate state under a key that already holds one
    #[error("debate state already exists for conversation {0}")]
    StateExists(i64),

    /// Missing or invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),
}

impl DebateError {
    /// Stable snake_case code for API payloads and logs.
    pub fn code(&self) -> &'static str {
        match self {
            DebateError::InvalidStartMessage(_) => "invalid_start_message",
            DebateError::InvalidContinuationMessage(_) => "invalid_continuation_message",
            DebateError::ConversationNotFound(_) => "conversation_not_found",
            DebateError::ConversationExpired(_) => "conversation_expired",
            DebateError::LlmTimeout(_) => "llm_timeout",
            DebateError::LlmServiceError(_) => "llm_service_error",
            DebateError::NliFailure(_) => "nli_failure",
            DebateError::StateMissing(_) => "state_missing",
            DebateError::StateExists(_) => "state_exists",
            DebateError::Config(_) => "config_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            DebateError::InvalidStartMessage("x".into()).code(),
            "invalid_start_message"
        );
        assert_eq!(
            DebateError::ConversationExpired(7).code(),
            "conversation_expired"
        );
        assert_eq!(DebateError::LlmTimeout("t".into()).code(), "llm_timeout");
    }
}
