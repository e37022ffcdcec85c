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

//! Sequential two-arm LLM composite.
//!
//! The primary gets `per_provider_timeout`; on timeout or failure the
//! secondary is tried under the same budget. When both fail, a non-timeout
//! failure wins the classification: only both-timed-out reports as a
//! timeout.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::llm::{ChatMessage, LlmAdapter, ResponseMode};
use rebuttal_core::{Conversation, DebateError, DebateState};

pub struct FallbackLlm {
    primary: Arc<dyn LlmAdapter>,
    secondary: Arc<dyn LlmAdapter>,
    per_provider_timeout: Duration,
}

impl FallbackLlm {
    pub fn new(
        primary: Arc<dyn LlmAdapter>,
        secondary: Arc<dyn LlmAdapter>,
        per_provider_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            secondary,
            per_provider_timeout,
        }
    }

    async fn try_arm<F>(&self, label: &str, fut: F) -> Result<String, DebateError>
    where
        F: Future<Output = Result<String, DebateError>>,
    {
        match tokio::time::timeout(self.per_provider_timeout, fut).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(err)) => {
                warn!(arm = label, %err, "llm arm failed");
                Err(err)
            }
            Err(_) => {
                let err = DebateError::LlmTimeout(format!(
                    "{} provider timed out after {:?}",
                    label, self.per_provider_timeout
                ));
                warn!(arm = label, %err, "llm arm timed out");
                Err(err)
            }
        }
    }

    fn combine(first: DebateError, second: DebateError) -> DebateError {
        let timeouts = matches!(first, DebateError::LlmTimeout(_))
            && matches!(second, DebateError::LlmTimeout(_));
        if timeouts {
            DebateError::LlmTimeout(format!(
                "both LLM providers timed out: {}; {}",
                first, second
            ))
        } else {
            DebateError::LlmServiceError(format!(
                "both LLM providers failed: {}; {}",
                first, second
            ))
        }
    }
}

#[async_trait]
impl LlmAdapter for FallbackLlm {
    async fn generate(
        &self,
        conversation: &Conversation,
        state: &DebateState,
    ) -> Result<String, DebateError> {
        let first = match self
            .try_arm("primary", self.primary.generate(conversation, state))
            .await
        {
            Ok(reply) => return Ok(reply),
            Err(err) => err,
        };
        match self
            .try_arm("secondary", self.secondary.generate(conversation, state))
            .await
        {
            Ok(reply) => Ok(reply),
            Err(second) => Err(Self::combine(first, second)),
        }
    }

    async fn debate(
        &self,
        messages: &[ChatMessage],
        state: &DebateState,
        guidance: &str,
        mode: ResponseMode,
    ) -> Result<String, DebateError> {
        let first = match self
            .try_arm("primary", self.primary.debate(messages, state, guidance, mode))
            .await
        {
            Ok(reply) => return Ok(reply),
            Err(err) => err,
        };
        match self
            .try_arm(
                "secondary",
                self.secondary.debate(messages, state, guidance, mode),
            )
            .await
        {
            Ok(reply) => Ok(reply),
            Err(second) => Err(Self::combine(first, second)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rebuttal_core::Stance;

    enum Script {
        Reply(&'static str),
        Fail,
        Hang,
    }

    struct ScriptedLlm(Script);

    #[async_trait]
    impl LlmAdapter for ScriptedLlm {
        async fn generate(
            &self,
            _conversation: &Conversation,
            _state: &DebateState,
        ) -> Result<String, DebateError> {
            self.run().await
        }

        async fn debate(
            &self,
            _messages: &[ChatMessage],
            _state: &DebateState,
            _guidance: &str,
            _mode: ResponseMode,
        ) -> Result<String, DebateError> {
            self.run().await
        }
    }

    impl ScriptedLlm {
        async fn run(&self) -> Result<String, DebateError> {
            match self.0 {
                Script::Reply(text) => Ok(text.to_string()),
                Script::Fail => Err(DebateError::LlmServiceError("boom".into())),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok("unreachable".to_string())
                }
            }
        }
    }

    fn harness(primary: Script, secondary: Script) -> FallbackLlm {
        FallbackLlm::new(
            Arc::new(ScriptedLlm(primary)),
            Arc::new(ScriptedLlm(secondary)),
            Duration::from_millis(50),
        )
    }

    fn fixtures() -> (Conversation, DebateState) {
        (
            Conversation {
                id: 1,
                topic: "t".into(),
                stance: Stance::Pro,
                expires_at: Utc::now(),
            },
            DebateState::new(Stance::Pro, "t", "en"),
        )
    }

    #[tokio::test]
    async fn primary_success_short_circuits() {
        let llm = harness(Script::Reply("primary"), Script::Reply("secondary"));
        let (conv, state) = fixtures();
        assert_eq!(llm.generate(&conv, &state).await.unwrap(), "primary");
    }

    #[tokio::test]
    async fn secondary_covers_primary_failure() {
        let llm = harness(Script::Fail, Script::Reply("secondary"));
        let (conv, state) = fixtures();
        assert_eq!(llm.generate(&conv, &state).await.unwrap(), "secondary");
    }

    #[tokio::test]
    async fn hanging_primary_times_out_onto_secondary() {
        let llm = harness(Script::Hang, Script::Reply("secondary"));
        let (conv, state) = fixtures();
        assert_eq!(
            llm.debate(&[], &state, "g", ResponseMode::Defend)
                .await
                .unwrap(),
            "secondary"
        );
        let _ = conv;
    }

    #[tokio::test]
    async fn both_timeouts_report_timeout() {
        let llm = harness(Script::Hang, Script::Hang);
        let (conv, state) = fixtures();
        let err = llm.generate(&conv, &state).await.unwrap_err();
        assert!(matches!(err, DebateError::LlmTimeout(_)));
    }

    #[tokio::test]
    async fn mixed_failures_report_service_error() {
        let llm = harness(Script::Hang, Script::Fail);
        let (conv, state) = fixtures();
        let err = llm.generate(&conv, &state).await.unwrap_err();
        assert!(matches!(err, DebateError::LlmServiceError(_)));
    }
}
