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

//! Start/continuation dispatch over the repository and the orchestrator.
//!
//! Continuation turns for the same conversation are serialized through a
//! per-key lock table; interleaving them would lose-update the judgement
//! counters and EMAs.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use rebuttal_core::{
    assert_no_topic_or_side_markers, parse_topic_side, ConcessionPolicy, Conversation,
    DebateError, Message, Role,
};
use rebuttal_engine::ConcessionOrchestrator;

use crate::repo::MessageRepo;

/// Reply window returned to the transport.
#[derive(Debug)]
pub struct TurnOutcome {
    pub conversation_id: i64,
    pub messages: Vec<Message>,
    /// True when this turn created the conversation.
    pub started: bool,
}

pub struct MessageService {
    repo: Arc<dyn MessageRepo>,
    orchestrator: Arc<ConcessionOrchestrator>,
    history_limit: usize,
    default_lang: String,
    end_policy: ConcessionPolicy,
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl MessageService {
    pub fn new(
        repo: Arc<dyn MessageRepo>,
        orchestrator: Arc<ConcessionOrchestrator>,
        history_limit: usize,
        default_lang: String,
        end_policy: ConcessionPolicy,
    ) -> Self {
        Self {
            repo,
            orchestrator,
            history_limit,
            default_lang,
            end_policy,
            locks: DashMap::new(),
        }
    }

    /// Single continuation entry point: no id starts a conversation, an id
    /// continues one.
    pub async fn handle(
        &self,
        conversation_id: Option<i64>,
        message: &str,
    ) -> Result<TurnOutcome, DebateError> {
        match conversation_id {
            None => self.start_conversation(message).await,
            Some(id) => self.continue_conversation(id, message).await,
        }
    }

    async fn start_conversation(&self, message: &str) -> Result<TurnOutcome, DebateError> {
        let (topic, stance) = parse_topic_side(message)?;
        let conversation = self.repo.create_conversation(&topic, stance).await?;
        info!(
            conversation = conversation.id,
            %stance,
            topic = %topic,
            "debate started"
        );

        let mut state = self.orchestrator.store().create(
            conversation.id,
            stance,
            &topic,
            &self.default_lang,
        )?;
        state.policy = self.end_policy.clone();
        self.orchestrator.store().save(conversation.id, &state);

        self.repo
            .add_message(conversation.id, Role::User, message)
            .await?;
        let reply = self.orchestrator.open_turn(&conversation).await?;
        self.repo
            .add_message(conversation.id, Role::Bot, &reply)
            .await?;

        self.window(conversation.id, true).await
    }

    async fn continue_conversation(
        &self,
        conversation_id: i64,
        message: &str,
    ) -> Result<TurnOutcome, DebateError> {
        assert_no_topic_or_side_markers(message)?;

        let conversation = self.fetch_live_conversation(conversation_id).await?;

        // Serialize per conversation: take the key's lock for the whole
        // judge-reply-persist sequence.
        let lock = self
            .locks
            .entry(conversation_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let _guard = lock.lock().await;

        self.repo.touch_conversation(conversation_id).await?;
        self.repo
            .add_message(conversation_id, Role::User, message)
            .await?;

        let history = self.repo.all_messages(conversation_id).await?;
        let reply = self
            .orchestrator
            .continue_turn(&conversation, &history)
            .await?;
        self.repo
            .add_message(conversation_id, Role::Bot, &reply)
            .await?;
        debug!(conversation = conversation_id, "turn completed");

        self.window(conversation_id, false).await
    }

    async fn fetch_live_conversation(&self, id: i64) -> Result<Conversation, DebateError> {
        let conversation = self
            .repo
            .get_conversation(id)
            .await?
            .ok_or(DebateError::ConversationNotFound(id))?;
        if conversation.is_expired(Utc::now()) {
            return Err(DebateError::ConversationExpired(id));
        }
        Ok(conversation)
    }

    async fn window(&self, conversation_id: i64, started: bool) -> Result<TurnOutcome, DebateError> {
        let messages = self
            .repo
            .last_messages(conversation_id, self.history_limit * 2)
            .await?;
        Ok(TurnOutcome {
            conversation_id,
            messages,
            started,
        })
    }
}
