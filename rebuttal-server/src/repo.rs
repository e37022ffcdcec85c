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

//! Conversation and message repository.
//!
//! Ordering is by creation time with the per-conversation sequence number
//! as the stable tiebreak. The engine reads conversations and bumps their
//! expiry via `touch`; it never writes other metadata.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

use rebuttal_core::{Conversation, DebateError, Message, Role, Stance};

#[async_trait]
pub trait MessageRepo: Send + Sync {
    async fn create_conversation(
        &self,
        topic: &str,
        stance: Stance,
    ) -> Result<Conversation, DebateError>;

    async fn get_conversation(&self, id: i64) -> Result<Option<Conversation>, DebateError>;

    /// Push the expiry forward by the configured TTL.
    async fn touch_conversation(&self, id: i64) -> Result<(), DebateError>;

    async fn add_message(&self, id: i64, role: Role, text: &str) -> Result<(), DebateError>;

    /// Last `limit` messages, oldest→newest.
    async fn last_messages(&self, id: i64, limit: usize) -> Result<Vec<Message>, DebateError>;

    /// Full history, oldest→newest.
    async fn all_messages(&self, id: i64) -> Result<Vec<Message>, DebateError>;
}

#[derive(Default)]
struct RepoInner {
    next_id: i64,
    next_seq: u64,
    conversations: HashMap<i64, Conversation>,
    messages: HashMap<i64, Vec<Message>>,
}

/// Process-local repository with TTL-based expiry.
pub struct InMemoryMessageRepo {
    inner: Mutex<RepoInner>,
    ttl: Duration,
}

impl InMemoryMessageRepo {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            inner: Mutex::new(RepoInner::default()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    fn ordered(mut messages: Vec<Message>) -> Vec<Message> {
        messages.sort_by(|a, b| (a.created_at, a.seq).cmp(&(b.created_at, b.seq)));
        messages
    }
}

#[async_trait]
impl MessageRepo for InMemoryMessageRepo {
    async fn create_conversation(
        &self,
        topic: &str,
        stance: Stance,
    ) -> Result<Conversation, DebateError> {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let conversation = Conversation {
            id: inner.next_id,
            topic: topic.to_string(),
            stance,
            expires_at: Utc::now() + self.ttl,
        };
        inner
            .conversations
            .insert(conversation.id, conversation.clone());
        inner.messages.insert(conversation.id, Vec::new());
        Ok(conversation)
    }

    async fn get_conversation(&self, id: i64) -> Result<Option<Conversation>, DebateError> {
        Ok(self.inner.lock().conversations.get(&id).cloned())
    }

    async fn touch_conversation(&self, id: i64) -> Result<(), DebateError> {
        let mut inner = self.inner.lock();
        let ttl = self.ttl;
        let conversation = inner
            .conversations
            .get_mut(&id)
            .ok_or(DebateError::ConversationNotFound(id))?;
        let now = Utc::now();
        conversation.expires_at = conversation.expires_at.max(now) + ttl;
        Ok(())
    }

    async fn add_message(&self, id: i64, role: Role, text: &str) -> Result<(), DebateError> {
        let mut inner = self.inner.lock();
        if !inner.conversations.contains_key(&id) {
            return Err(DebateError::ConversationNotFound(id));
        }
        inner.next_seq += 1;
        let message = Message {
            role,
            text: text.to_string(),
            created_at: Utc::now(),
            seq: inner.next_seq,
        };
        inner.messages.entry(id).or_default().push(message);
        Ok(())
    }

    async fn last_messages(&self, id: i64, limit: usize) -> Result<Vec<Message>, DebateError> {
        let all = self.all_messages(id).await?;
        let start = all.len().saturating_sub(limit);
        Ok(all[start..].to_vec())
    }

    async fn all_messages(&self, id: i64) -> Result<Vec<Message>, DebateError> {
        let messages = self
            .inner
            .lock()
            .messages
            .get(&id)
            .cloned()
            .unwrap_or_default();
        Ok(Self::ordered(messages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_and_fetches_conversations() {
        let repo = InMemoryMessageRepo::new(60);
        let conv = repo
            .create_conversation("Dogs are loyal", Stance::Pro)
            .await
            .unwrap();
        assert_eq!(conv.id, 1);
        assert!(!conv.is_expired(Utc::now()));

        let fetched = repo.get_conversation(conv.id).await.unwrap().unwrap();
        assert_eq!(fetched.topic, "Dogs are loyal");
        assert_eq!(fetched.stance, Stance::Pro);
        assert!(repo.get_conversation(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn messages_come_back_oldest_first_with_window() {
        let repo = InMemoryMessageRepo::new(60);
        let conv = repo.create_conversation("t", Stance::Con).await.unwrap();
        for i in 0..6 {
            let role = if i % 2 == 0 { Role::User } else { Role::Bot };
            repo.add_message(conv.id, role, &format!("m{}", i))
                .await
                .unwrap();
        }

        let all = repo.all_messages(conv.id).await.unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].text, "m0");
        assert_eq!(all[5].text, "m5");

        let window = repo.last_messages(conv.id, 4).await.unwrap();
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].text, "m2");
        assert_eq!(window[3].text, "m5");
    }

    #[tokio::test]
    async fn seq_breaks_equal_timestamps() {
        let repo = InMemoryMessageRepo::new(60);
        let conv = repo.create_conversation("t", Stance::Pro).await.unwrap();
        // Burst inserts land within the same timestamp granularity; the
        // sequence keeps them stable.
        for i in 0..10 {
            repo.add_message(conv.id, Role::User, &format!("burst{}", i))
                .await
                .unwrap();
        }
        let all = repo.all_messages(conv.id).await.unwrap();
        let texts: Vec<_> = all.iter().map(|m| m.text.as_str()).collect();
        let expected: Vec<String> = (0..10).map(|i| format!("burst{}", i)).collect();
        assert_eq!(texts, expected.iter().map(|s| s.as_str()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn touch_extends_expiry() {
        let repo = InMemoryMessageRepo::new(60);
        let conv = repo.create_conversation("t", Stance::Pro).await.unwrap();
        let before = repo
            .get_conversation(conv.id)
            .await
            .unwrap()
            .unwrap()
            .expires_at;
        repo.touch_conversation(conv.id).await.unwrap();
        let after = repo
            .get_conversation(conv.id)
            .await
            .unwrap()
            .unwrap()
            .expires_at;
        assert!(after > before);
    }

    #[tokio::test]
    async fn adding_to_unknown_conversation_fails() {
        let repo = InMemoryMessageRepo::new(60);
        assert!(matches!(
            repo.add_message(5, Role::User, "x").await,
            Err(DebateError::ConversationNotFound(5))
        ));
    }
}
