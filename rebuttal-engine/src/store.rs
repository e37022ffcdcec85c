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

//! Debate-state store keyed by conversation id.
//!
//! Reads hand out independent copies and writes store independent copies,
//! so an in-flight orchestration never leaks partial updates — snapshot
//! isolation by clone. Per-key operations are transactional; cross-key
//! consistency is not promised.

use dashmap::DashMap;

use rebuttal_core::{DebateError, DebateState, Stance};

/// Keyed storage for `DebateState`.
pub trait DebateStore: Send + Sync {
    /// Independent copy of the state, if any.
    fn get(&self, conversation_id: i64) -> Option<DebateState>;

    /// Create a fresh state. Fails if the key already holds one.
    fn create(
        &self,
        conversation_id: i64,
        stance: Stance,
        topic: &str,
        lang: &str,
    ) -> Result<DebateState, DebateError>;

    /// Overwrite with an independent copy of `state`.
    fn save(&self, conversation_id: i64, state: &DebateState);

    /// Read-modify-write under the key's lock. Fails if missing.
    fn update(
        &self,
        conversation_id: i64,
        mutate: &mut dyn FnMut(&mut DebateState),
    ) -> Result<DebateState, DebateError>;
}

/// Process-local store. Durability is a deployment concern; the trait is
/// the seam where a persistent implementation slots in.
#[derive(Default)]
pub struct InMemoryDebateStore {
    states: DashMap<i64, DebateState>,
}

impl InMemoryDebateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DebateStore for InMemoryDebateStore {
    fn get(&self, conversation_id: i64) -> Option<DebateState> {
        self.states.get(&conversation_id).map(|s| s.clone())
    }

    fn create(
        &self,
        conversation_id: i64,
        stance: Stance,
        topic: &str,
        lang: &str,
    ) -> Result<DebateState, DebateError> {
        if self.states.contains_key(&conversation_id) {
            return Err(DebateError::StateExists(conversation_id));
        }
        let state = DebateState::new(stance, topic, lang);
        self.states.insert(conversation_id, state.clone());
        Ok(state)
    }

    fn save(&self, conversation_id: i64, state: &DebateState) {
        self.states.insert(conversation_id, state.clone());
    }

    fn update(
        &self,
        conversation_id: i64,
        mutate: &mut dyn FnMut(&mut DebateState),
    ) -> Result<DebateState, DebateError> {
        let mut entry = self
            .states
            .get_mut(&conversation_id)
            .ok_or(DebateError::StateMissing(conversation_id))?;
        mutate(entry.value_mut());
        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebuttal_core::ConcessionTier;

    #[test]
    fn create_then_get_round_trips_all_fields() {
        let store = InMemoryDebateStore::new();
        let created = store
            .create(1, Stance::Pro, "Dogs are humans' best friend", "auto")
            .unwrap();

        let mut mutated = created.clone();
        mutated.positive_judgements = 2;
        mutated.ema_contradiction = Some(0.81);
        mutated.ema_similarity = Some(0.66);
        mutated.push_tier(ConcessionTier::Partial);
        mutated.lock_lang("es");
        store.save(1, &mutated);

        let loaded = store.get(1).unwrap();
        assert_eq!(loaded.positive_judgements, 2);
        assert_eq!(loaded.ema_contradiction, Some(0.81));
        assert_eq!(loaded.ema_similarity, Some(0.66));
        assert_eq!(loaded.last_tier, Some(ConcessionTier::Partial));
        assert_eq!(loaded.lang, "es");
        assert!(loaded.lang_locked);
        assert_eq!(loaded.topic, "Dogs are humans' best friend");
    }

    #[test]
    fn create_twice_fails() {
        let store = InMemoryDebateStore::new();
        store.create(7, Stance::Con, "t", "en").unwrap();
        assert!(matches!(
            store.create(7, Stance::Con, "t", "en"),
            Err(DebateError::StateExists(7))
        ));
    }

    #[test]
    fn reads_are_independent_copies() {
        let store = InMemoryDebateStore::new();
        store.create(1, Stance::Pro, "t", "en").unwrap();

        let mut copy = store.get(1).unwrap();
        copy.positive_judgements = 99;
        // The store is unaffected until an explicit save.
        assert_eq!(store.get(1).unwrap().positive_judgements, 0);
    }

    #[test]
    fn update_mutates_in_place_and_returns_copy() {
        let store = InMemoryDebateStore::new();
        store.create(1, Stance::Pro, "t", "en").unwrap();

        let returned = store
            .update(1, &mut |s| s.assistant_turns += 1)
            .unwrap();
        assert_eq!(returned.assistant_turns, 1);
        assert_eq!(store.get(1).unwrap().assistant_turns, 1);
    }

    #[test]
    fn update_missing_is_an_error() {
        let store = InMemoryDebateStore::new();
        assert!(matches!(
            store.update(42, &mut |_| {}),
            Err(DebateError::StateMissing(42))
        ));
    }
}
