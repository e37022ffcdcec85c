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

//! The concession orchestrator.
//!
//! Per continuation turn: locate the judged pair of turns, canonicalize the
//! thesis, pick the best claim pair, build the graded signal, run the
//! policy, steer the LLM, sanitize its reply, and conclude the match when a
//! verdict lane fires. State is mutated on a local copy and committed once
//! at the end of the successful path; NLI and LLM failures leave the store
//! untouched.

use std::sync::Arc;
use tracing::debug;

use crate::llm::{
    map_history, parse_language_header, steering_guidance, ChatMessage, LlmAdapter, ResponseMode,
};
use crate::policy::apply_policy;
use crate::store::DebateStore;
use rebuttal_core::text::{
    is_question, is_question_only, normalize_spaces, sanitize_end_markers, split_sentences,
    word_count,
};
use rebuttal_core::{
    after_end_message, bot_thesis, build_verdict, clean_topic, ConcessionPolicyConfig,
    ConcessionTier, Conversation, DebateError, Message,
};
use rebuttal_nli::ops::{
    has_support_either_direction, is_contradiction_symmetric, is_on_topic, max_contra_sentence,
};
use rebuttal_nli::{build_graded_signal, BidirectionalScores, NliProvider, ScoringConfig};

/// A previous assistant turn must carry at least this many alphabetic words
/// to be judged against; shorter ones are greetings or notices.
const SUBSTANTIVE_BOT_MIN_WORDS: usize = 10;

/// Openers that flag an acknowledgment sentence rather than a claim.
const ACKNOWLEDGMENT_OPENERS: &[&str] = &[
    "you're right",
    "you are right",
    "i agree",
    "fair point",
    "good point",
    "that's true",
    "that is true",
    "tienes razón",
    "estoy de acuerdo",
];

pub struct ConcessionOrchestrator {
    nli: Arc<dyn NliProvider>,
    llm: Arc<dyn LlmAdapter>,
    store: Arc<dyn DebateStore>,
    scoring: ScoringConfig,
    policy: ConcessionPolicyConfig,
}

impl ConcessionOrchestrator {
    pub fn new(
        nli: Arc<dyn NliProvider>,
        llm: Arc<dyn LlmAdapter>,
        store: Arc<dyn DebateStore>,
        scoring: ScoringConfig,
        policy: ConcessionPolicyConfig,
    ) -> Self {
        Self {
            nli,
            llm,
            store,
            scoring,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn DebateStore> {
        &self.store
    }

    /// First bot reply of a conversation. Parses an optional `LANGUAGE: xx`
    /// header off the reply and locks the conversation language.
    pub async fn open_turn(&self, conversation: &Conversation) -> Result<String, DebateError> {
        let mut state = self
            .store
            .get(conversation.id)
            .ok_or(DebateError::StateMissing(conversation.id))?;
        if state.match_concluded {
            return Ok(after_end_message(&state));
        }

        let reply = self.llm.generate(conversation, &state).await?;
        let (lang, body) = parse_language_header(&reply);
        if let Some(lang) = lang {
            debug!(%lang, conversation = conversation.id, "locking language");
            state.lock_lang(&lang);
        }
        let body = sanitize_end_markers(&body);

        state.assistant_turns += 1;
        self.store.save(conversation.id, &state);
        Ok(body)
    }

    /// Judge the newest user turn and produce the steered reply or a
    /// verdict.
    pub async fn continue_turn(
        &self,
        conversation: &Conversation,
        history: &[Message],
    ) -> Result<String, DebateError> {
        let mut state = self
            .store
            .get(conversation.id)
            .ok_or(DebateError::StateMissing(conversation.id))?;
        if state.match_concluded {
            return Ok(after_end_message(&state));
        }

        let chat = map_history(history);
        let Some((bot_text, user_text)) = locate_judged_pair(&chat) else {
            // Nothing substantive to judge against yet: forward with
            // default steering.
            debug!(conversation = conversation.id, "no judgeable pair, defending");
            let reply = self
                .llm
                .debate(
                    &chat,
                    &state,
                    steering_guidance(ConcessionTier::None),
                    ResponseMode::Defend,
                )
                .await?;
            let reply = sanitize_end_markers(&reply);
            state.assistant_turns += 1;
            self.store.save(conversation.id, &state);
            return Ok(reply);
        };

        // Thesis and the judged texts.
        let topic = clean_topic(&conversation.topic);
        let thesis = bot_thesis(&topic, conversation.stance);
        let user_clean = normalize_spaces(&user_text);
        let user_wc = word_count(&user_text);
        let question_only = is_question_only(&user_text);

        // Score claim candidates and the thesis fallback pair.
        let thesis_scores = self.score(&thesis, &user_clean).await?;
        let mut best: Option<BidirectionalScores> = None;
        for claim in extract_claims(&bot_text, self.scoring.max_claims_per_turn) {
            let scores = self.score(&claim, &user_clean).await?;
            best = Some(match best {
                None => scores,
                Some(current) => pick_candidate(current, scores),
            });
        }
        let mut pair = match best {
            None => thesis_scores,
            Some(best_claim) => pick_candidate(best_claim, thesis_scores),
        };
        if pair.agg_max.relatedness() < self.policy.similarity_min {
            // Weakly related claims are noise; fall back to the thesis.
            pair = thesis_scores;
        }

        // Signal inputs: similarity proxy, topic gate, sentence probe.
        let similarity = pair.agg_max.entailment.max(pair.agg_max.contradiction);
        let on_topic = is_on_topic(&thesis_scores, &self.scoring);
        let probe = max_contra_sentence(self.nli.as_ref(), &thesis, &user_clean)
            .await
            .map_err(|e| DebateError::NliFailure(e.to_string()))?;

        let signal = build_graded_signal(
            &pair.agg_max,
            similarity,
            on_topic,
            user_wc,
            question_only,
            self.policy.min_user_words,
        );
        let mut tier = apply_policy(&mut state, &signal, &self.policy);

        // Extra-strong thesis contradiction overrides the short-input gate.
        // The only path by which a short turn can concede.
        let thesis_contra = thesis_scores.agg_max.contradiction.max(probe);
        if thesis_contra >= self.scoring.strict_contra_threshold
            && on_topic
            && tier < ConcessionTier::Partial
        {
            debug!(thesis_contra, "strong thesis contradiction escalation");
            tier = ConcessionTier::Partial;
        }

        // Alignment of the user against the thesis, for the decision trace.
        let alignment = if is_contradiction_symmetric(&thesis_scores, &self.scoring) {
            "OPPOSITE"
        } else if has_support_either_direction(&thesis_scores, &self.scoring).0 {
            "SAME"
        } else {
            "UNKNOWN"
        };
        debug!(
            conversation = conversation.id,
            %tier,
            alignment,
            score = signal.score,
            similarity = signal.similarity,
            on_topic = signal.on_topic,
            user_wc = signal.user_wc,
            "turn judged"
        );

        state.push_tier(tier);
        state.record_tier(tier);
        if tier.is_positive() {
            state.positive_judgements += 1;
        }

        // KO and cumulative lanes may already be satisfied; the verdict then
        // replaces any reply.
        if state.maybe_conclude() {
            self.store.save(conversation.id, &state);
            return Ok(build_verdict(&state));
        }

        let reply = self
            .llm
            .debate(
                &chat,
                &state,
                steering_guidance(tier),
                ResponseMode::for_tier(tier),
            )
            .await?;
        let reply = sanitize_end_markers(&reply);

        state.assistant_turns += 1;
        if state.maybe_conclude() {
            self.store.save(conversation.id, &state);
            return Ok(build_verdict(&state));
        }

        self.store.save(conversation.id, &state);
        Ok(reply)
    }

    async fn score(
        &self,
        premise: &str,
        hypothesis: &str,
    ) -> Result<BidirectionalScores, DebateError> {
        self.nli
            .bidirectional_scores(premise, hypothesis)
            .await
            .map_err(|e| DebateError::NliFailure(e.to_string()))
    }
}

/// Newest user message and the most recent substantive assistant message
/// before it.
fn locate_judged_pair(chat: &[ChatMessage]) -> Option<(String, String)> {
    let user_idx = chat.iter().rposition(|m| m.role == "user")?;
    let bot_idx = chat[..user_idx].iter().rposition(|m| {
        m.role == "assistant" && word_count(&m.content) >= SUBSTANTIVE_BOT_MIN_WORDS
    })?;
    Some((chat[bot_idx].content.clone(), chat[user_idx].content.clone()))
}

fn is_acknowledgment(sentence: &str) -> bool {
    let lower = sentence.trim().to_lowercase();
    ACKNOWLEDGMENT_OPENERS
        .iter()
        .any(|opener| lower.starts_with(opener))
}

/// Assertive claims from the previous bot message: strip the stance header
/// and the trailing question when both are present, then drop questions,
/// acknowledgments and fragments.
fn extract_claims(bot_text: &str, max_claims: usize) -> Vec<String> {
    let mut sentences = split_sentences(bot_text);
    if sentences.len() >= 2 && sentences.last().map(|s| is_question(s)).unwrap_or(false) {
        sentences.pop();
        sentences.remove(0);
    }
    sentences
        .into_iter()
        .filter(|s| !is_question(s))
        .filter(|s| !is_acknowledgment(s))
        .filter(|s| word_count(s) >= 3)
        .take(max_claims)
        .collect()
}

/// Higher contradiction wins; relatedness breaks ties.
fn pick_candidate(a: BidirectionalScores, b: BidirectionalScores) -> BidirectionalScores {
    let (ca, cb) = (a.agg_max.contradiction, b.agg_max.contradiction);
    if (ca - cb).abs() < f64::EPSILON {
        if b.agg_max.relatedness() > a.agg_max.relatedness() {
            b
        } else {
            a
        }
    } else if cb > ca {
        b
    } else {
        a
    }
}
