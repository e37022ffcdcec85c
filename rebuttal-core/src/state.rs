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

//! Authoritative per-conversation debate state and the end-of-match lanes.

use serde::{Deserialize, Serialize};

use crate::models::Stance;
use crate::tier::ConcessionTier;

/// End-of-match policy embedded in each `DebateState`. Immutable for the
/// lifetime of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcessionPolicy {
    /// KO lane: a FULL tier ends the match immediately.
    pub end_on_full: bool,

    /// Recent-window lane. A window of 0 disables the lane.
    pub recent_window: usize,
    pub recent_min_positives: usize,
    /// Sustained pressure required alongside the recent window.
    pub ema_contra_min: f64,

    /// Points lane: cumulative PARTIAL/FULL judgements needed.
    pub total_min_positives: u32,
    /// Points lane: assistant replies that must have been emitted first.
    pub min_assistant_turns: u32,
    /// Don't end the match right after a NONE tier.
    pub require_recent_positive: bool,
}

impl Default for ConcessionPolicy {
    fn default() -> Self {
        Self {
            end_on_full: true,
            recent_window: 0,
            recent_min_positives: 2,
            ema_contra_min: 0.80,
            total_min_positives: 3,
            min_assistant_turns: 2,
            require_recent_positive: true,
        }
    }
}

/// Server-authoritative state for one debate, keyed by conversation id.
///
/// `stance` and `topic` never change after creation; `match_concluded` only
/// moves false→true. The EMAs are both unset on a cold start and both set
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateState {
    pub stance: Stance,
    pub topic: String,
    /// Two-letter code, or "auto" until the first bot reply locks it.
    pub lang: String,
    pub lang_locked: bool,

    pub assistant_turns: u32,
    pub positive_judgements: u32,
    pub match_concluded: bool,

    pub ema_contradiction: Option<f64>,
    pub ema_similarity: Option<f64>,
    pub contradiction_streak_partial: u32,
    pub contradiction_streak_full: u32,

    pub last_tier: Option<ConcessionTier>,
    /// Ring buffer, newest at the tail, capped at
    /// `max(policy.recent_window, 5)`.
    pub last_k_tiers: Vec<ConcessionTier>,

    pub soft_concessions: u32,
    pub partial_concessions: u32,

    pub policy: ConcessionPolicy,
}

impl DebateState {
    pub fn new(stance: Stance, topic: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            stance,
            topic: topic.into(),
            lang: lang.into(),
            lang_locked: false,
            assistant_turns: 0,
            positive_judgements: 0,
            match_concluded: false,
            ema_contradiction: None,
            ema_similarity: None,
            contradiction_streak_partial: 0,
            contradiction_streak_full: 0,
            last_tier: None,
            last_k_tiers: Vec::new(),
            soft_concessions: 0,
            partial_concessions: 0,
            policy: ConcessionPolicy::default(),
        }
    }

    /// Lock the reply language the first time a bot turn announces it.
    pub fn lock_lang(&mut self, lang: &str) {
        if !self.lang_locked {
            self.lang = lang.to_string();
            self.lang_locked = true;
        }
    }

    fn tier_cap(&self) -> usize {
        self.policy.recent_window.max(5)
    }

    /// Record the newest tier at the tail of the ring buffer.
    pub fn push_tier(&mut self, tier: ConcessionTier) {
        self.last_tier = Some(tier);
        self.last_k_tiers.push(tier);
        let cap = self.tier_cap();
        if self.last_k_tiers.len() > cap {
            let excess = self.last_k_tiers.len() - cap;
            self.last_k_tiers.drain(..excess);
        }
    }

    /// Bookkeeping counters for non-terminal concessions.
    pub fn record_tier(&mut self, tier: ConcessionTier) {
        match tier {
            ConcessionTier::Soft => self.soft_concessions += 1,
            ConcessionTier::Partial => self.partial_concessions += 1,
            _ => {}
        }
    }

    /// Whether any end lane fires. Lane order: KO, recent window, points.
    pub fn should_end(&self) -> bool {
        let p = &self.policy;

        if p.end_on_full && self.last_tier == Some(ConcessionTier::Full) {
            return true;
        }

        if p.recent_window > 0 && !self.last_k_tiers.is_empty() {
            let window_start = self.last_k_tiers.len().saturating_sub(p.recent_window);
            let recent_pos = self.last_k_tiers[window_start..]
                .iter()
                .filter(|t| t.is_positive())
                .count();
            if recent_pos >= p.recent_min_positives
                && self.ema_contradiction.unwrap_or(0.0) >= p.ema_contra_min
            {
                return true;
            }
        }

        if self.positive_judgements >= p.total_min_positives
            && self.assistant_turns >= p.min_assistant_turns
        {
            let recent_ok = !p.require_recent_positive
                || self.last_tier.map(|t| t.is_positive()).unwrap_or(false);
            if recent_ok {
                return true;
            }
        }

        false
    }

    /// Set `match_concluded` once the policy is satisfied; returns the flag.
    /// Monotonic: a concluded match stays concluded.
    pub fn maybe_conclude(&mut self) -> bool {
        if !self.match_concluded && self.should_end() {
            self.match_concluded = true;
        }
        self.match_concluded
    }
}
