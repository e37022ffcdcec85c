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

//! The per-turn concession decision.
//!
//! Contradiction-first: support never indicates the user is winning. EMAs
//! smooth bursty per-turn signals, streaks demand sustained pressure, and
//! the gates keep concessions tied to the thesis.

use tracing::debug;

use rebuttal_core::{ConcessionPolicyConfig, ConcessionTier, DebateState};
use rebuttal_nli::NliGradedSignal;

fn ema(prev: Option<f64>, value: f64, alpha: f64) -> f64 {
    match prev {
        None => value,
        Some(prev) => (1.0 - alpha) * prev + alpha * value,
    }
}

fn warm_emas(state: &mut DebateState, contradiction: f64, similarity: f64, alpha: f64) {
    state.ema_contradiction = Some(ema(state.ema_contradiction, contradiction, alpha));
    state.ema_similarity = Some(ema(state.ema_similarity, similarity, alpha));
}

fn reset_streaks(state: &mut DebateState) {
    state.contradiction_streak_partial = 0;
    state.contradiction_streak_full = 0;
}

/// Apply the graded signal to the state and decide the turn's tier.
///
/// Gated turns still warm the EMAs (contradiction toward 0, except the turn
/// gate which tracks the real score) so the next turn isn't jumpy, and they
/// reset both streaks.
pub fn apply_policy(
    state: &mut DebateState,
    signal: &NliGradedSignal,
    cfg: &ConcessionPolicyConfig,
) -> ConcessionTier {
    // Input-quality gate: short or question-only turns.
    if signal.user_wc < cfg.min_user_words
        || (signal.is_question_only && signal.user_wc <= cfg.question_only_wc_max)
    {
        debug!(user_wc = signal.user_wc, "policy gate: input quality");
        warm_emas(state, 0.0, signal.similarity, cfg.ema_alpha);
        reset_streaks(state);
        return ConcessionTier::None;
    }

    // Turn gate: cold start.
    if state.assistant_turns < cfg.min_turns_before_any_concession {
        debug!(turns = state.assistant_turns, "policy gate: cold start");
        warm_emas(state, signal.score, signal.similarity, cfg.ema_alpha);
        reset_streaks(state);
        return ConcessionTier::None;
    }

    // Topic gate.
    if cfg.require_on_topic && !signal.on_topic {
        debug!("policy gate: off topic");
        warm_emas(state, 0.0, signal.similarity, cfg.ema_alpha);
        reset_streaks(state);
        return ConcessionTier::None;
    }

    // Similarity gate.
    if signal.similarity < cfg.similarity_min {
        debug!(similarity = signal.similarity, "policy gate: low similarity");
        warm_emas(state, 0.0, signal.similarity, cfg.ema_alpha);
        reset_streaks(state);
        return ConcessionTier::None;
    }

    warm_emas(state, signal.score, signal.similarity, cfg.ema_alpha);

    // One-shot tier assignment. FULL is a stricter PARTIAL, so a full-grade
    // turn advances both streaks.
    if signal.score >= cfg.full_contra_min {
        state.contradiction_streak_full += 1;
        state.contradiction_streak_partial += 1;
    } else if signal.score >= cfg.partial_contra_min {
        state.contradiction_streak_partial += 1;
        state.contradiction_streak_full = 0;
        return if cfg.partial_streak == 1 {
            ConcessionTier::Partial
        } else {
            ConcessionTier::Soft
        };
    } else if signal.score >= cfg.soft_contra_min {
        reset_streaks(state);
        return ConcessionTier::Soft;
    } else {
        reset_streaks(state);
    }

    // Streak escalation.
    if state.contradiction_streak_full >= cfg.full_streak {
        return ConcessionTier::Full;
    }
    if state.contradiction_streak_partial >= cfg.partial_streak {
        return ConcessionTier::Partial;
    }

    // EMA backstops.
    let ema_contra = state.ema_contradiction.unwrap_or(0.0);
    if ema_contra >= cfg.ema_full_min {
        return ConcessionTier::Full;
    }
    if ema_contra >= cfg.ema_partial_min {
        return ConcessionTier::Partial;
    }
    if ema_contra >= cfg.ema_soft_min {
        return ConcessionTier::Soft;
    }

    ConcessionTier::None
}
