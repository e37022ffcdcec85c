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

//! The per-turn graded signal handed to the policy engine.

use serde::{Deserialize, Serialize};

use crate::NliScores;

/// Immutable per-turn record. `score` is contradiction-first: support never
/// indicates the user is winning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NliGradedSignal {
    /// Contradiction-first scalar in [0, 1].
    pub score: f64,
    /// Engagement proxy in [0, 1], already scaled by input quality.
    pub similarity: f64,
    pub on_topic: bool,
    pub contradiction: f64,
    pub entailment: f64,
    pub user_wc: usize,
    pub is_question_only: bool,
}

/// Package the aggregate probabilities, similarity proxy, topic gate and
/// input-quality features into one record. No thresholding happens here —
/// except that similarity is scaled down by `min(1, user_wc /
/// min_user_words)` so fragments cannot look engaged enough to pass the
/// policy's similarity gate, however confident the NLI was on them.
pub fn build_graded_signal(
    pairwise_agg: &NliScores,
    similarity: f64,
    on_topic: bool,
    user_wc: usize,
    is_question_only: bool,
    min_user_words: usize,
) -> NliGradedSignal {
    let quality = if min_user_words == 0 {
        1.0
    } else {
        (user_wc as f64 / min_user_words as f64).min(1.0)
    };
    NliGradedSignal {
        score: pairwise_agg.contradiction,
        similarity: similarity * quality,
        on_topic,
        contradiction: pairwise_agg.contradiction,
        entailment: pairwise_agg.entailment,
        user_wc,
        is_question_only,
    }
}
