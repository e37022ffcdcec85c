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

//! # Rebuttal NLI
//!
//! Natural Language Inference scoring for the concession engine:
//!
//! - **Provider trait**: normalized entailment/neutral/contradiction
//!   probabilities over (premise, hypothesis) pairs, with bidirectional
//!   aggregation.
//! - **Scoring ops**: pure symmetric/soft contradiction and support
//!   predicates plus the per-sentence contradiction probe.
//! - **Graded signal**: the per-turn record the policy engine consumes.
//!
//! Scoring is deterministic for fixed model weights and inputs; failures
//! propagate unretried so the orchestrator can surface them as service
//! errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod ops;
pub mod remote;
pub mod signal;

pub use ops::{Direction, ScoringConfig};
pub use remote::RemoteNliProvider;
pub use signal::{build_graded_signal, NliGradedSignal};

/// Normalized probabilities over the three NLI labels. Sums to 1 for a
/// single directional inference.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NliScores {
    pub entailment: f64,
    pub neutral: f64,
    pub contradiction: f64,
}

impl NliScores {
    pub fn new(entailment: f64, neutral: f64, contradiction: f64) -> Self {
        Self {
            entailment,
            neutral,
            contradiction,
        }
    }

    /// Strongest directional evidence of engagement with the premise.
    pub fn max_signal(&self) -> f64 {
        self.entailment.max(self.contradiction)
    }

    /// How related the pair is regardless of direction of the relation.
    pub fn relatedness(&self) -> f64 {
        self.entailment
            .max(self.contradiction)
            .max(1.0 - self.neutral)
    }

    /// Per-label maximum of two directional scores.
    pub fn label_max(&self, other: &NliScores) -> NliScores {
        NliScores {
            entailment: self.entailment.max(other.entailment),
            neutral: self.neutral.max(other.neutral),
            contradiction: self.contradiction.max(other.contradiction),
        }
    }
}

/// Both inference directions plus their per-label maximum. The symmetric
/// aggregate is what the downstream predicates consume; direction asymmetry
/// in entailment/contradiction washes out under the max.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BidirectionalScores {
    pub p_to_h: NliScores,
    pub h_to_p: NliScores,
    pub agg_max: NliScores,
}

impl BidirectionalScores {
    pub fn new(p_to_h: NliScores, h_to_p: NliScores) -> Self {
        let agg_max = p_to_h.label_max(&h_to_p);
        Self {
            p_to_h,
            h_to_p,
            agg_max,
        }
    }

    /// Symmetric bidirectional scores, used by tests and forced overrides.
    pub fn uniform(scores: NliScores) -> Self {
        Self::new(scores, scores)
    }
}

/// Collapse classifier label aliases onto the canonical vocabulary.
/// Returns `None` for labels outside it.
pub fn normalize_label(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "entailment" | "entailed" => Some("entailment"),
        "neutral" => Some("neutral"),
        "contradiction" | "contradict" | "contradictory" => Some("contradiction"),
        _ => None,
    }
}

/// Errors from NLI scoring
#[derive(Debug, Error)]
pub enum NliError {
    #[error("inference error: {0}")]
    Inference(String),

    #[error("malformed classifier response: {0}")]
    MalformedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A classifier producing label probabilities for ordered text pairs.
///
/// Implementations are process-wide singletons initialized once and
/// read-only at inference; `score` must be deterministic and side-effect
/// free for fixed weights.
#[async_trait]
pub trait NliProvider: Send + Sync {
    /// Directional probabilities for (premise, hypothesis).
    async fn score(&self, premise: &str, hypothesis: &str) -> Result<NliScores, NliError>;

    /// Run both directions and aggregate per-label maxima.
    async fn bidirectional_scores(
        &self,
        premise: &str,
        hypothesis: &str,
    ) -> Result<BidirectionalScores, NliError> {
        let p_to_h = self.score(premise, hypothesis).await?;
        let h_to_p = self.score(hypothesis, premise).await?;
        Ok(BidirectionalScores::new(p_to_h, h_to_p))
    }

    /// Shortcut for the symmetric contradiction probability.
    async fn contradiction_max(&self, premise: &str, hypothesis: &str) -> Result<f64, NliError> {
        Ok(self
            .bidirectional_scores(premise, hypothesis)
            .await?
            .agg_max
            .contradiction)
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// Deterministic provider returning a fixed directional score for every
    /// pair, with optional per-hypothesis overrides.
    pub struct MockNli {
        pub default: NliScores,
        pub by_hypothesis: Vec<(String, NliScores)>,
    }

    impl MockNli {
        pub fn fixed(scores: NliScores) -> Self {
            Self {
                default: scores,
                by_hypothesis: Vec::new(),
            }
        }

        pub fn with_override(mut self, hypothesis: &str, scores: NliScores) -> Self {
            self.by_hypothesis.push((hypothesis.to_string(), scores));
            self
        }
    }

    #[async_trait]
    impl NliProvider for MockNli {
        async fn score(&self, _premise: &str, hypothesis: &str) -> Result<NliScores, NliError> {
            for (needle, scores) in &self.by_hypothesis {
                if hypothesis.contains(needle.as_str()) {
                    return Ok(*scores);
                }
            }
            Ok(self.default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_aliases_collapse() {
        assert_eq!(normalize_label("CONTRADICTORY"), Some("contradiction"));
        assert_eq!(normalize_label("contradict"), Some("contradiction"));
        assert_eq!(normalize_label(" Entailed "), Some("entailment"));
        assert_eq!(normalize_label("neutral"), Some("neutral"));
        assert_eq!(normalize_label("label_1"), None);
    }

    #[test]
    fn agg_max_takes_per_label_maxima() {
        let bi = BidirectionalScores::new(
            NliScores::new(0.7, 0.2, 0.1),
            NliScores::new(0.1, 0.3, 0.6),
        );
        assert_eq!(bi.agg_max.entailment, 0.7);
        assert_eq!(bi.agg_max.neutral, 0.3);
        assert_eq!(bi.agg_max.contradiction, 0.6);
    }

    #[test]
    fn relatedness_ignores_direction() {
        let s = NliScores::new(0.1, 0.2, 0.7);
        assert!((s.relatedness() - 0.8).abs() < 1e-9);
        let mostly_neutral = NliScores::new(0.05, 0.9, 0.05);
        assert!((mostly_neutral.relatedness() - 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn default_bidirectional_runs_both_directions() {
        use crate::testutil::MockNli;
        let nli = MockNli::fixed(NliScores::new(0.2, 0.3, 0.5));
        let bi = nli.bidirectional_scores("p", "h").await.unwrap();
        assert_eq!(bi.p_to_h, bi.h_to_p);
        assert_eq!(bi.agg_max.contradiction, 0.5);
        assert_eq!(nli.contradiction_max("p", "h").await.unwrap(), 0.5);
    }
}
