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

//! Pure predicates over bidirectional score maps.
//!
//! CONTRADICTION is decided symmetrically (aggregate of both directions);
//! SUPPORT (entailment) is directional, best of two, and never counts
//! toward a concession.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{BidirectionalScores, NliError, NliProvider};
use rebuttal_core::text::split_sentences;

/// Thresholds and margins for the scoring predicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Hard symmetric contradiction floor.
    #[serde(default = "default_contradiction_threshold")]
    pub contradiction_threshold: f64,
    /// Relaxed floor for the soft variant.
    #[serde(default = "default_contradiction_threshold_soft")]
    pub contradiction_threshold_soft: f64,
    /// Extra-strong thesis contradiction; the only gate a short input can
    /// clear.
    #[serde(default = "default_strict_contra_threshold")]
    pub strict_contra_threshold: f64,

    /// Soft variant: contradiction must beat neutral by this much…
    #[serde(default = "default_min_delta_con_neu")]
    pub min_delta_con_neu: f64,
    /// …or sit within this epsilon of it.
    #[serde(default = "default_eps_contra_vs_neu")]
    pub eps_contra_vs_neu: f64,
    /// Margin entailment vs contradiction.
    #[serde(default = "default_margin_ec")]
    pub margin_ec: f64,
    /// Low-entailment bailout for the soft variant; also the base margin of
    /// entailment over neutral for SAME.
    #[serde(default = "default_eps_ent")]
    pub eps_ent: f64,

    /// SAME-stance gates.
    #[serde(default = "default_min_ent_for_same")]
    pub min_ent_for_same: f64,
    #[serde(default = "default_margin_ent_vs_neu")]
    pub margin_ent_vs_neu: f64,
    #[serde(default = "default_max_contra_for_same")]
    pub max_contra_for_same: f64,

    /// Sentence-level probe acceptance floor.
    #[serde(default = "default_sentence_probe_min")]
    pub sentence_probe_min: f64,

    /// Topic gate: minimum entailment-or-contradiction signal…
    #[serde(default = "default_topic_signal_min")]
    pub topic_signal_min: f64,
    /// …or neutral at most this high.
    #[serde(default = "default_topic_neu_max")]
    pub topic_neu_max: f64,

    /// Assistant claims scored per turn, best pair wins.
    #[serde(default = "default_max_claims_per_turn")]
    pub max_claims_per_turn: usize,
}

fn default_contradiction_threshold() -> f64 {
    0.55
}

fn default_contradiction_threshold_soft() -> f64 {
    0.48
}

fn default_strict_contra_threshold() -> f64 {
    0.90
}

fn default_min_delta_con_neu() -> f64 {
    0.08
}

fn default_eps_contra_vs_neu() -> f64 {
    0.03
}

fn default_margin_ec() -> f64 {
    0.02
}

fn default_eps_ent() -> f64 {
    0.20
}

fn default_min_ent_for_same() -> f64 {
    0.70
}

fn default_margin_ent_vs_neu() -> f64 {
    0.25
}

fn default_max_contra_for_same() -> f64 {
    0.40
}

fn default_sentence_probe_min() -> f64 {
    0.45
}

fn default_topic_signal_min() -> f64 {
    0.35
}

fn default_topic_neu_max() -> f64 {
    0.70
}

fn default_max_claims_per_turn() -> usize {
    3
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            contradiction_threshold: default_contradiction_threshold(),
            contradiction_threshold_soft: default_contradiction_threshold_soft(),
            strict_contra_threshold: default_strict_contra_threshold(),
            min_delta_con_neu: default_min_delta_con_neu(),
            eps_contra_vs_neu: default_eps_contra_vs_neu(),
            margin_ec: default_margin_ec(),
            eps_ent: default_eps_ent(),
            min_ent_for_same: default_min_ent_for_same(),
            margin_ent_vs_neu: default_margin_ent_vs_neu(),
            max_contra_for_same: default_max_contra_for_same(),
            sentence_probe_min: default_sentence_probe_min(),
            topic_signal_min: default_topic_signal_min(),
            topic_neu_max: default_topic_neu_max(),
            max_claims_per_turn: default_max_claims_per_turn(),
        }
    }
}

/// Which direction carried the support signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    PToH,
    HToP,
}

/// Symmetric contradiction: the aggregate contradiction clears the hard
/// floor, dominates entailment, and is not buried under neutral.
pub fn is_contradiction_symmetric(scores: &BidirectionalScores, cfg: &ScoringConfig) -> bool {
    let agg = &scores.agg_max;
    let ok = agg.contradiction >= cfg.contradiction_threshold
        && agg.contradiction >= agg.entailment
        && agg.contradiction + cfg.eps_contra_vs_neu >= agg.neutral;
    debug!(
        contra = agg.contradiction,
        ent = agg.entailment,
        neu = agg.neutral,
        ok,
        "contradiction_symmetric"
    );
    ok
}

/// Relaxed contradiction: hard acceptance, or the soft floor with an
/// entailment margin and either a tolerable neutral or a low-entailment
/// bailout.
pub fn is_contradiction_soft(scores: &BidirectionalScores, cfg: &ScoringConfig) -> bool {
    let agg = &scores.agg_max;
    let (c, e, n) = (agg.contradiction, agg.entailment, agg.neutral);

    let hard = c >= cfg.contradiction_threshold && c >= e && c + cfg.eps_contra_vs_neu >= n;
    let soft_core = c >= cfg.contradiction_threshold_soft && (c - e) >= cfg.margin_ec;
    let soft_neu_ok = (c - n) >= cfg.min_delta_con_neu || (c + cfg.eps_contra_vs_neu) >= n;
    let soft_low_ent_bailout = e <= cfg.eps_ent;

    let ok = hard || (soft_core && (soft_neu_ok || soft_low_ent_bailout));
    debug!(
        contra = c,
        ent = e,
        neu = n,
        hard,
        soft_core,
        soft_neu_ok,
        soft_low_ent_bailout,
        ok,
        "contradiction_soft"
    );
    ok
}

/// SAME-stance support, accepted from either direction. Demanding on
/// purpose: entailment must dominate both contradiction and neutral, and
/// contradiction must stay low, to avoid spurious SAME on vaguely related
/// text. Returns the winning direction for telemetry.
pub fn has_support_either_direction(
    scores: &BidirectionalScores,
    cfg: &ScoringConfig,
) -> (bool, Option<Direction>) {
    let ok = |s: &crate::NliScores| -> bool {
        s.entailment >= (s.contradiction + cfg.margin_ec).max(cfg.min_ent_for_same)
            && s.entailment >= s.neutral + cfg.eps_ent.max(cfg.margin_ent_vs_neu)
            && s.contradiction <= cfg.max_contra_for_same
    };

    let ph_ok = ok(&scores.p_to_h);
    let hp_ok = ok(&scores.h_to_p);
    let chosen = if ph_ok && scores.p_to_h.entailment >= scores.h_to_p.entailment {
        Some(Direction::PToH)
    } else if hp_ok {
        Some(Direction::HToP)
    } else if ph_ok {
        Some(Direction::PToH)
    } else {
        None
    };
    debug!(ph_ok, hp_ok, ?chosen, "support_either_direction");
    (ph_ok || hp_ok, chosen)
}

/// Per-sentence maximum contradiction of the hypothesis against the
/// premise. Rescues paragraphs where one sharp clause is averaged away.
pub async fn max_contra_sentence(
    nli: &dyn NliProvider,
    premise: &str,
    hypothesis: &str,
) -> Result<f64, NliError> {
    let mut best: f64 = 0.0;
    for sentence in split_sentences(hypothesis) {
        let scores = nli.bidirectional_scores(premise, &sentence).await?;
        best = best.max(scores.agg_max.contradiction);
    }
    Ok(best)
}

/// Soft contradiction on the whole text, or any single sentence clearing
/// the probe floor.
pub async fn is_contradiction_with_sentence_fallback(
    nli: &dyn NliProvider,
    premise: &str,
    hypothesis: &str,
    cfg: &ScoringConfig,
) -> Result<bool, NliError> {
    let whole = nli.bidirectional_scores(premise, hypothesis).await?;
    if is_contradiction_soft(&whole, cfg) {
        return Ok(true);
    }
    let probe = max_contra_sentence(nli, premise, hypothesis).await?;
    debug!(probe, floor = cfg.sentence_probe_min, "sentence_probe");
    Ok(probe >= cfg.sentence_probe_min)
}

/// Topic gate: the user text engages the thesis at all. Passes when either
/// direction shows entailment-or-contradiction above the floor, or neutral
/// below the ceiling.
pub fn is_on_topic(thesis_scores: &BidirectionalScores, cfg: &ScoringConfig) -> bool {
    let has_signal = |s: &crate::NliScores| -> bool {
        s.max_signal() >= cfg.topic_signal_min || s.neutral <= cfg.topic_neu_max
    };
    let on = has_signal(&thesis_scores.p_to_h) || has_signal(&thesis_scores.h_to_p);
    debug!(on_topic = on, "topic_gate");
    on
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockNli;
    use crate::NliScores;

    fn uniform(e: f64, n: f64, c: f64) -> BidirectionalScores {
        BidirectionalScores::uniform(NliScores::new(e, n, c))
    }

    #[test]
    fn symmetric_contradiction_boundaries() {
        let cfg = ScoringConfig::default();
        // Exactly at the floor, contradiction dominating: accepted.
        assert!(is_contradiction_symmetric(&uniform(0.10, 0.30, 0.55), &cfg));
        // Below the floor: rejected.
        assert!(!is_contradiction_symmetric(&uniform(0.10, 0.30, 0.54), &cfg));
        // Entailment above contradiction: rejected.
        assert!(!is_contradiction_symmetric(&uniform(0.70, 0.05, 0.60), &cfg));
        // Neutral towers over contradiction beyond epsilon: rejected.
        assert!(!is_contradiction_symmetric(&uniform(0.02, 0.90, 0.56), &cfg));
    }

    #[test]
    fn soft_contradiction_accepts_relaxed_floor() {
        let cfg = ScoringConfig::default();
        // Below hard floor but above soft floor with low entailment.
        assert!(is_contradiction_soft(&uniform(0.05, 0.42, 0.50), &cfg));
        // Below the soft floor too: rejected.
        assert!(!is_contradiction_soft(&uniform(0.05, 0.50, 0.40), &cfg));
        // Entailment margin violated: rejected.
        assert!(!is_contradiction_soft(&uniform(0.50, 0.10, 0.50), &cfg));
    }

    #[test]
    fn soft_low_entailment_bailout() {
        let cfg = ScoringConfig::default();
        // Neutral dominates, but entailment is negligible: the bailout
        // accepts.
        assert!(is_contradiction_soft(&uniform(0.10, 0.80, 0.50), &cfg));
    }

    #[test]
    fn support_requires_dominant_entailment() {
        let cfg = ScoringConfig::default();
        let (ok, dir) = has_support_either_direction(&uniform(0.78, 0.15, 0.05), &cfg);
        assert!(ok);
        assert!(dir.is_some());

        // Entailment high but contradiction too: rejected.
        let (ok, _) = has_support_either_direction(&uniform(0.75, 0.05, 0.45), &cfg);
        assert!(!ok);

        // Entailment below the SAME floor: rejected.
        let (ok, dir) = has_support_either_direction(&uniform(0.60, 0.10, 0.05), &cfg);
        assert!(!ok);
        assert!(dir.is_none());
    }

    #[test]
    fn support_is_directional() {
        let cfg = ScoringConfig::default();
        let scores = BidirectionalScores::new(
            NliScores::new(0.10, 0.80, 0.10),
            NliScores::new(0.85, 0.05, 0.05),
        );
        let (ok, dir) = has_support_either_direction(&scores, &cfg);
        assert!(ok);
        assert_eq!(dir, Some(Direction::HToP));
    }

    #[test]
    fn topic_gate_passes_on_signal_or_low_neutral() {
        let cfg = ScoringConfig::default();
        assert!(is_on_topic(&uniform(0.40, 0.55, 0.05), &cfg));
        assert!(is_on_topic(&uniform(0.05, 0.60, 0.10), &cfg));
        assert!(!is_on_topic(&uniform(0.05, 0.90, 0.05), &cfg));
    }

    #[tokio::test]
    async fn sentence_probe_finds_sharp_clause() {
        let nli = MockNli::fixed(NliScores::new(0.1, 0.8, 0.1))
            .with_override("God does not exist", NliScores::new(0.02, 0.05, 0.93));
        let probe = max_contra_sentence(
            &nli,
            "God exists.",
            "Well, maybe. But God does not exist. Anyway.",
        )
        .await
        .unwrap();
        assert!((probe - 0.93).abs() < 1e-9);
    }

    #[tokio::test]
    async fn fallback_predicate_uses_probe_when_whole_text_is_flat() {
        let cfg = ScoringConfig::default();
        let whole = "Some filler. A sharp rebuttal. More filler.";
        // Overrides match in insertion order, so the whole text stays flat
        // while the isolated middle sentence scores high.
        let nli = MockNli::fixed(NliScores::new(0.05, 0.90, 0.05))
            .with_override(whole, NliScores::new(0.05, 0.90, 0.05))
            .with_override("sharp rebuttal", NliScores::new(0.02, 0.10, 0.88));
        let ok = is_contradiction_with_sentence_fallback(&nli, "The thesis.", whole, &cfg)
            .await
            .unwrap();
        assert!(ok);
    }
}
