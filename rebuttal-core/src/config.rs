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

//! Tunables for the per-turn concession decision.

use serde::{Deserialize, Serialize};

/// Gates, thresholds, smoothing and streak settings consumed by the policy
/// engine. Every field has a serde default so a config file may override any
/// subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcessionPolicyConfig {
    /// Input-quality floor: shorter turns never concede on their own.
    #[serde(default = "default_min_user_words")]
    pub min_user_words: usize,
    /// Question-only turns up to this many words are gated.
    #[serde(default = "default_question_only_wc_max")]
    pub question_only_wc_max: usize,

    /// Cold-start gate on assistant turns.
    #[serde(default = "default_min_turns_before_any_concession")]
    pub min_turns_before_any_concession: u32,
    /// Off-topic turns never produce a concession.
    #[serde(default = "default_require_on_topic")]
    pub require_on_topic: bool,
    /// Engagement floor on the similarity proxy.
    #[serde(default = "default_similarity_min")]
    pub similarity_min: f64,

    /// Per-turn contradiction thresholds, escalation order.
    #[serde(default = "default_soft_contra_min")]
    pub soft_contra_min: f64,
    #[serde(default = "default_partial_contra_min")]
    pub partial_contra_min: f64,
    #[serde(default = "default_full_contra_min")]
    pub full_contra_min: f64,

    /// Exponential moving-average weight of the newest observation.
    #[serde(default = "default_ema_alpha")]
    pub ema_alpha: f64,
    /// EMA backstop thresholds, escalation order.
    #[serde(default = "default_ema_soft_min")]
    pub ema_soft_min: f64,
    #[serde(default = "default_ema_partial_min")]
    pub ema_partial_min: f64,
    #[serde(default = "default_ema_full_min")]
    pub ema_full_min: f64,

    /// Consecutive qualifying turns needed for the streak escalations.
    #[serde(default = "default_partial_streak")]
    pub partial_streak: u32,
    #[serde(default = "default_full_streak")]
    pub full_streak: u32,
}

fn default_min_user_words() -> usize {
    5
}

fn default_question_only_wc_max() -> usize {
    6
}

fn default_min_turns_before_any_concession() -> u32 {
    0
}

fn default_require_on_topic() -> bool {
    true
}

fn default_similarity_min() -> f64 {
    0.60
}

fn default_soft_contra_min() -> f64 {
    0.60
}

fn default_partial_contra_min() -> f64 {
    0.75
}

fn default_full_contra_min() -> f64 {
    0.90
}

fn default_ema_alpha() -> f64 {
    0.5
}

fn default_ema_soft_min() -> f64 {
    0.65
}

fn default_ema_partial_min() -> f64 {
    0.78
}

fn default_ema_full_min() -> f64 {
    0.88
}

fn default_partial_streak() -> u32 {
    1
}

fn default_full_streak() -> u32 {
    2
}

impl Default for ConcessionPolicyConfig {
    fn default() -> Self {
        Self {
            min_user_words: default_min_user_words(),
            question_only_wc_max: default_question_only_wc_max(),
            min_turns_before_any_concession: default_min_turns_before_any_concession(),
            require_on_topic: default_require_on_topic(),
            similarity_min: default_similarity_min(),
            soft_contra_min: default_soft_contra_min(),
            partial_contra_min: default_partial_contra_min(),
            full_contra_min: default_full_contra_min(),
            ema_alpha: default_ema_alpha(),
            ema_soft_min: default_ema_soft_min(),
            ema_partial_min: default_ema_partial_min(),
            ema_full_min: default_ema_full_min(),
            partial_streak: default_partial_streak(),
            full_streak: default_full_streak(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy_contract() {
        let cfg = ConcessionPolicyConfig::default();
        assert_eq!(cfg.min_user_words, 5);
        assert_eq!(cfg.question_only_wc_max, 6);
        assert!(cfg.require_on_topic);
        assert_eq!(cfg.similarity_min, 0.60);
        assert_eq!(cfg.soft_contra_min, 0.60);
        assert_eq!(cfg.partial_contra_min, 0.75);
        assert_eq!(cfg.full_contra_min, 0.90);
        assert_eq!(cfg.ema_alpha, 0.5);
        assert_eq!(cfg.partial_streak, 1);
        assert_eq!(cfg.full_streak, 2);
    }

    #[test]
    fn partial_overrides_keep_remaining_defaults() {
        let cfg: ConcessionPolicyConfig =
            toml::from_str("full_contra_min = 0.95\nmin_user_words = 8").unwrap();
        assert_eq!(cfg.full_contra_min, 0.95);
        assert_eq!(cfg.min_user_words, 8);
        assert_eq!(cfg.partial_contra_min, 0.75);
    }
}
