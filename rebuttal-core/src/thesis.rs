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

//! Thesis canonicalization.
//!
//! The thesis is the one-sentence proposition the bot defends. It is derived
//! from the stored topic by stripping meta markers and opinion prefixes,
//! keeping the leading clause, and producing a positive/negative polarity
//! pair through surface-syntactic transforms. PRO argues the positive
//! variant, CON the negative one.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Stance;
use crate::text::{normalize_spaces, split_sentences, word_count};

// `Language:`/`Side:` carry a short value token that goes with them; the
// value of `Topic:` is the proposition itself, so only the marker is cut.
static LANG_SIDE_MARKER_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(language|side)\s*:\s*\w+[\s.,]*").expect("lang/side marker regex")
});
static TOPIC_MARKER_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btopic\s*:\s*").expect("topic marker regex"));
static OPINION_PREFIX_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*i\s+(think|believe)\s+(that\s+)?").expect("opinion regex"));
static COPULA_NEG_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(is|are|was|were)\s+not\b").expect("copula-neg regex"));
static COPULA_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(is|are|was|were)\b").expect("copula regex"));
static EXISTS_NEG_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(does|do)\s+not\s+exist\b").expect("exists-neg regex")
});
static EXISTS_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bexists?\b").expect("exists regex"));
static NOT_THE_CASE_PREFIX: &str = "It is not the case that ";

/// Strip meta markers and opinion prefixes from a topic and keep its first
/// clause.
pub fn clean_topic(topic: &str) -> String {
    let side_markers_stripped = LANG_SIDE_MARKER_RX.replace_all(topic, "");
    let no_markers = TOPIC_MARKER_RX.replace_all(&side_markers_stripped, "");
    let no_opinion = OPINION_PREFIX_RX.replace(no_markers.trim(), "");
    let first_sentence = split_sentences(&no_opinion)
        .into_iter()
        .next()
        .unwrap_or_default();

    // Keep the head clause when a comma splits off a subordinate tail, but
    // only if the head still reads like a proposition.
    let head = match first_sentence.split_once(',') {
        Some((head, _)) if word_count(head) >= 3 => head.to_string(),
        _ => first_sentence,
    };

    normalize_spaces(head.trim_matches(|c: char| c.is_whitespace() || c == '.' || c == '!'))
}

/// Produce `(positive, negative)` thesis sentences for a cleaned topic.
///
/// Transforms, in order of preference:
/// - copula negation: "X is Y" ↔ "X is not Y" (also are/was/were)
/// - existence: "X exists" ↔ "X does not exist"
/// - fallback: "X." vs "It is not the case that X."
///
/// Canonicalization is idempotent: feeding either variant back in yields the
/// same pair.
pub fn polarity_variants(topic: &str) -> (String, String) {
    let mut t = clean_topic(topic);

    // Undo a fallback negation so canonicalization converges.
    if let Some(rest) = strip_prefix_ci(&t, NOT_THE_CASE_PREFIX) {
        t = rest.trim().trim_end_matches('.').to_string();
    }

    if let Some(m) = COPULA_NEG_RX.find(&t) {
        let copula = COPULA_RX
            .find(m.as_str())
            .map(|c| c.as_str().to_string())
            .unwrap_or_else(|| "is".to_string());
        let positive = format!(
            "{}{}{}",
            &t[..m.start()],
            copula,
            &t[m.end()..]
        );
        return (
            with_terminal_period(&normalize_spaces(&positive)),
            with_terminal_period(&t),
        );
    }

    if let Some(m) = COPULA_RX.find(&t) {
        let negative = format!("{}{} not{}", &t[..m.start()], m.as_str(), &t[m.end()..]);
        return (
            with_terminal_period(&t),
            with_terminal_period(&normalize_spaces(&negative)),
        );
    }

    if EXISTS_NEG_RX.is_match(&t) {
        let positive = EXISTS_NEG_RX.replace(&t, "exists").to_string();
        return (
            with_terminal_period(&normalize_spaces(&positive)),
            with_terminal_period(&t),
        );
    }

    if let Some(m) = EXISTS_RX.find(&t) {
        let negative = format!("{}does not exist{}", &t[..m.start()], &t[m.end()..]);
        return (
            with_terminal_period(&t),
            with_terminal_period(&normalize_spaces(&negative)),
        );
    }

    (
        with_terminal_period(&t),
        format!("{}{}", NOT_THE_CASE_PREFIX, with_terminal_period(&t)),
    )
}

/// The sentence the bot is defending: positive variant for PRO, negative
/// for CON.
pub fn bot_thesis(topic: &str, stance: Stance) -> String {
    let (positive, negative) = polarity_variants(topic);
    match stance {
        Stance::Pro => positive,
        Stance::Con => negative,
    }
}

fn with_terminal_period(text: &str) -> String {
    let trimmed = text.trim().trim_end_matches('.');
    format!("{}.", trimmed)
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_markers_and_opinion_prefixes() {
        assert_eq!(
            clean_topic("I think that dogs are humans' best friend."),
            "dogs are humans' best friend"
        );
        assert_eq!(
            clean_topic("Topic: remote work is more productive"),
            "remote work is more productive"
        );
        assert_eq!(clean_topic("Language: en Side: PRO God exists"), "God exists");
    }

    #[test]
    fn keeps_head_clause() {
        assert_eq!(
            clean_topic("Remote work is more productive, because commutes waste hours"),
            "Remote work is more productive"
        );
    }

    #[test]
    fn copula_polarity() {
        let (pos, neg) = polarity_variants("Dogs are humans' best friend");
        assert_eq!(pos, "Dogs are humans' best friend.");
        assert_eq!(neg, "Dogs are not humans' best friend.");
    }

    #[test]
    fn negated_copula_recovers_positive() {
        let (pos, neg) = polarity_variants("Dogs are not humans' best friend");
        assert_eq!(pos, "Dogs are humans' best friend.");
        assert_eq!(neg, "Dogs are not humans' best friend.");
    }

    #[test]
    fn existence_polarity() {
        let (pos, neg) = polarity_variants("God exists");
        assert_eq!(pos, "God exists.");
        assert_eq!(neg, "God does not exist.");
    }

    #[test]
    fn fallback_polarity() {
        let (pos, neg) = polarity_variants("Taxation as theft");
        assert_eq!(pos, "Taxation as theft.");
        assert_eq!(neg, "It is not the case that Taxation as theft.");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        for topic in [
            "Dogs are humans' best friend",
            "Dogs are not humans' best friend",
            "God exists",
            "Taxation as theft",
        ] {
            let first = polarity_variants(topic);
            assert_eq!(polarity_variants(&first.0), first, "via positive of {topic}");
            assert_eq!(polarity_variants(&first.1), first, "via negative of {topic}");
        }
    }

    #[test]
    fn stance_selects_variant() {
        assert_eq!(
            bot_thesis("God exists", Stance::Pro),
            "God exists."
        );
        assert_eq!(
            bot_thesis("God exists", Stance::Con),
            "God does not exist."
        );
    }
}
