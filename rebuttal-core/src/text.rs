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

//! Multilingual text helpers used across the judgment loop.
//!
//! Word counting considers only alphabetic tokens so digits, punctuation and
//! snake_case noise never inflate the input-quality gates. Sentence
//! boundaries are terminal punctuation followed by whitespace, which covers
//! Spanish `¿…?`/`¡…!` pairs as well.

use once_cell::sync::Lazy;
use regex::Regex;

/// Alphabetic word tokens, any script.
static WORD_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}+").expect("word regex"));

/// Phrases the LLM might emit to declare the match over. Only the server may
/// end a debate, so these are stripped from every model reply.
static END_MARKERS_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(match concluded\.?|debate concluded|debate is over)")
        .expect("end-marker regex")
});

/// Characters that close a sentence.
const SENTENCE_TERMINATORS: [char; 5] = ['.', '!', '?', '¿', '¡'];

/// Count alphabetic word tokens.
pub fn word_count(text: &str) -> usize {
    WORD_RX.find_iter(text).count()
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove end-marker phrases, then normalize whitespace. Applying this to
/// its own output is a fixed point.
pub fn sanitize_end_markers(text: &str) -> String {
    normalize_spaces(&END_MARKERS_RX.replace_all(text, ""))
}

/// Split into trimmed sentences on terminal punctuation followed by
/// whitespace. A text with no terminator is a single sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut prev_terminal = false;
    for (idx, ch) in text.char_indices() {
        if prev_terminal && ch.is_whitespace() {
            let sentence = text[start..idx].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = idx;
        }
        prev_terminal = SENTENCE_TERMINATORS.contains(&ch);
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Whether a single sentence reads as a question.
pub fn is_question(sentence: &str) -> bool {
    let trimmed = sentence.trim_end();
    trimmed.ends_with('?') || trimmed.ends_with('¿') || trimmed.trim_start().starts_with('¿')
}

/// Whether every sentence of the text is a question.
pub fn is_question_only(text: &str) -> bool {
    let sentences = split_sentences(text);
    !sentences.is_empty() && sentences.iter().all(|s| is_question(s))
}

/// Drop question sentences, keeping declaratives. Falls back to the input
/// when everything was a question, and collapses accidental trailing `..`.
pub fn drop_questions(text: &str) -> String {
    let kept: Vec<String> = split_sentences(text)
        .into_iter()
        .filter(|s| !is_question(s))
        .collect();
    let out = if kept.is_empty() {
        text.trim().to_string()
    } else {
        kept.join(" ")
    };
    let trimmed = out.trim_end_matches('.');
    if out.len() > trimmed.len() {
        format!("{}.", trimmed)
    } else {
        out.trim().to_string()
    }
}

/// Truncate to at most `max_chars` characters, appending an ellipsis when
/// anything was cut. Char-safe.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_only_alphabetic_tokens() {
        assert_eq!(word_count("Dogs are not humans' best friend."), 6);
        assert_eq!(word_count("2 + 2 = 4"), 0);
        assert_eq!(word_count("¿Qué opinas tú?"), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn sanitize_strips_every_marker_variant() {
        let raw = "I yield. Match concluded. Thanks for the debate is over exchange";
        let clean = sanitize_end_markers(raw);
        assert!(!clean.to_lowercase().contains("match concluded"));
        assert!(!clean.to_lowercase().contains("debate is over"));
    }

    #[test]
    fn sanitize_is_idempotent() {
        let raw = "Well argued. DEBATE CONCLUDED. See you.";
        let once = sanitize_end_markers(raw);
        assert_eq!(sanitize_end_markers(&once), once);
    }

    #[test]
    fn splits_sentences_on_terminal_punctuation() {
        let sents = split_sentences("Dogs are loyal. Cats are not! Do you agree?");
        assert_eq!(sents.len(), 3);
        assert_eq!(sents[0], "Dogs are loyal.");
        assert_eq!(sents[2], "Do you agree?");
    }

    #[test]
    fn unterminated_text_is_one_sentence() {
        assert_eq!(split_sentences("no punctuation here").len(), 1);
    }

    #[test]
    fn question_only_detection() {
        assert!(is_question_only("What is 2+2? Really?"));
        assert!(is_question_only("¿Por qué lo dices?"));
        assert!(!is_question_only("Dogs are loyal. Do you agree?"));
        assert!(!is_question_only(""));
    }

    #[test]
    fn drop_questions_keeps_declaratives() {
        let out = drop_questions("Dogs are loyal. Do you agree? They guard homes.");
        assert_eq!(out, "Dogs are loyal. They guard homes.");
    }

    #[test]
    fn drop_questions_falls_back_when_all_questions() {
        assert_eq!(drop_questions("Do you agree?"), "Do you agree?");
    }

    #[test]
    fn truncation_is_char_safe() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo…");
        assert_eq!(truncate_chars("short", 120), "short");
    }
}
