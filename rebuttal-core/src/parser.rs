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

//! Start-message parsing.
//!
//! The first user message must carry `Topic: <text>. Side: <PRO|CON>.`
//! markers; continuation messages must not. Marker order is free and the
//! match is case-insensitive.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DebateError;
use crate::models::Stance;

/// Upper bound on the debated proposition, in characters.
pub const MAX_TOPIC_CHARS: usize = 100;

static TOPIC_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btopic\s*:\s*").expect("topic regex"));
static SIDE_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bside\s*:\s*(\w+)").expect("side regex"));
static MARKERS_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(topic|side)\s*:").expect("marker regex"));

/// Extract `(topic, stance)` from a start message.
pub fn parse_topic_side(text: &str) -> Result<(String, Stance), DebateError> {
    if text.trim().is_empty() {
        return Err(DebateError::InvalidStartMessage(
            "message must not be empty".into(),
        ));
    }

    let topic_marker = TOPIC_RX.find(text);
    let side_capture = SIDE_RX.captures(text);

    match (&topic_marker, &side_capture) {
        (None, None) => {
            return Err(DebateError::InvalidStartMessage(
                "message must contain Topic: and Side: fields".into(),
            ))
        }
        (None, Some(_)) => {
            return Err(DebateError::InvalidStartMessage("topic is missing".into()))
        }
        (Some(_), None) => {
            return Err(DebateError::InvalidStartMessage("side is missing".into()))
        }
        _ => {}
    }

    let topic_start = topic_marker.expect("checked above").end();
    let side = side_capture.expect("checked above");
    let side_match = side.get(0).expect("whole match");

    // The topic runs from its marker up to the Side: marker (when Side
    // follows Topic) or to the end of the message.
    let topic_end = if side_match.start() > topic_start {
        side_match.start()
    } else {
        text.len()
    };
    let topic = text[topic_start..topic_end]
        .trim_matches(|c: char| c.is_whitespace() || c == '.' || c == ',')
        .to_string();

    if topic.is_empty() {
        return Err(DebateError::InvalidStartMessage(
            "topic must not be empty".into(),
        ));
    }
    if topic.chars().count() > MAX_TOPIC_CHARS {
        return Err(DebateError::InvalidStartMessage(format!(
            "topic exceeds {} characters",
            MAX_TOPIC_CHARS
        )));
    }

    let stance: Stance = side.get(1).expect("side capture").as_str().parse()?;
    Ok((topic, stance))
}

/// Reject continuation messages that try to re-state Topic:/Side: markers.
pub fn assert_no_topic_or_side_markers(text: &str) -> Result<(), DebateError> {
    if text.trim().is_empty() {
        return Err(DebateError::InvalidContinuationMessage(
            "message must not be empty".into(),
        ));
    }
    if MARKERS_RX.is_match(text) {
        return Err(DebateError::InvalidContinuationMessage(
            "topic/side must not be provided when continuing a conversation".into(),
        ));
    }
    Ok(())
}
