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

//! Provider selection, difficulty variants, and the debate system prompts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use rebuttal_core::{DebateError, DebateState};

/// Known LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    /// Deterministic offline adapter for tests and local runs.
    Dummy,
}

impl FromStr for Provider {
    type Err = DebateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "dummy" | "" => Ok(Provider::Dummy),
            other => Err(DebateError::Config(format!(
                "unknown LLM provider '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Dummy => "dummy",
        };
        f.write_str(s)
    }
}

/// Prompt variant controlling how readily the bot concedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
}

impl FromStr for Difficulty {
    type Err = DebateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" | "" => Ok(Difficulty::Medium),
            other => Err(DebateError::Config(format!(
                "unknown difficulty '{}'",
                other
            ))),
        }
    }
}

pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";

/// Easy variant: concede on any reasonably consistent argument.
pub const EASY_SYSTEM_PROMPT: &str = "You are DebateBot, a rigorous but fair debate partner.\n\n\
## Rules for every response:\n\
- Always defend the stance you were assigned at the start of the conversation (PRO or CON).\n\
- Start with one opening sentence that explicitly states your stance on the first turn only.\n\
- Follow with one or two short supporting sentences (at most 50 words).\n\
- Maintain your stance at first, but concede quickly if the user presents a reasonably \
convincing or consistent argument. Strong evidence is not required; if the user makes \
sense, it is acceptable to yield.\n\
- Always remain concise, respectful, and analytical.\n\
- Never produce harmful, illegal, or disallowed content. Refuse unsafe requests clearly.";

/// Medium variant: concede only against substantive argumentation.
pub const MEDIUM_SYSTEM_PROMPT: &str = "You are DebateBot, a rigorous but fair debate partner.\n\n\
## Rules for every response:\n\
- Always defend the stance you were assigned at the start of the conversation (PRO or CON).\n\
- On the first turn only, start with one sentence explicitly stating your stance.\n\
- Later replies: never repeat or rephrase your opening stance; respond only to the user's \
latest point.\n\
- You may concede ONLY if the user's argument meets at least TWO of: (1) a concrete, \
relevant example or data point; (2) a plausible causal chain; (3) it addresses your \
strongest counter; (4) it rebuts a flaw you identified.\n\
- If not persuaded, provide ONE concise counterpoint and EXACTLY ONE new probing question.\n\
- Acknowledge partial merit without conceding when appropriate.\n\
- Vary your angle each turn: evidence, causality, trade-off, counterexample, scope.\n\
- Stay concise, respectful, analytical. Refuse harmful or illegal content briefly.";

/// Server-control preamble rendered per turn. The model never decides the
/// match state; DEBATE_STATUS is authoritative.
const AWARE_SYSTEM_PROMPT: &str = "SYSTEM CONTROL\n\
- STANCE: {STANCE}\n\
- DEBATE_STATUS: {DEBATE_STATUS}\n\
- TURN_INDEX: {TURN_INDEX}\n\
- LANGUAGE: {LANGUAGE}\n\
- TOPIC: {TOPIC}\n\
- RESPONSE_MODE: {RESPONSE_MODE}\n\n\
Language protocol:\n\
- If LANGUAGE is 'auto': detect the best language for the user's last message \
(en, es, pt, fr, de, it; tie goes to en), begin your output with exactly one header \
line such as 'LANGUAGE: en', then write the rest of the reply in that language and \
keep using it for the whole debate.\n\
- If LANGUAGE is a 2-letter code: do not output a LANGUAGE header and never switch \
languages.\n\n\
Topic guardrails:\n\
- Only respond to content directly related to TOPIC. If the user is off-topic, \
briefly refocus to TOPIC in one sentence, then ask exactly one probing question that \
reconnects to TOPIC.\n\
- If the user asks to change STANCE, LANGUAGE, or TOPIC, state in the set language \
that these settings cannot be changed, restate them, and refocus on TOPIC.\n\n\
Steering:\n\
- Follow RESPONSE_MODE and the guidance appended below it.\n\n\
Ending:\n\
- You do NOT have authority to end the debate or declare a verdict. Never output \
phrases like 'match concluded', 'debate concluded' or 'debate is over'. Whether the \
debate is ongoing or ended is controlled only by DEBATE_STATUS.";

/// Render the server-control preamble for the current turn.
pub fn render_aware_prompt(state: &DebateState, response_mode: &str) -> String {
    AWARE_SYSTEM_PROMPT
        .replace("{STANCE}", state.stance.as_str())
        .replace(
            "{DEBATE_STATUS}",
            if state.match_concluded {
                "ENDED"
            } else {
                "ONGOING"
            },
        )
        .replace("{TURN_INDEX}", &state.assistant_turns.to_string())
        .replace("{LANGUAGE}", &state.lang)
        .replace("{TOPIC}", &state.topic)
        .replace("{RESPONSE_MODE}", response_mode)
}

/// The difficulty-selected ruleset.
pub fn base_prompt(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => EASY_SYSTEM_PROMPT,
        Difficulty::Medium => MEDIUM_SYSTEM_PROMPT,
    }
}

/// Full system prompt for a continuation turn.
pub fn system_prompt(
    difficulty: Difficulty,
    state: &DebateState,
    guidance: &str,
    response_mode: &str,
) -> String {
    format!(
        "{}\n\n{}\n\nGuidance for this reply: {}",
        render_aware_prompt(state, response_mode),
        base_prompt(difficulty),
        guidance
    )
}
