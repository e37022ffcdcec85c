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

//! Rebuttal Core
//!
//! Domain types for the debate service: stances, conversations, the
//! per-conversation `DebateState` machine, concession tiers, policy
//! configuration, thesis canonicalization, start-message parsing, verdict
//! text and the shared error taxonomy.

pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod state;
pub mod text;
pub mod thesis;
pub mod tier;
pub mod verdict;

pub use config::ConcessionPolicyConfig;
pub use error::{DebateError, Result};
pub use models::{Conversation, Message, Role, Stance};
pub use parser::{assert_no_topic_or_side_markers, parse_topic_side, MAX_TOPIC_CHARS};
pub use state::{ConcessionPolicy, DebateState};
pub use thesis::{bot_thesis, clean_topic, polarity_variants};
pub use tier::ConcessionTier;
pub use verdict::{after_end_message, build_verdict};
