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

//! # Rebuttal Engine
//!
//! The concession engine: the per-turn policy decision, the debate-state
//! store, the LLM adapter surface with provider fallback, and the
//! orchestrator that turns graded NLI signals into steered replies and
//! end-of-match verdicts.

pub mod fallback;
pub mod llm;
pub mod orchestrator;
pub mod policy;
pub mod prompts;
pub mod providers;
pub mod store;

pub use fallback::FallbackLlm;
pub use llm::{parse_language_header, ChatMessage, LlmAdapter, ResponseMode};
pub use orchestrator::ConcessionOrchestrator;
pub use policy::apply_policy;
pub use prompts::{Difficulty, Provider};
pub use providers::{AnthropicAdapter, DummyLlm, OpenAiAdapter};
pub use store::{DebateStore, InMemoryDebateStore};
