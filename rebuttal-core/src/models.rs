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

//! Conversation-level domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DebateError;

/// Debate side assigned to the bot. Server-authoritative: fixed at
/// conversation creation and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    #[serde(rename = "PRO")]
    Pro,
    #[serde(rename = "CON")]
    Con,
}

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Pro => "PRO",
            Stance::Con => "CON",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stance {
    type Err = DebateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pro" => Ok(Stance::Pro),
            "con" => Ok(Stance::Con),
            other => Err(DebateError::InvalidStartMessage(format!(
                "side must be 'pro' or 'con', got '{}'",
                other
            ))),
        }
    }
}

/// Author of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }
}

/// A single stored turn. `seq` is assigned by the repository and acts as the
/// stable tiebreak when two messages share a creation timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub seq: u64,
}

/// Conversation metadata. Owned by the repository; the core reads it and
/// bumps the expiry via `touch`, nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub topic: String,
    pub stance: Stance,
    pub expires_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stance_parses_case_insensitively() {
        assert_eq!("PRO".parse::<Stance>().unwrap(), Stance::Pro);
        assert_eq!("con".parse::<Stance>().unwrap(), Stance::Con);
        assert_eq!(" Pro ".parse::<Stance>().unwrap(), Stance::Pro);
        assert!("maybe".parse::<Stance>().is_err());
    }

    #[test]
    fn stance_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Stance::Pro).unwrap(), "\"PRO\"");
        assert_eq!(serde_json::to_string(&Stance::Con).unwrap(), "\"CON\"");
    }

    #[test]
    fn role_serializes_lower_case() {
        assert_eq!(serde_json::to_string(&Role::Bot).unwrap(), "\"bot\"");
    }
}
