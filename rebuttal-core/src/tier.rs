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

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much the bot should yield on a turn. Variant order is escalation
/// order, so the derived `Ord` compares tiers directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConcessionTier {
    #[default]
    None,
    Soft,
    Partial,
    Full,
}

impl ConcessionTier {
    /// PARTIAL and FULL count toward the verdict lanes.
    pub fn is_positive(&self) -> bool {
        matches!(self, ConcessionTier::Partial | ConcessionTier::Full)
    }
}

impl fmt::Display for ConcessionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConcessionTier::None => "NONE",
            ConcessionTier::Soft => "SOFT",
            ConcessionTier::Partial => "PARTIAL",
            ConcessionTier::Full => "FULL",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escalation_order() {
        assert!(ConcessionTier::None < ConcessionTier::Soft);
        assert!(ConcessionTier::Soft < ConcessionTier::Partial);
        assert!(ConcessionTier::Partial < ConcessionTier::Full);
    }

    #[test]
    fn positive_tiers() {
        assert!(!ConcessionTier::None.is_positive());
        assert!(!ConcessionTier::Soft.is_positive());
        assert!(ConcessionTier::Partial.is_positive());
        assert!(ConcessionTier::Full.is_positive());
    }
}
