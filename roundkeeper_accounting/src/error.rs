// Copyright (C) 2024, 2025 Roundkeeper Developers (see AUTHORS)
//
// This file is part of Roundkeeper
//
// Roundkeeper is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Roundkeeper is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// Roundkeeper. If not, see <https://www.gnu.org/licenses/>.

use crate::chain::Chain;

/// Contract violations in a share submission. Nothing is built for a share
/// that fails with one of these, so no partial batch ever reaches the store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccountingError {
    #[error("Share is missing the {0} chain address")]
    MissingAddress(Chain),
    #[error("Share claims a {0} block but the {0} chain is not accounted for this share")]
    InactiveBlockChain(Chain),
    #[error("Invalid {chain} block difficulty {difficulty}")]
    InvalidBlockDifficulty { chain: Chain, difficulty: f64 },
    #[error("Failed to serialize {what}: {reason}")]
    Serialization { what: &'static str, reason: String },
}
