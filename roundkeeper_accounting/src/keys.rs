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

//! Persisted key layout.
//!
//! All keys are derived from the pool identifier and the chain, so that every
//! chain gets the same set of round and block keys without chain specific code:
//!
//! - `<pool>:rounds:<chain>:current:<map>` for the open round
//! - `<pool>:rounds:<chain>:round-<height>:<map>` for archived rounds
//! - `<pool>:blocks:<chain>:pending` and `<pool>:blocks:<chain>:counts`

use crate::chain::Chain;

/// Name of the open round.
pub const CURRENT_ROUND: &str = "current";

/// Hash field counting valid shares or accepted blocks.
pub const VALID_FIELD: &str = "valid";

/// Hash field counting invalid shares or rejected blocks.
pub const INVALID_FIELD: &str = "invalid";

/// The maps a round is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundMap {
    Times,
    Submissions,
    Shares,
    Counts,
    Hashrate,
}

impl RoundMap {
    /// Maps moved into the archived round when a block is accepted.
    pub const ARCHIVED: [RoundMap; 3] = [RoundMap::Counts, RoundMap::Shares, RoundMap::Times];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundMap::Times => "times",
            RoundMap::Submissions => "submissions",
            RoundMap::Shares => "shares",
            RoundMap::Counts => "counts",
            RoundMap::Hashrate => "hashrate",
        }
    }
}

impl AsRef<str> for RoundMap {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Field name for a validity verdict in a counts hash.
pub fn count_field(valid: bool) -> &'static str {
    if valid { VALID_FIELD } else { INVALID_FIELD }
}

/// Key builder for one pool and one chain.
#[derive(Debug, Clone, Copy)]
pub struct RoundKeys<'a> {
    pool: &'a str,
    chain: Chain,
}

impl<'a> RoundKeys<'a> {
    pub fn new(pool: &'a str, chain: Chain) -> Self {
        Self { pool, chain }
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// Key for a map of the open round.
    pub fn current(&self, map: RoundMap) -> String {
        self.round(CURRENT_ROUND, map)
    }

    /// Key for a map of the round closed by the block at `height`.
    pub fn archived(&self, height: u64, map: RoundMap) -> String {
        self.round(&format!("round-{height}"), map)
    }

    /// Set of block records waiting for confirmation.
    pub fn pending_blocks(&self) -> String {
        format!("{}:blocks:{}:pending", self.pool, self.chain)
    }

    /// Accepted and rejected block candidate counts.
    pub fn block_counts(&self) -> String {
        format!("{}:blocks:{}:counts", self.pool, self.chain)
    }

    fn round(&self, round: &str, map: RoundMap) -> String {
        format!(
            "{}:rounds:{}:{}:{}",
            self.pool,
            self.chain,
            round,
            map.as_str()
        )
    }
}
