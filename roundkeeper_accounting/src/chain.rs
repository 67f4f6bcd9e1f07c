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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of chains a pool can account rounds for.
pub const CHAIN_COUNT: usize = 2;

/// Chains strings defined in one place for type safety.
///
/// The primary chain is always accounted. The auxiliary chain is merge mined
/// and accounted in a fully parallel round structure when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Primary,
    Auxiliary,
}

impl Chain {
    /// All chains in the order their commands are emitted.
    pub const ALL: [Chain; CHAIN_COUNT] = [Chain::Primary, Chain::Auxiliary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Primary => "primary",
            Chain::Auxiliary => "auxiliary",
        }
    }

    /// Position of the chain in per chain arrays.
    pub fn index(&self) -> usize {
        match self {
            Chain::Primary => 0,
            Chain::Auxiliary => 1,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Chain {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::ALL
            .into_iter()
            .find(|chain| chain.as_str() == s)
            .ok_or_else(|| format!("Unknown chain: {s}"))
    }
}

/// Which chain, if any, a share meets block difficulty for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[default]
    Share,
    Primary,
    Auxiliary,
}

impl BlockType {
    /// The chain the block candidate belongs to, None for a plain share.
    pub fn chain(&self) -> Option<Chain> {
        match self {
            BlockType::Share => None,
            BlockType::Primary => Some(Chain::Primary),
            BlockType::Auxiliary => Some(Chain::Auxiliary),
        }
    }

    /// True if this share claims a block on `chain`.
    pub fn is_block_for(&self, chain: Chain) -> bool {
        self.chain() == Some(chain)
    }
}

impl From<Chain> for BlockType {
    fn from(chain: Chain) -> Self {
        match chain {
            Chain::Primary => BlockType::Primary,
            Chain::Auxiliary => BlockType::Auxiliary,
        }
    }
}

/// Per chain validity verdict for a share, as decided by the share validation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainValidity([bool; CHAIN_COUNT]);

impl ChainValidity {
    /// Same verdict on every chain.
    pub fn all(valid: bool) -> Self {
        ChainValidity([valid; CHAIN_COUNT])
    }

    pub fn with(mut self, chain: Chain, valid: bool) -> Self {
        self.0[chain.index()] = valid;
        self
    }

    pub fn is_valid(&self, chain: Chain) -> bool {
        self.0[chain.index()]
    }
}
