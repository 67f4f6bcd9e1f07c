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

use crate::chain::{BlockType, Chain};
use serde::{Deserialize, Deserializer, Serialize};

/// A share submission as handed over by the mining protocol layer.
///
/// Field names on the wire follow the protocol layer's payload, e.g.
/// `addrPrimary` and `blockDiffAuxiliary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareSubmission {
    /// Job the share was mined against
    pub job: String,
    /// Origin ip of the miner connection
    pub ip: String,
    /// Origin port of the miner connection
    pub port: u16,
    /// Miner address on the primary chain
    pub addr_primary: Option<String>,
    /// Miner address on the auxiliary chain, None if not merge mining
    #[serde(default)]
    pub addr_auxiliary: Option<String>,
    /// Network difficulty of the primary chain
    pub block_diff_primary: f64,
    /// Network difficulty of the auxiliary chain
    #[serde(default)]
    pub block_diff_auxiliary: f64,
    /// Chain the share meets block difficulty for, if any
    #[serde(default)]
    pub block_type: BlockType,
    /// Effective difficulty credited to the share
    pub difficulty: f64,
    /// Actual difficulty of the submitted hash
    #[serde(deserialize_with = "deserialize_share_diff")]
    pub share_diff: f64,
    /// Block hash, only when a block is claimed
    #[serde(default)]
    pub hash: Option<String>,
    /// Hash of a block candidate that failed validation
    #[serde(default)]
    pub hash_invalid: Option<String>,
    /// Height of the block being mined
    pub height: u64,
    /// Block reward in the chain's base unit
    pub reward: u64,
    /// Coinbase transaction id, only when a block is claimed
    #[serde(default)]
    pub transaction: Option<String>,
}

impl ShareSubmission {
    /// Miner address for `chain`.
    pub fn address(&self, chain: Chain) -> Option<&str> {
        match chain {
            Chain::Primary => self.addr_primary.as_deref(),
            Chain::Auxiliary => self.addr_auxiliary.as_deref(),
        }
    }

    /// Network difficulty for `chain`.
    pub fn block_difficulty(&self, chain: Chain) -> f64 {
        match chain {
            Chain::Primary => self.block_diff_primary,
            Chain::Auxiliary => self.block_diff_auxiliary,
        }
    }
}

/// The protocol layer sends the share difficulty as a decimal string, accept both.
fn deserialize_share_diff<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ShareDiff {
        Number(f64),
        Text(String),
    }

    match ShareDiff::deserialize(deserializer)? {
        ShareDiff::Number(value) => Ok(value),
        ShareDiff::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_protocol_payload() {
        let payload = r#"{
            "job": "4",
            "ip": "::1",
            "port": 3001,
            "addrPrimary": "example",
            "addrAuxiliary": null,
            "blockDiffPrimary": 137403310.58987552,
            "blockType": "share",
            "difficulty": 1,
            "hash": null,
            "hashInvalid": null,
            "height": 1972211,
            "reward": 10006839,
            "shareDiff": "2.35170820"
        }"#;
        let share: ShareSubmission = serde_json::from_str(payload).unwrap();

        assert_eq!(share.address(Chain::Primary), Some("example"));
        assert_eq!(share.address(Chain::Auxiliary), None);
        assert_eq!(share.block_type, BlockType::Share);
        assert_eq!(share.block_difficulty(Chain::Primary), 137403310.58987552);
        assert_eq!(share.block_difficulty(Chain::Auxiliary), 0.0);
        assert_eq!(share.share_diff, 2.3517082);
        assert_eq!(share.transaction, None);
    }

    #[test]
    fn test_deserialize_numeric_share_diff() {
        let payload = r#"{
            "job": "4", "ip": "::1", "port": 3001,
            "addrPrimary": "example1", "addrAuxiliary": "example2",
            "blockDiffPrimary": 32, "blockDiffAuxiliary": 64,
            "blockType": "auxiliary", "difficulty": 4, "shareDiff": 4,
            "height": 10, "reward": 50
        }"#;
        let share: ShareSubmission = serde_json::from_str(payload).unwrap();

        assert_eq!(share.share_diff, 4.0);
        assert_eq!(share.block_type, BlockType::Auxiliary);
        assert_eq!(share.address(Chain::Auxiliary), Some("example2"));
        assert_eq!(share.block_difficulty(Chain::Auxiliary), 64.0);
    }

    #[test]
    fn test_deserialize_rejects_garbage_share_diff() {
        let payload = r#"{
            "job": "4", "ip": "::1", "port": 3001, "addrPrimary": "example",
            "blockDiffPrimary": 32, "difficulty": 4, "shareDiff": "four",
            "height": 10, "reward": 50
        }"#;
        assert!(serde_json::from_str::<ShareSubmission>(payload).is_err());
    }
}
